//! Software paint surface.
//!
//! [`PaintSurface`] owns one off-screen ARGB pixel buffer together with the
//! paint state (color, alpha, anti-alias flag, font size) and the active clip
//! rectangle. All drawing primitives mutate the buffer only; nothing here
//! touches the host surface; presenting the buffer is
//! [`FrameBufferPresenter`](crate::presenter::FrameBufferPresenter)'s job.
//!
//! The buffer is reallocated by [`PaintSurface::acquire`]; previous contents
//! are discarded on resize, so callers must repaint fully afterwards.

use tracing::warn;

use crate::{
    color::Color,
    px::{Px, PxPosition, PxRect, PxSize},
};

/// Fallback advance factor used for text metrics before a font is loaded.
const FALLBACK_ADVANCE_FACTOR: f32 = 0.5;

/// Fallback line-height factor used before a font is loaded.
const FALLBACK_HEIGHT_FACTOR: f32 = 1.2;

/// An off-screen ARGB framebuffer with a small immediate-mode primitive set.
pub struct PaintSurface {
    width: Px,
    height: Px,
    buffer: Vec<u32>,
    clip: PxRect,
    color: Color,
    alpha: u8,
    anti_alias: bool,
    font: Option<fontdue::Font>,
    font_size: f32,
}

impl PaintSurface {
    /// Creates an empty surface; call [`PaintSurface::acquire`] before drawing.
    pub fn new() -> Self {
        Self {
            width: Px::ZERO,
            height: Px::ZERO,
            buffer: Vec::new(),
            clip: PxRect::default(),
            color: Color::BLACK,
            alpha: 0xFF,
            anti_alias: true,
            font: None,
            font_size: 16.0,
        }
    }

    /// Creates a surface and immediately allocates a buffer of the given size.
    pub fn with_size(width: Px, height: Px) -> Self {
        let mut surface = Self::new();
        surface.acquire(width, height);
        surface
    }

    /// Allocates (or reuses) the pixel buffer at the given size.
    ///
    /// Previous contents are discarded; the buffer comes back fully
    /// transparent and the clip is reset to the whole surface.
    pub fn acquire(&mut self, width: Px, height: Px) {
        let width = width.max(Px::ZERO);
        let height = height.max(Px::ZERO);
        let len = (width.0 as usize) * (height.0 as usize);
        self.buffer.clear();
        self.buffer.resize(len, Color::TRANSPARENT.0);
        self.width = width;
        self.height = height;
        self.clip = PxRect::new(Px::ZERO, Px::ZERO, width, height);
    }

    /// Current buffer dimensions.
    pub fn size(&self) -> PxSize {
        PxSize::new(self.width, self.height)
    }

    /// Raw pixel rows, for presenting and compositing.
    pub fn pixels(&self) -> &[u32] {
        &self.buffer
    }

    /// Mutable pixel rows, for native widgets drawing into the buffer.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.buffer
    }

    /// Row stride in pixels.
    pub fn stride(&self) -> usize {
        self.width.positive() as usize
    }

    // --- paint state ---

    /// Sets the paint color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Sets the global paint alpha applied on top of the color's own alpha.
    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    /// Toggles anti-aliased glyph coverage.
    pub fn set_anti_alias(&mut self, anti_alias: bool) {
        self.anti_alias = anti_alias;
    }

    /// Loads a font for text drawing and measurement.
    pub fn set_font(&mut self, font: fontdue::Font) {
        self.font = Some(font);
    }

    /// Sets the font size in pixels.
    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = size;
    }

    // --- clip ---

    /// Replaces the active clip, clamped to the surface.
    pub fn set_clip(&mut self, rect: PxRect) {
        self.clip = rect.clamp_to(self.size()).unwrap_or_default();
    }

    /// Intersects the active clip with `rect`.
    pub fn intersect_clip(&mut self, rect: PxRect) {
        self.clip = self.clip.intersection(rect).unwrap_or_default();
    }

    /// The active clip rectangle.
    pub fn clip(&self) -> PxRect {
        self.clip
    }

    /// Resets the clip to the whole surface.
    pub fn reset_clip(&mut self) {
        self.clip = PxRect::new(Px::ZERO, Px::ZERO, self.width, self.height);
    }

    // --- primitives ---

    /// Fills the whole buffer with `color`, ignoring clip and paint state.
    pub fn clear(&mut self, color: Color) {
        self.buffer.fill(color.0);
    }

    /// Reads one pixel, or `None` outside the buffer.
    pub fn pixel(&self, pos: PxPosition) -> Option<Color> {
        if pos.x < Px::ZERO || pos.y < Px::ZERO || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        let idx = pos.y.0 as usize * self.stride() + pos.x.0 as usize;
        self.buffer.get(idx).map(|&p| Color(p))
    }

    fn effective_color(&self) -> Color {
        self.color.with_scaled_alpha(self.alpha)
    }

    fn plot(&mut self, pos: PxPosition, color: Color) {
        if !self.clip.contains(pos) {
            return;
        }
        let idx = pos.y.0 as usize * self.stride() + pos.x.0 as usize;
        if let Some(dst) = self.buffer.get_mut(idx) {
            *dst = color.over(Color(*dst)).0;
        }
    }

    /// Fills a rectangle with the current paint.
    pub fn fill_rect(&mut self, rect: PxRect) {
        let Some(rect) = rect.intersection(self.clip) else {
            return;
        };
        let color = self.effective_color();
        for y in rect.y.0..rect.bottom().0 {
            for x in rect.x.0..rect.right().0 {
                let idx = y as usize * self.stride() + x as usize;
                if let Some(dst) = self.buffer.get_mut(idx) {
                    *dst = color.over(Color(*dst)).0;
                }
            }
        }
    }

    /// Strokes a one-pixel rectangle outline.
    pub fn draw_rect(&mut self, rect: PxRect) {
        if rect.is_empty() {
            return;
        }
        let right = rect.right() - Px(1);
        let bottom = rect.bottom() - Px(1);
        self.draw_line(rect.position(), PxPosition::new(right, rect.y));
        self.draw_line(PxPosition::new(right, rect.y), PxPosition::new(right, bottom));
        self.draw_line(PxPosition::new(right, bottom), PxPosition::new(rect.x, bottom));
        self.draw_line(PxPosition::new(rect.x, bottom), rect.position());
    }

    /// Draws a one-pixel line between two points (Bresenham).
    pub fn draw_line(&mut self, from: PxPosition, to: PxPosition) {
        let color = self.effective_color();
        let (mut x0, mut y0) = (from.x.0, from.y.0);
        let (x1, y1) = (to.x.0, to.y.0);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(PxPosition::new(Px(x0), Px(y0)), color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Strokes a closed polygon outline.
    pub fn draw_polygon(&mut self, points: &[PxPosition]) {
        if points.len() < 2 {
            return;
        }
        for pair in points.windows(2) {
            self.draw_line(pair[0], pair[1]);
        }
        self.draw_line(points[points.len() - 1], points[0]);
    }

    /// Fills a polygon using even-odd scanline coverage.
    pub fn fill_polygon(&mut self, points: &[PxPosition]) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.y.0).min().unwrap_or(0);
        let max_y = points.iter().map(|p| p.y.0).max().unwrap_or(0);
        let color = self.effective_color();
        let mut crossings = Vec::new();
        for y in min_y..=max_y {
            crossings.clear();
            let fy = y as f32 + 0.5;
            for i in 0..points.len() {
                let a = points[i];
                let b = points[(i + 1) % points.len()];
                let (ay, by) = (a.y.to_f32(), b.y.to_f32());
                if (ay <= fy && by > fy) || (by <= fy && ay > fy) {
                    let t = (fy - ay) / (by - ay);
                    crossings.push(a.x.to_f32() + t * (b.x - a.x).to_f32());
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks(2) {
                if let [start, end] = span {
                    for x in start.floor() as i32..end.ceil() as i32 {
                        self.plot(PxPosition::new(Px(x), Px(y)), color);
                    }
                }
            }
        }
    }

    /// Walks the elliptical arc inscribed in `rect` from `start_angle` over
    /// `arc_angle` (both in degrees, counter-clockwise) and yields the
    /// vertices as positions. Segment count scales with the arc's extent.
    fn arc_points(rect: PxRect, start_angle: i32, arc_angle: i32) -> Vec<PxPosition> {
        let cx = rect.x.to_f32() + rect.width.to_f32() / 2.0;
        let cy = rect.y.to_f32() + rect.height.to_f32() / 2.0;
        let rx = rect.width.to_f32() / 2.0;
        let ry = rect.height.to_f32() / 2.0;
        let segments = (arc_angle.unsigned_abs().max(4)).min(360) as usize;
        let start = (start_angle as f32).to_radians();
        let sweep = (arc_angle as f32).to_radians();
        (0..=segments)
            .map(|i| {
                let angle = start + sweep * (i as f32 / segments as f32);
                PxPosition::new(
                    Px((cx + rx * angle.cos()).round() as i32),
                    Px((cy - ry * angle.sin()).round() as i32),
                )
            })
            .collect()
    }

    /// Strokes an elliptical arc inscribed in `rect`.
    ///
    /// Angles are in degrees; zero points right and positive sweeps
    /// counter-clockwise.
    pub fn draw_arc(&mut self, rect: PxRect, start_angle: i32, arc_angle: i32) {
        if rect.is_empty() || arc_angle == 0 {
            return;
        }
        let points = Self::arc_points(rect, start_angle, arc_angle);
        for pair in points.windows(2) {
            self.draw_line(pair[0], pair[1]);
        }
    }

    /// Fills the pie slice swept by an elliptical arc inscribed in `rect`.
    pub fn fill_arc(&mut self, rect: PxRect, start_angle: i32, arc_angle: i32) {
        if rect.is_empty() || arc_angle == 0 {
            return;
        }
        let mut points = Self::arc_points(rect, start_angle, arc_angle);
        if arc_angle.unsigned_abs() < 360 {
            let cx = Px((rect.x.to_f32() + rect.width.to_f32() / 2.0).round() as i32);
            let cy = Px((rect.y.to_f32() + rect.height.to_f32() / 2.0).round() as i32);
            points.push(PxPosition::new(cx, cy));
        }
        self.fill_polygon(&points);
    }

    /// Blits a raw ARGB image at `pos`, honoring clip and per-pixel alpha.
    pub fn draw_image(&mut self, pixels: &[u32], size: PxSize, pos: PxPosition) {
        let src_stride = size.width.positive() as usize;
        if src_stride == 0 {
            return;
        }
        let dest = PxRect::from_pos_size(pos, size);
        let Some(visible) = dest.intersection(self.clip) else {
            return;
        };
        for y in visible.y.0..visible.bottom().0 {
            for x in visible.x.0..visible.right().0 {
                let sx = (x - pos.x.0) as usize;
                let sy = (y - pos.y.0) as usize;
                let Some(&src) = pixels.get(sy * src_stride + sx) else {
                    continue;
                };
                let idx = y as usize * self.stride() + x as usize;
                if let Some(dst) = self.buffer.get_mut(idx) {
                    *dst = Color(src).over(Color(*dst)).0;
                }
            }
        }
    }

    /// Composites another surface's buffer at `pos`.
    ///
    /// This is the toolkit-side half of peer double buffering: a peer's
    /// native-rendering buffer is drawn into the main surface here.
    pub fn draw_surface(&mut self, other: &PaintSurface, pos: PxPosition) {
        self.draw_image(other.pixels(), other.size(), pos);
    }

    // --- text ---

    /// Measures the advance width of `text` at the current font size.
    pub fn measure_text(&self, text: &str) -> Px {
        match &self.font {
            Some(font) => {
                let advance: f32 = text
                    .chars()
                    .map(|ch| font.metrics(ch, self.font_size).advance_width)
                    .sum();
                Px(advance.ceil() as i32)
            }
            None => {
                let advance = self.font_size * FALLBACK_ADVANCE_FACTOR;
                Px((advance * text.chars().count() as f32).ceil() as i32)
            }
        }
    }

    /// Line height at the current font size.
    pub fn font_height(&self) -> Px {
        match &self.font {
            Some(font) => font
                .horizontal_line_metrics(self.font_size)
                .map(|m| Px(m.new_line_size.ceil() as i32))
                .unwrap_or_else(|| Px((self.font_size * FALLBACK_HEIGHT_FACTOR).ceil() as i32)),
            None => Px((self.font_size * FALLBACK_HEIGHT_FACTOR).ceil() as i32),
        }
    }

    /// Draws `text` with its baseline-left origin near `pos` (top-left).
    pub fn draw_text(&mut self, text: &str, pos: PxPosition) {
        // Temporarily take the font so glyph rasterization does not hold a
        // borrow across plot calls.
        let Some(font) = self.font.take() else {
            warn!("draw_text called before a font was loaded; text dropped");
            return;
        };
        let ascent = font
            .horizontal_line_metrics(self.font_size)
            .map(|m| m.ascent)
            .unwrap_or(self.font_size);
        let color = self.effective_color();
        let mut pen_x = pos.x.to_f32();
        for ch in text.chars() {
            let (metrics, coverage) = font.rasterize(ch, self.font_size);
            let glyph_x = pen_x as i32 + metrics.xmin;
            let glyph_y = pos.y.0 + (ascent as i32) - metrics.ymin - metrics.height as i32;
            for (i, &cov) in coverage.iter().enumerate() {
                let gx = glyph_x + (i % metrics.width.max(1)) as i32;
                let gy = glyph_y + (i / metrics.width.max(1)) as i32;
                let cov = if self.anti_alias {
                    cov
                } else if cov >= 128 {
                    0xFF
                } else {
                    0
                };
                if cov > 0 {
                    self.plot(
                        PxPosition::new(Px(gx), Px(gy)),
                        color.with_scaled_alpha(cov),
                    );
                }
            }
            pen_x += metrics.advance_width;
        }
        self.font = Some(font);
    }
}

impl Default for PaintSurface {
    fn default() -> Self {
        Self::new()
    }
}
