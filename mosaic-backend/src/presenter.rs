//! Framebuffer presentation.
//!
//! [`FrameBufferPresenter`] copies the [`PaintSurface`](crate::paint::PaintSurface)
//! buffer to the host's presentable surface, confined to a dirty region when
//! one is given. The host surface is reached through the narrow
//! [`PresentTarget`] trait and may disappear at any time during a lifecycle
//! transition; presenting then is a silent no-op. A failed blit is caught,
//! logged and dropped; it must never propagate into the toolkit's event
//! loop.

use tracing::{debug, warn};

use crate::{
    error::PresentError,
    paint::PaintSurface,
    px::{PxRect, PxSize},
};

/// The screen-space region requiring a buffer-to-screen copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyRegion {
    /// The whole surface must be copied.
    Full,
    /// Only the contained rectangle must be copied.
    Partial(PxRect),
}

impl DirtyRegion {
    /// Coalesces two pending regions: unions partial rects, and collapses to
    /// [`DirtyRegion::Full`] as soon as either side is full.
    pub fn merge(self, other: DirtyRegion) -> DirtyRegion {
        match (self, other) {
            (DirtyRegion::Partial(a), DirtyRegion::Partial(b)) => DirtyRegion::Partial(a.union(b)),
            _ => DirtyRegion::Full,
        }
    }

    /// Resolves the region to a concrete rectangle on a surface of `size`,
    /// or `None` when nothing visible remains.
    pub fn resolve(self, size: PxSize) -> Option<PxRect> {
        let full = PxRect::new(crate::px::Px::ZERO, crate::px::Px::ZERO, size.width, size.height);
        match self {
            DirtyRegion::Full => (!full.is_empty()).then_some(full),
            DirtyRegion::Partial(rect) => rect.clamp_to(size),
        }
    }
}

impl From<Option<PxRect>> for DirtyRegion {
    fn from(value: Option<PxRect>) -> Self {
        match value {
            Some(rect) => DirtyRegion::Partial(rect),
            None => DirtyRegion::Full,
        }
    }
}

/// The host's presentable surface, reduced to the one capability the
/// presenter needs.
///
/// Implementations copy `rows` (tightly packed ARGB rows of `region`'s
/// dimensions) to the screen at `region`'s position. They are called from
/// the toolkit thread.
pub trait PresentTarget: Send {
    /// Copies pixel rows to the screen inside `region`.
    fn blit(&mut self, rows: &[u32], region: PxRect) -> Result<(), PresentError>;
}

/// Copies the paint surface's buffer to the host surface on request.
pub struct FrameBufferPresenter {
    target: Option<Box<dyn PresentTarget>>,
}

impl FrameBufferPresenter {
    /// Creates a presenter with no surface attached yet.
    pub fn new() -> Self {
        Self { target: None }
    }

    /// Attaches the host surface once it becomes available.
    pub fn attach_target(&mut self, target: Box<dyn PresentTarget>) {
        self.target = Some(target);
    }

    /// Detaches the host surface during teardown; later presents no-op.
    pub fn detach_target(&mut self) {
        self.target = None;
    }

    /// True when a surface is currently attached.
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Copies `surface`'s buffer to the screen, confined to `region`.
    ///
    /// Presenting is a pure copy: calling it twice with no intervening paint
    /// produces the same visible output as once. With no target attached the
    /// call is a silent no-op, and blit failures are logged and swallowed.
    pub fn present(&mut self, surface: &PaintSurface, region: DirtyRegion) {
        let Some(target) = self.target.as_mut() else {
            debug!("present skipped: no presentable surface attached");
            return;
        };
        let Some(rect) = region.resolve(surface.size()) else {
            return;
        };
        let stride = surface.stride();
        let mut rows = Vec::with_capacity((rect.width.0 * rect.height.0) as usize);
        for y in rect.y.0..rect.bottom().0 {
            let start = y as usize * stride + rect.x.0 as usize;
            rows.extend_from_slice(&surface.pixels()[start..start + rect.width.0 as usize]);
        }
        if let Err(err) = target.blit(&rows, rect) {
            warn!("present failed, frame dropped: {err}");
        }
    }

    /// Copies the whole buffer to the screen.
    pub fn present_full(&mut self, surface: &PaintSurface) {
        self.present(surface, DirtyRegion::Full);
    }
}

impl Default for FrameBufferPresenter {
    fn default() -> Self {
        Self::new()
    }
}
