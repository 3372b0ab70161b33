//! Packed ARGB color used by the software paint surface.

/// A 32-bit ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Color = Color(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    /// Builds a color from individual channels.
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Color {
        Color(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Alpha channel.
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Red channel.
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green channel.
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue channel.
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Returns this color with its alpha scaled by `alpha / 255`.
    pub fn with_scaled_alpha(self, alpha: u8) -> Color {
        let a = (self.alpha() as u32 * alpha as u32 / 255) as u8;
        Color::from_argb(a, self.red(), self.green(), self.blue())
    }

    /// Source-over composition of `self` onto `dst`.
    pub fn over(self, dst: Color) -> Color {
        let sa = self.alpha() as u32;
        if sa == 0xFF {
            return self;
        }
        if sa == 0 {
            return dst;
        }
        let inv = 255 - sa;
        let blend = |s: u8, d: u8| ((s as u32 * sa + d as u32 * inv) / 255) as u8;
        let da = self.alpha() as u32 + dst.alpha() as u32 * inv / 255;
        Color::from_argb(
            da.min(255) as u8,
            blend(self.red(), dst.red()),
            blend(self.green(), dst.green()),
            blend(self.blue(), dst.blue()),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_roundtrip() {
        let c = Color::from_argb(0x80, 0x11, 0x22, 0x33);
        assert_eq!(c.alpha(), 0x80);
        assert_eq!(c.red(), 0x11);
        assert_eq!(c.green(), 0x22);
        assert_eq!(c.blue(), 0x33);
    }

    #[test]
    fn test_over_opaque_and_transparent() {
        let red = Color::from_argb(0xFF, 0xFF, 0, 0);
        let blue = Color::from_argb(0xFF, 0, 0, 0xFF);
        assert_eq!(red.over(blue), red);
        assert_eq!(Color::TRANSPARENT.over(blue), blue);
    }

    #[test]
    fn test_over_half_alpha_mixes() {
        let half_white = Color::from_argb(0x80, 0xFF, 0xFF, 0xFF);
        let out = half_white.over(Color::BLACK);
        // Roughly mid gray, fully opaque destination stays opaque.
        assert!(out.red() > 0x70 && out.red() < 0x90);
        assert_eq!(out.alpha(), 0xFF);
    }
}
