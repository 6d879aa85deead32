/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Alpha scaled by `t` in 0..=1.
    pub fn scale_alpha(self, t: f64) -> Self {
        let a = (f64::from(self.a) * t.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

// Palette of the explainer video.
pub const BLUE: Rgba8 = Rgba8::rgb(0x58, 0xC4, 0xDD);
pub const RED: Rgba8 = Rgba8::rgb(0xFC, 0x62, 0x55);
pub const YELLOW: Rgba8 = Rgba8::rgb(0xFF, 0xFF, 0x00);
pub const GREEN: Rgba8 = Rgba8::rgb(0x83, 0xC1, 0x67);
pub const PURPLE: Rgba8 = Rgba8::rgb(0x9A, 0x72, 0xAC);
pub const TEAL: Rgba8 = Rgba8::rgb(0x5C, 0xD0, 0xB3);
pub const WHITE: Rgba8 = Rgba8::rgb(0xFF, 0xFF, 0xFF);
pub const GRAY: Rgba8 = Rgba8::rgb(0x88, 0x88, 0x88);
pub const BACKGROUND: Rgba8 = Rgba8::rgb(0x12, 0x14, 0x1C);

pub(crate) fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    let a = f64::from(a);
    let b = f64::from(b);
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_alpha_clamps() {
        assert_eq!(WHITE.scale_alpha(0.5).a, 128);
        assert_eq!(WHITE.scale_alpha(2.0).a, 255);
        assert_eq!(WHITE.scale_alpha(-1.0).a, 0);
    }

    #[test]
    fn lerp_u8_endpoints() {
        assert_eq!(lerp_u8(0, 200, 0.0), 0);
        assert_eq!(lerp_u8(0, 200, 1.0), 200);
        assert_eq!(lerp_u8(0, 200, 0.5), 100);
    }
}
