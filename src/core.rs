use crate::error::{ExplainerError, ExplainerResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Height of the world coordinate frame in world units. The visible frame is
/// `WORLD_HEIGHT` tall regardless of canvas resolution; width follows the
/// canvas aspect ratio. Origin is the frame center, +y is up.
pub const WORLD_HEIGHT: f64 = 8.0;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    pub start: FrameIndex,
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    pub fn new(start: FrameIndex, end: FrameIndex) -> ExplainerResult<Self> {
        if start.0 > end.0 {
            return Err(ExplainerError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> ExplainerResult<Self> {
        if den == 0 {
            return Err(ExplainerError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ExplainerError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * f64::from(self.den) / f64::from(self.num)
    }

    pub fn secs_to_frames(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// Pixels per world unit at this resolution.
    pub fn px_per_unit(self) -> f64 {
        f64::from(self.height) / WORLD_HEIGHT
    }

    /// Visible world width in units (aspect-dependent; 16:9 gives ~14.22).
    pub fn world_width(self) -> f64 {
        f64::from(self.width) / self.px_per_unit()
    }

    /// Affine mapping world coordinates (center origin, +y up) to pixel
    /// coordinates (top-left origin, +y down).
    pub fn world_to_screen(self) -> Affine {
        let s = self.px_per_unit();
        Affine::translate(Vec2::new(
            f64::from(self.width) / 2.0,
            f64::from(self.height) / 2.0,
        )) * Affine::scale_non_uniform(s, -s)
    }
}

/// 2D similarity transform for a shape. Rotation and scale act about the
/// shape's local origin; geometry is authored so the local origin sits at
/// the intended pivot (e.g. the rod's contact point with its base).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform2D {
    pub translate: Vec2,
    pub rotation_rad: f64,
    pub scale: Vec2, // default (1,1)
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotation_rad: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform2D {
    pub fn at(translate: Vec2) -> Self {
        Self {
            translate,
            ..Self::default()
        }
    }

    pub fn to_affine(self) -> Affine {
        // T(translate) * R(rot) * S(scale), pivot at the local origin.
        Affine::translate(self.translate)
            * Affine::rotate(self.rotation_rad)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

/// Seeded FNV-1a 64. The only pseudo-random stream in the crate; every
/// "random" visual choice derives from it so renders are reproducible.
pub fn stable_hash64(seed: u64, s: &str) -> u64 {
    let mut h = 0xcbf2_9ce4_8422_2325u64 ^ seed;
    for &b in s.as_bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01B3);
    }
    h
}

/// Map a hash to a unit-interval float.
pub fn hash_unit_f64(h: u64) -> f64 {
    (h >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_range_contains_boundaries() {
        let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
        assert!(!r.contains(FrameIndex(1)));
        assert!(r.contains(FrameIndex(2)));
        assert!(r.contains(FrameIndex(4)));
        assert!(!r.contains(FrameIndex(5)));
    }

    #[test]
    fn fps_secs_conversions_roundtrip() {
        let fps = Fps::new(60, 1).unwrap();
        assert_eq!(fps.secs_to_frames(1.5), 90);
        assert_eq!(fps.frames_to_secs(90), 1.5);
    }

    #[test]
    fn world_to_screen_centers_origin() {
        let canvas = Canvas {
            width: 1920,
            height: 1080,
        };
        let p = canvas.world_to_screen() * Point::new(0.0, 0.0);
        assert_eq!(p, Point::new(960.0, 540.0));

        // +y in world goes up on screen.
        let up = canvas.world_to_screen() * Point::new(0.0, 1.0);
        assert!(up.y < 540.0);
        assert_eq!(canvas.px_per_unit(), 135.0);
    }

    #[test]
    fn transform_to_affine_identity_and_translation() {
        let t = Transform2D::default();
        assert_eq!(t.to_affine(), Affine::IDENTITY);

        let t = Transform2D::at(Vec2::new(10.0, -2.5));
        assert_eq!(t.to_affine(), Affine::translate(Vec2::new(10.0, -2.5)));
    }

    #[test]
    fn stable_hash_is_deterministic_and_seed_sensitive() {
        assert_eq!(stable_hash64(1, "node"), stable_hash64(1, "node"));
        assert_ne!(stable_hash64(1, "node"), stable_hash64(2, "node"));
        let u = hash_unit_f64(stable_hash64(7, "x"));
        assert!((0.0..1.0).contains(&u));
    }
}
