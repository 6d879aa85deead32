use kurbo::Vec2;

use crate::{
    color::{Rgba8, lerp_u8},
    core::FrameIndex,
    ease::Ease,
    error::{ExplainerError, ExplainerResult},
};

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Rgba8 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            r: lerp_u8(a.r, b.r, t),
            g: lerp_u8(a.g, b.g, t),
            b: lerp_u8(a.b, b.b, t),
            a: lerp_u8(a.a, b.a, t),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Keyframe<T> {
    pub frame: FrameIndex,
    pub value: T,
    pub ease: Ease, // ease applied toward the next key
}

/// Keyframed property track. Always holds at least one key; value is held
/// flat before the first and after the last key.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Track<T> {
    keys: Vec<Keyframe<T>>, // sorted by frame
}

impl<T> Track<T>
where
    T: Lerp + Clone,
{
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![Keyframe {
                frame: FrameIndex(0),
                value,
                ease: Ease::Linear,
            }],
        }
    }

    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    pub fn last_frame(&self) -> FrameIndex {
        self.keys
            .last()
            .map(|k| k.frame)
            .unwrap_or(FrameIndex(0))
    }

    /// Value at the end of everything scripted so far.
    pub fn latest(&self) -> T {
        self.keys
            .last()
            .map(|k| k.value.clone())
            .expect("Track is never empty")
    }

    /// Insert a key, keeping keys frame-sorted. Earlier keys ease toward
    /// it; use [`Track::animate`] to pin the previous value first. A key at
    /// an already-used frame lands after the existing one and wins from
    /// that frame on.
    pub fn insert_key(&mut self, frame: FrameIndex, value: T, ease: Ease) {
        let idx = self.keys.partition_point(|k| k.frame.0 <= frame.0);
        self.keys.insert(idx, Keyframe { frame, value, ease });
    }

    /// Pin the current value at `frame` so a later key animates from here
    /// rather than from the previous key's timestamp.
    pub fn hold(&mut self, frame: FrameIndex) {
        if self.last_frame().0 < frame.0 {
            let v = self.latest();
            self.insert_key(frame, v, Ease::Linear);
        }
    }

    /// Schedule a change: hold the current value until `from`, then reach
    /// `value` at `to` with `ease`.
    pub fn animate(&mut self, from: FrameIndex, to: FrameIndex, value: T, ease: Ease) {
        self.hold(from);
        if let Some(last) = self.keys.last_mut()
            && last.frame.0 == from.0
        {
            last.ease = ease;
        }
        self.insert_key(to, value, Ease::Linear);
    }

    pub fn sample(&self, frame: FrameIndex) -> T {
        let f = frame.0;
        let idx = self.keys.partition_point(|k| k.frame.0 <= f);

        if idx == 0 {
            return self.keys[0].value.clone();
        }
        if idx >= self.keys.len() {
            return self.keys[self.keys.len() - 1].value.clone();
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.frame.0.saturating_sub(a.frame.0);
        if denom == 0 {
            return a.value.clone();
        }

        let t = ((f - a.frame.0) as f64) / (denom as f64);
        T::lerp(&a.value, &b.value, a.ease.apply(t))
    }

    pub fn validate(&self, duration: FrameIndex) -> ExplainerResult<()> {
        if self.keys.is_empty() {
            return Err(ExplainerError::animation("Track must have at least one key"));
        }
        if !self.keys.windows(2).all(|w| w[0].frame.0 <= w[1].frame.0) {
            return Err(ExplainerError::animation("Track keys must be frame-sorted"));
        }
        if self.last_frame().0 > duration.0 {
            return Err(ExplainerError::animation(format!(
                "Track key at frame {} exceeds scene duration {}",
                self.last_frame().0,
                duration.0
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_samples_everywhere() {
        let t = Track::constant(3.5f64);
        assert_eq!(t.sample(FrameIndex(0)), 3.5);
        assert_eq!(t.sample(FrameIndex(1000)), 3.5);
    }

    #[test]
    fn animate_holds_then_interpolates() {
        let mut t = Track::constant(0.0f64);
        t.animate(FrameIndex(10), FrameIndex(20), 10.0, Ease::Linear);

        assert_eq!(t.sample(FrameIndex(0)), 0.0);
        assert_eq!(t.sample(FrameIndex(10)), 0.0);
        assert_eq!(t.sample(FrameIndex(15)), 5.0);
        assert_eq!(t.sample(FrameIndex(20)), 10.0);
        assert_eq!(t.sample(FrameIndex(99)), 10.0);
    }

    #[test]
    fn ease_applies_toward_next_key() {
        let mut t = Track::constant(0.0f64);
        t.animate(FrameIndex(0), FrameIndex(10), 10.0, Ease::InQuad);
        // InQuad at t=0.5 is 0.25.
        assert_eq!(t.sample(FrameIndex(5)), 2.5);
    }

    #[test]
    fn chained_animates_read_previous_target() {
        let mut t = Track::constant(Vec2::ZERO);
        t.animate(FrameIndex(0), FrameIndex(10), Vec2::new(1.0, 0.0), Ease::Linear);
        t.animate(FrameIndex(20), FrameIndex(30), Vec2::new(1.0, 2.0), Ease::Linear);

        assert_eq!(t.sample(FrameIndex(15)), Vec2::new(1.0, 0.0));
        assert_eq!(t.sample(FrameIndex(25)), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn same_frame_key_wins_from_that_frame() {
        let mut t = Track::constant(1.0f64);
        t.insert_key(FrameIndex(5), 2.0, Ease::Linear);
        t.insert_key(FrameIndex(5), 3.0, Ease::Linear);
        // The initial key ramps toward the first frame-5 key.
        assert_eq!(t.sample(FrameIndex(4)), 1.8);
        assert_eq!(t.sample(FrameIndex(5)), 3.0);
        assert_eq!(t.sample(FrameIndex(6)), 3.0);
    }

    #[test]
    fn validate_rejects_out_of_duration_keys() {
        let mut t = Track::constant(0.0f64);
        t.insert_key(FrameIndex(100), 1.0, Ease::Linear);
        assert!(t.validate(FrameIndex(50)).is_err());
        assert!(t.validate(FrameIndex(100)).is_ok());
    }

    #[test]
    fn color_lerp_midpoint() {
        let a = Rgba8::rgba(0, 0, 0, 0);
        let b = Rgba8::rgba(200, 100, 50, 255);
        let m = Rgba8::lerp(&a, &b, 0.5);
        assert_eq!(m, Rgba8::rgba(100, 50, 25, 128));
    }
}
