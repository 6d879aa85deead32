//! Opening scene: a rod balanced on a sliding base tips over twice, then
//! the problem statement fades in.

use std::f64::consts::PI;

use kurbo::Vec2;

use crate::{
    color::{GRAY, WHITE},
    error::ExplainerResult,
    scene::{Scene, SceneBuilder},
    shape::{DEFAULT_STROKE_WIDTH, Shape},
    text::TextLayoutEngine,
};

use super::{ScriptConfig, balance_rig, label, unstable_attempt};

pub fn scene(cfg: &ScriptConfig, fonts: &mut TextLayoutEngine) -> ExplainerResult<Scene> {
    let mut sb = SceneBuilder::new("challenge", cfg.fps).with_seed(cfg.seed);

    let base_home = Vec2::new(0.0, -2.0);
    let (base, rod) = balance_rig("challenge", base_home);
    let base = sb.spawn_hidden(base);
    let rod = sb.spawn_hidden(rod);

    // Ground half a unit under the base bottom, spanning the frame.
    let ground_y = base_home.y - 0.5 - 0.5;
    let ground = sb.spawn_hidden(Shape::line(
        "ground",
        Vec2::new(-7.0, ground_y),
        Vec2::new(7.0, ground_y),
        DEFAULT_STROKE_WIDTH,
        GRAY,
    ));

    let title_block = label(fonts, "Problem: Learning to balance the rod", 48.0)?;
    let title = sb.spawn_hidden(Shape::text("title", title_block, WHITE).at(Vec2::new(0.0, 2.5)));

    sb.step(1.0, |s| {
        s.fade_in(base);
        s.fade_in(rod);
        s.fade_in(ground);
    });
    sb.wait(0.5);

    // Attempt 1: tip right, wobble, fall flat.
    sb.step(1.5, |s| {
        unstable_attempt(s, base, rod, PI / 3.0, [-0.3, 0.4, -0.2, 0.1]);
    });
    sb.step(0.5, |s| s.rotate_to(rod, PI / 2.0));
    sb.wait(0.5);

    // Reset: base back home, rod upright.
    sb.step(0.5, |s| {
        s.move_to(base, base_home);
        s.rotate_to(rod, 0.0);
    });

    // Attempt 2: mirrored, shallower angle.
    sb.step(1.5, |s| {
        unstable_attempt(s, base, rod, -PI / 3.5, [0.2, -0.3, 0.1, -0.2]);
    });
    sb.step(0.5, |s| s.rotate_to(rod, -PI / 2.0));
    sb.wait(0.5);

    sb.step(1.0, |s| s.fade_in(title));
    sb.wait(2.0);

    sb.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FrameIndex, Fps};

    fn build() -> Option<Scene> {
        let bytes = crate::text::load_font_bytes(None).ok()?;
        let mut fonts = TextLayoutEngine::new(bytes).ok()?;
        Some(scene(&ScriptConfig::default(), &mut fonts).unwrap())
    }

    #[test]
    fn runs_ten_seconds_at_60fps() {
        let Some(scene) = build() else {
            return; // no system font available
        };
        assert_eq!(scene.fps, Fps { num: 60, den: 1 });
        assert_eq!(scene.duration, FrameIndex(600));
    }

    #[test]
    fn rod_ends_fallen_left() {
        let Some(scene) = build() else {
            return;
        };
        let rod = scene
            .shapes
            .iter()
            .find(|s| s.name == "challenge-rod")
            .unwrap();
        let end = FrameIndex(scene.duration.0 - 1);
        assert!((rod.rotation.sample(end) + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn title_fades_in_last() {
        let Some(scene) = build() else {
            return;
        };
        let title = scene.shapes.iter().find(|s| s.name == "title").unwrap();
        assert_eq!(title.opacity.sample(FrameIndex(0)), 0.0);
        let end = FrameIndex(scene.duration.0 - 1);
        assert_eq!(title.opacity.sample(end), 1.0);
    }
}
