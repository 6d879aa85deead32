//! The five scripted scenes of the explainer video, in play order:
//! a balancing-control failure, the team/program/action structure, the
//! evolutionary loop, hierarchy-to-graph, and the before/after result.

use kurbo::Vec2;

use crate::{
    core::Fps,
    error::ExplainerResult,
    scene::{Scene, ShapeId, Step},
    shape::Shape,
    text::{TextBlock, TextLayoutEngine},
};

pub mod challenge;
pub mod evolution;
pub mod hierarchy;
pub mod result;
pub mod tpg;

/// Shared knobs for every scene script.
#[derive(Clone, Copy, Debug)]
pub struct ScriptConfig {
    pub fps: Fps,
    pub seed: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            fps: Fps { num: 60, den: 1 },
            seed: 7,
        }
    }
}

/// All scenes in video order.
pub fn all(cfg: &ScriptConfig, fonts: &mut TextLayoutEngine) -> ExplainerResult<Vec<Scene>> {
    Ok(vec![
        challenge::scene(cfg, fonts)?,
        tpg::scene(cfg, fonts)?,
        evolution::scene(cfg, fonts)?,
        hierarchy::scene(cfg, fonts)?,
        result::scene(cfg, fonts)?,
    ])
}

pub fn scene_by_name(
    name: &str,
    cfg: &ScriptConfig,
    fonts: &mut TextLayoutEngine,
) -> ExplainerResult<Scene> {
    match name {
        "challenge" => challenge::scene(cfg, fonts),
        "tpg" => tpg::scene(cfg, fonts),
        "evolution" => evolution::scene(cfg, fonts),
        "hierarchy" => hierarchy::scene(cfg, fonts),
        "result" => result::scene(cfg, fonts),
        other => Err(crate::error::ExplainerError::validation(format!(
            "unknown scene '{other}' (expected challenge | tpg | evolution | hierarchy | result)"
        ))),
    }
}

pub const SCENE_NAMES: &[&str] = &["challenge", "tpg", "evolution", "hierarchy", "result"];

/// Manim-style font sizes read as points; text is shaped at double that in
/// pixels at the 1080p reference density.
pub(crate) fn label(
    fonts: &mut TextLayoutEngine,
    text: &str,
    font_size: f32,
) -> ExplainerResult<TextBlock> {
    fonts.layout(text, font_size * 2.0)
}

// Label placement relative to an anchor shape, Manim `next_to` fashion.

pub(crate) fn below(center: Vec2, half_h: f64, buff: f64, block: &TextBlock) -> Vec2 {
    Vec2::new(center.x, center.y - half_h - buff - block.height_units() / 2.0)
}

pub(crate) fn above(center: Vec2, half_h: f64, buff: f64, block: &TextBlock) -> Vec2 {
    Vec2::new(center.x, center.y + half_h + buff + block.height_units() / 2.0)
}

pub(crate) fn left_of(center: Vec2, half_w: f64, buff: f64, block: &TextBlock) -> Vec2 {
    Vec2::new(center.x - half_w - buff - block.width_units() / 2.0, center.y)
}

pub(crate) fn right_of(center: Vec2, half_w: f64, buff: f64, block: &TextBlock) -> Vec2 {
    Vec2::new(center.x + half_w + buff + block.width_units() / 2.0, center.y)
}

/// Endpoints of an arrow drawn between `start` and `end` with `buff` world
/// units trimmed at both ends, used when tracing a path along arrows.
pub(crate) fn arrow_span(start: Vec2, end: Vec2, buff: f64) -> (Vec2, Vec2) {
    let full = end - start;
    let len = full.hypot();
    if len <= 2.0 * buff {
        return (start, end);
    }
    let dir = full * (1.0 / len);
    (start + dir * buff, end - dir * buff)
}

/// One destabilize-then-wobble attempt of a base+rod rig: the rod tips to
/// `angle` over the enclosing step's window while the base jitters through
/// `shifts` in the second half (linear, evenly spaced).
pub(crate) fn unstable_attempt(
    s: &mut Step<'_>,
    base: ShapeId,
    rod: ShapeId,
    angle_rad: f64,
    shifts: [f64; 4],
) {
    s.rotate_to(rod, angle_rad);
    let window = s.len_secs();
    let slot = window / 2.0 / shifts.len() as f64;
    for (i, dx) in shifts.into_iter().enumerate() {
        s.during(window / 2.0 + i as f64 * slot, slot, |w| {
            w.shift_with(base, Vec2::new(dx, 0.0), crate::ease::Ease::Linear);
        });
    }
}

/// The standard base+rod rig: blue unit square resting on its position,
/// white 3-unit rod pivoting at the base-top contact point.
pub(crate) fn balance_rig(
    name_prefix: &str,
    base_pos: Vec2,
) -> (Shape, Shape) {
    use crate::color::{BLUE, WHITE};

    let base = Shape::square(format!("{name_prefix}-base"), 1.0, BLUE).at(base_pos);
    let top = base_pos + Vec2::new(0.0, 0.5);
    let rod = Shape::line(
        format!("{name_prefix}-rod"),
        top,
        top + Vec2::new(0.0, 3.0),
        8.0 / 135.0,
        WHITE,
    );
    (base, rod)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FrameIndex;
    use crate::scene::SceneBuilder;

    #[test]
    fn unstable_attempt_scales_to_the_step_window() {
        let fps = Fps::new(60, 1).unwrap();
        let mut sb = SceneBuilder::new("t", fps);
        let (base, rod) = balance_rig("rig", Vec2::ZERO);
        let base = sb.spawn(base);
        let rod = sb.spawn(rod);
        sb.step(3.0, |s| {
            unstable_attempt(s, base, rod, 1.0, [0.1, 0.1, 0.1, 0.1]);
        });
        let scene = sb.build().unwrap();

        let tr = &scene.shapes[base.0].translate;
        // Wobble occupies the second half of the window, whatever its length.
        assert_eq!(tr.sample(FrameIndex(84)), Vec2::ZERO);
        assert!(tr.sample(FrameIndex(120)).x > 0.0);
        let end = tr.sample(FrameIndex(180));
        assert!((end.x - 0.4).abs() < 1e-9);
        assert!((scene.shapes[rod.0].rotation.sample(FrameIndex(180)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn arrow_span_trims_both_ends() {
        let (a, b) = arrow_span(Vec2::ZERO, Vec2::new(4.0, 0.0), 0.5);
        assert_eq!(a, Vec2::new(0.5, 0.0));
        assert_eq!(b, Vec2::new(3.5, 0.0));
        // Too short to trim: endpoints come back untouched.
        let (a, b) = arrow_span(Vec2::ZERO, Vec2::new(0.8, 0.0), 0.5);
        assert_eq!(a, Vec2::ZERO);
        assert_eq!(b, Vec2::new(0.8, 0.0));
    }
}
