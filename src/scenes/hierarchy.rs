//! A single team grows into a small hierarchy: Team A learns to delegate
//! to Teams B and C, which both feed Team D, which finally emits the
//! action. Two yellow tokens then trace decision routes through the graph.

use kurbo::Vec2;

use crate::{
    color::{BLUE, GREEN, RED, WHITE, YELLOW},
    ease::Ease,
    error::ExplainerResult,
    scene::{Scene, SceneBuilder},
    shape::Shape,
    text::TextLayoutEngine,
};

use super::{ScriptConfig, above, arrow_span, below, label, left_of, right_of};

const TEAM_R: f64 = 0.5;
const ACTION_HALF: f64 = 0.25;
const BUFF: f64 = 0.2;

const A_TOP: Vec2 = Vec2::new(0.0, 2.0);
const B_POS: Vec2 = Vec2::new(-1.5, 0.0);
const C_POS: Vec2 = Vec2::new(1.5, 0.0);
const D_POS: Vec2 = Vec2::new(0.0, -2.0);
const ACTION_POS: Vec2 = Vec2::new(3.0, -2.0);

pub fn scene(cfg: &ScriptConfig, fonts: &mut TextLayoutEngine) -> ExplainerResult<Scene> {
    let mut sb = SceneBuilder::new("hierarchy", cfg.fps).with_seed(cfg.seed);

    // Opening diagram, the evolution scene's end state recentered on the
    // origin.
    let a_start = Vec2::new(-2.0, 0.0);
    let first_action = Vec2::new(2.0, 0.0);
    let a_block = label(fonts, "Team A", 24.0)?;
    let a_label_pos = above(a_start, TEAM_R, BUFF, &a_block);
    let act_block = label(fonts, "Action", 24.0)?;
    let act_label_pos = below(first_action, ACTION_HALF, BUFF, &act_block);
    let top = a_label_pos.y + a_block.height_units() / 2.0;
    let bottom = act_label_pos.y - act_block.height_units() / 2.0;
    let recenter = Vec2::new(0.0, -(top + bottom) / 2.0);

    let a_label_h = a_block.height_units();
    let team_a = sb.spawn_hidden(Shape::circle("team-a", TEAM_R, BLUE).at(a_start + recenter));
    let a_label =
        sb.spawn_hidden(Shape::text("team-a-label", a_block, WHITE).at(a_label_pos + recenter));
    let first_act = sb.spawn_hidden(
        Shape::square_outline("first-action", 2.0 * ACTION_HALF, RED).at(first_action + recenter),
    );
    let first_act_label =
        sb.spawn_hidden(Shape::text("first-action-label", act_block, WHITE).at(act_label_pos + recenter));
    sb.step(1.0, |s| {
        s.fade_in(team_a);
        s.fade_in(a_label);
        s.fade_in(first_act);
        s.fade_in(first_act_label);
    });

    let first_arrow = sb.spawn(Shape::arrow(
        "first-arrow",
        a_start + Vec2::new(TEAM_R, 0.0) + recenter,
        first_action - Vec2::new(ACTION_HALF, 0.0) + recenter,
        BUFF,
        GREEN,
    ));
    sb.step(1.0, |s| s.grow(first_arrow));
    sb.wait(0.5);

    // Team A climbs to the top; the lone action dissolves.
    let a_label_top = Vec2::new(A_TOP.x, A_TOP.y + TEAM_R + BUFF + a_label_h / 2.0);
    sb.step(1.0, |s| {
        s.move_to(team_a, A_TOP);
        s.move_to(a_label, a_label_top);
        s.fade_out(first_act);
        s.fade_out(first_act_label);
        s.fade_out(first_arrow);
    });

    // Teams B and C appear at mid level.
    let b_block = label(fonts, "Team B", 24.0)?;
    let b_label_pos = left_of(B_POS, TEAM_R, BUFF, &b_block);
    let c_block = label(fonts, "Team C", 24.0)?;
    let c_label_pos = right_of(C_POS, TEAM_R, BUFF, &c_block);
    let team_b = sb.spawn_hidden(Shape::circle("team-b", TEAM_R, BLUE).at(B_POS));
    let b_label = sb.spawn_hidden(Shape::text("team-b-label", b_block, WHITE).at(b_label_pos));
    let team_c = sb.spawn_hidden(Shape::circle("team-c", TEAM_R, BLUE).at(C_POS));
    let c_label = sb.spawn_hidden(Shape::text("team-c-label", c_block, WHITE).at(c_label_pos));
    sb.step(1.0, |s| {
        s.fade_in(team_b);
        s.fade_in(b_label);
        s.fade_in(team_c);
        s.fade_in(c_label);
    });

    let a_bottom = A_TOP - Vec2::new(0.0, TEAM_R);
    let b_top = B_POS + Vec2::new(0.0, TEAM_R);
    let c_top = C_POS + Vec2::new(0.0, TEAM_R);
    let arrow_ab = sb.spawn(Shape::arrow("arrow-a-b", a_bottom, b_top, BUFF, GREEN));
    let arrow_ac = sb.spawn(Shape::arrow("arrow-a-c", a_bottom, c_top, BUFF, GREEN));
    sb.step(1.0, |s| {
        s.grow(arrow_ab);
        s.grow(arrow_ac);
    });
    sb.wait(0.5);

    // Team D below, fed by both.
    let d_block = label(fonts, "Team D", 24.0)?;
    let d_label_pos = below(D_POS, TEAM_R, BUFF, &d_block);
    let team_d = sb.spawn_hidden(Shape::circle("team-d", TEAM_R, BLUE).at(D_POS));
    let d_label = sb.spawn_hidden(Shape::text("team-d-label", d_block, WHITE).at(d_label_pos));
    sb.step(1.0, |s| {
        s.fade_in(team_d);
        s.fade_in(d_label);
    });

    let b_bottom = B_POS - Vec2::new(0.0, TEAM_R);
    let c_bottom = C_POS - Vec2::new(0.0, TEAM_R);
    let d_top = D_POS + Vec2::new(0.0, TEAM_R);
    let arrow_bd = sb.spawn(Shape::arrow("arrow-b-d", b_bottom, d_top, BUFF, GREEN));
    let arrow_cd = sb.spawn(Shape::arrow("arrow-c-d", c_bottom, d_top, BUFF, GREEN));
    sb.step(1.0, |s| {
        s.grow(arrow_bd);
        s.grow(arrow_cd);
    });
    sb.wait(0.5);

    // The final action hangs off Team D.
    let final_block = label(fonts, "Action", 24.0)?;
    let final_label_pos = below(ACTION_POS, ACTION_HALF, BUFF, &final_block);
    let final_act = sb
        .spawn_hidden(Shape::square_outline("final-action", 2.0 * ACTION_HALF, RED).at(ACTION_POS));
    let final_label =
        sb.spawn_hidden(Shape::text("final-action-label", final_block, WHITE).at(final_label_pos));
    sb.step(1.0, |s| {
        s.fade_in(final_act);
        s.fade_in(final_label);
    });

    let d_right = D_POS + Vec2::new(TEAM_R, 0.0);
    let act_left = ACTION_POS - Vec2::new(ACTION_HALF, 0.0);
    let arrow_da = sb.spawn(Shape::arrow("arrow-d-action", d_right, act_left, BUFF, GREEN));
    sb.step(1.0, |s| s.grow(arrow_da));
    sb.wait(0.5);

    // A decision token walks both routes through the hierarchy.
    let token = sb.spawn_hidden(Shape::dot("decision-token", 0.1, YELLOW).at(A_TOP).with_z(10));
    sb.step(0.2, |s| s.fade_in(token));

    let route_left = route(&[A_TOP, B_POS, D_POS, Vec2::new(ACTION_POS.x - 0.25, D_POS.y)]);
    sb.step(3.0, |s| s.follow_path(token, &route_left, Ease::InOutSine));
    sb.wait(0.5);

    sb.step(0.2, |s| s.move_to(token, A_TOP));
    let route_right = route(&[A_TOP, C_POS, D_POS, Vec2::new(ACTION_POS.x - 0.25, D_POS.y)]);
    sb.step(3.0, |s| s.follow_path(token, &route_right, Ease::InOutSine));
    sb.wait(0.5);

    sb.step(1.0, |s| s.fade_out(token));
    sb.wait(3.0);

    sb.build()
}

/// Expand node centers into arrow-trimmed waypoints so the token hugs the
/// drawn edges rather than cutting through circles.
fn route(stops: &[Vec2]) -> Vec<Vec2> {
    let mut points = vec![stops[0]];
    for pair in stops.windows(2) {
        let (from, to) = arrow_span(pair[0], pair[1], BUFF + TEAM_R);
        points.push(from);
        points.push(to);
        points.push(pair[1]);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FrameIndex;

    fn build() -> Option<Scene> {
        let bytes = crate::text::load_font_bytes(None).ok()?;
        let mut fonts = TextLayoutEngine::new(bytes).ok()?;
        Some(scene(&ScriptConfig::default(), &mut fonts).unwrap())
    }

    #[test]
    fn team_a_ends_at_the_top() {
        let Some(scene) = build() else {
            return; // no system font available
        };
        let a = scene.shapes.iter().find(|s| s.name == "team-a").unwrap();
        let end = FrameIndex(scene.duration.0 - 1);
        let pos = a.translate.sample(end);
        assert!((pos.x - A_TOP.x).abs() < 1e-9);
        assert!((pos.y - A_TOP.y).abs() < 1e-9);
    }

    #[test]
    fn token_travels_and_fades() {
        let Some(scene) = build() else {
            return;
        };
        let token = scene
            .shapes
            .iter()
            .find(|s| s.name == "decision-token")
            .unwrap();
        let end = FrameIndex(scene.duration.0 - 1);
        assert_eq!(token.opacity.sample(end), 0.0);
        // At rest after the second route, the token sits near the action.
        let settle = FrameIndex(scene.duration.0 - scene.fps.secs_to_frames(4.2));
        let pos = token.translate.sample(settle);
        assert!((pos.y - D_POS.y).abs() < 1e-6);
        assert!(pos.x > 2.0);
    }

    #[test]
    fn five_grow_arrows_exist() {
        let Some(scene) = build() else {
            return;
        };
        let arrows = scene
            .shapes
            .iter()
            .filter(|s| s.name.starts_with("arrow-"))
            .count();
        assert_eq!(arrows, 5);
    }
}
