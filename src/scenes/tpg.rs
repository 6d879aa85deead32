//! Team / program / action structure: a decision team circle routes an
//! input through program arrows to candidate actions, bids with suggestion
//! bars, and the winning action is highlighted.

use kurbo::Vec2;

use crate::{
    color::{BLUE, GREEN, PURPLE, RED, WHITE, YELLOW},
    error::ExplainerResult,
    scene::{Scene, SceneBuilder},
    shape::Shape,
    text::TextLayoutEngine,
};

use super::{ScriptConfig, below, label};

const TEAM_RADIUS: f64 = 1.5;
const TEAM_CENTER: Vec2 = Vec2::new(0.0, 1.5);
const ACTION_SIDE: f64 = 0.5;
const TRI_RADIUS: f64 = 0.3;
const ARROW_BUFF: f64 = 0.2;

pub fn scene(cfg: &ScriptConfig, fonts: &mut TextLayoutEngine) -> ExplainerResult<Scene> {
    let mut sb = SceneBuilder::new("tpg", cfg.fps).with_seed(cfg.seed);

    // Action positions hang 2.5 units off the team circle's edge points.
    let right_pt = TEAM_CENTER + Vec2::new(TEAM_RADIUS, 0.0);
    let bottom_pt = TEAM_CENTER + Vec2::new(0.0, -TEAM_RADIUS);
    let left_pt = TEAM_CENTER + Vec2::new(-TEAM_RADIUS, 0.0);
    let a1_pos = right_pt + Vec2::new(2.5, 0.0);
    let a2_pos = bottom_pt + Vec2::new(0.0, -2.5);
    let a3_pos = left_pt + Vec2::new(-2.5, 0.0);
    // Rightmost extent of the triangle's bounding box.
    let tri_right = TRI_RADIUS * (30.0f64).to_radians().cos();

    let team = sb.spawn_hidden(Shape::circle("team", TEAM_RADIUS, BLUE).at(TEAM_CENTER));
    let team_label_block = label(fonts, "Decision Team", 24.0)?;
    let team_label =
        sb.spawn_hidden(Shape::text("team-label", team_label_block, WHITE).at(TEAM_CENTER));

    let action1 = sb.spawn_hidden(Shape::square_outline("action1", ACTION_SIDE, RED).at(a1_pos));
    let a1_label_block = label(fonts, "Action A", 16.0)?;
    let a1_label_pos = below(a1_pos, ACTION_SIDE / 2.0, 0.1, &a1_label_block);
    let a1_label = sb.spawn_hidden(Shape::text("action1-label", a1_label_block, WHITE).at(a1_label_pos));

    let action2 = sb.spawn_hidden(Shape::circle("action2", 0.3, YELLOW).at(a2_pos));
    let a2_label_block = label(fonts, "Action B", 16.0)?;
    let a2_label_pos = below(a2_pos, 0.3, 0.1, &a2_label_block);
    let a2_label = sb.spawn_hidden(Shape::text("action2-label", a2_label_block, WHITE).at(a2_label_pos));

    let action3 = sb.spawn_hidden(Shape::triangle("action3", TRI_RADIUS, PURPLE).at(a3_pos));
    let a3_label_block = label(fonts, "Action C", 16.0)?;
    let a3_label_pos = below(a3_pos, TRI_RADIUS / 2.0, 0.1, &a3_label_block);
    let a3_label = sb.spawn_hidden(Shape::text("action3-label", a3_label_block, WHITE).at(a3_label_pos));

    sb.step(1.0, |s| {
        s.fade_in(team);
        s.fade_in(team_label);
    });
    sb.wait(0.5);

    // Program arrows grow out of the circle's edge toward each action.
    let arrow1 = sb.spawn(Shape::arrow(
        "arrow1",
        right_pt,
        a1_pos - Vec2::new(ACTION_SIDE / 2.0, 0.0),
        ARROW_BUFF,
        GREEN,
    ));
    let arrow2 = sb.spawn(Shape::arrow(
        "arrow2",
        bottom_pt,
        a2_pos + Vec2::new(0.0, 0.3),
        ARROW_BUFF,
        GREEN,
    ));
    let arrow3 = sb.spawn(Shape::arrow(
        "arrow3",
        left_pt,
        a3_pos + Vec2::new(tri_right, 0.0),
        ARROW_BUFF,
        GREEN,
    ));
    sb.step(1.0, |s| {
        s.grow(arrow1);
        s.grow(arrow2);
        s.grow(arrow3);
    });
    sb.wait(0.5);

    sb.step(1.0, |s| {
        for id in [action1, a1_label, action2, a2_label, action3, a3_label] {
            s.fade_in(id);
        }
    });
    sb.wait(1.0);

    // The team lights up: 30% blue interior.
    sb.step(0.5, |s| s.set_fill(team, BLUE.with_alpha(77)));
    sb.wait(0.2);

    sb.step(0.5, |s| {
        for id in [team_label, a1_label, a2_label, a3_label] {
            s.fade_out(id);
        }
    });
    sb.wait(0.5);

    // An input arrives and enters the team.
    let input_pos = Vec2::new(-4.0, 0.0);
    let input = sb.spawn_hidden(Shape::square_outline("input", 0.5, WHITE).at(input_pos));
    let input_label_block = label(fonts, "Input", 16.0)?;
    let input_label_pos = below(input_pos, 0.25, 0.1, &input_label_block);
    let input_label =
        sb.spawn_hidden(Shape::text("input-label", input_label_block, WHITE).at(input_label_pos));
    sb.step(0.5, |s| {
        s.fade_in(input);
        s.fade_in(input_label);
    });
    sb.wait(0.5);
    sb.step(1.0, |s| {
        s.move_to(input, TEAM_CENTER);
        s.fade_out(input_label);
    });
    sb.wait(0.5);

    // Suggestion bars beside each action (left side for action3).
    let bar_w = 0.2;
    let bar_h = 0.1;
    let bar1_pos = Vec2::new(a1_pos.x + ACTION_SIDE / 2.0 + 0.2 + bar_w / 2.0, a1_pos.y);
    let bar2_pos = Vec2::new(a2_pos.x + 0.3 + 0.2 + bar_w / 2.0, a2_pos.y);
    let bar3_pos = Vec2::new(a3_pos.x - tri_right - 0.2 - bar_w / 2.0, a3_pos.y);
    let bar1 = sb.spawn_hidden(
        Shape::rectangle("bar1", bar_w, bar_h, RED.with_alpha(204)).at(bar1_pos),
    );
    let bar2 = sb.spawn_hidden(
        Shape::rectangle("bar2", bar_w, bar_h, YELLOW.with_alpha(204)).at(bar2_pos),
    );
    let bar3 = sb.spawn_hidden(
        Shape::rectangle("bar3", bar_w, bar_h, PURPLE.with_alpha(204)).at(bar3_pos),
    );
    sb.step(0.5, |s| {
        s.fade_in(bar1);
        s.fade_in(bar2);
        s.fade_in(bar3);
    });
    sb.wait(0.5);

    // Bids: bars stretch to their suggestion strengths.
    sb.step(1.0, |s| {
        s.scale_y_to(bar1, 1.5 / bar_h);
        s.scale_y_to(bar2, 0.8 / bar_h);
        s.scale_y_to(bar3, 1.2 / bar_h);
    });
    sb.wait(0.5);

    // The strongest bid wins.
    sb.step(0.5, |s| s.flash("bar1-flash", bar1_pos, RED, 0.3));
    sb.step(0.5, |s| {
        s.set_color(arrow1, YELLOW);
        s.indicate(action1, YELLOW);
    });
    sb.wait(0.5);

    sb.build()
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
    fn winning_arrow_turns_yellow() {
        let Some(scene) = build() else {
            return; // no system font available
        };
        let arrow = scene.shapes.iter().find(|s| s.name == "arrow1").unwrap();
        let end = FrameIndex(scene.duration.0 - 1);
        assert_eq!(arrow.stroke.sample(end), YELLOW);
        let loser = scene.shapes.iter().find(|s| s.name == "arrow2").unwrap();
        assert_eq!(loser.stroke.sample(end), GREEN);
    }

    #[test]
    fn bars_reach_their_bid_heights() {
        let Some(scene) = build() else {
            return;
        };
        let end = FrameIndex(scene.duration.0 - 1);
        let bar1 = scene.shapes.iter().find(|s| s.name == "bar1").unwrap();
        assert!((bar1.scale.sample(end).y - 15.0).abs() < 1e-9);
        let bar2 = scene.shapes.iter().find(|s| s.name == "bar2").unwrap();
        assert!((bar2.scale.sample(end).y - 8.0).abs() < 1e-9);
    }

    #[test]
    fn input_ends_inside_the_team() {
        let Some(scene) = build() else {
            return;
        };
        let end = FrameIndex(scene.duration.0 - 1);
        let input = scene.shapes.iter().find(|s| s.name == "input").unwrap();
        assert_eq!(input.translate.sample(end), TEAM_CENTER);
    }
}
