//! Evolutionary loop over a population of four teams: selection crosses
//! out the weakest, crossover breeds a child from two survivors, mutation
//! perturbs a survivor, and the best team zooms up into the simple diagram
//! that opens the hierarchy scene.

use kurbo::Vec2;

use crate::{
    color::{BLUE, GREEN, PURPLE, RED, TEAL, WHITE, YELLOW},
    core::WORLD_HEIGHT,
    error::ExplainerResult,
    scene::{Scene, SceneBuilder, ShapeId},
    shape::Shape,
    text::TextLayoutEngine,
};

use super::{ScriptConfig, above, below, label};

const TEAM_RADIUS: f64 = 1.5;
const TEAM_CENTER: Vec2 = Vec2::new(0.0, 1.5);
const SMALL_SCALE: f64 = 0.4;

/// Population slot centers, upper-left first.
const SLOTS: [Vec2; 4] = [
    Vec2::new(-3.0, 2.0),
    Vec2::new(3.0, 2.0),
    Vec2::new(-3.0, -2.0),
    Vec2::new(3.0, -2.0),
];

/// Spawn the tpg-scene end state: filled team circle, three actions, three
/// program arrows. Returns the group in [circle, actions.., arrows..] order.
fn spawn_team(sb: &mut SceneBuilder, prefix: &str) -> Vec<ShapeId> {
    let right_pt = TEAM_CENTER + Vec2::new(TEAM_RADIUS, 0.0);
    let bottom_pt = TEAM_CENTER + Vec2::new(0.0, -TEAM_RADIUS);
    let left_pt = TEAM_CENTER + Vec2::new(-TEAM_RADIUS, 0.0);
    let a1_pos = right_pt + Vec2::new(2.5, 0.0);
    let a2_pos = bottom_pt + Vec2::new(0.0, -2.5);
    let a3_pos = left_pt + Vec2::new(-2.5, 0.0);
    let tri_right = 0.3 * (30.0f64).to_radians().cos();

    vec![
        sb.spawn(
            Shape::circle(format!("{prefix}-circle"), TEAM_RADIUS, BLUE)
                .at(TEAM_CENTER)
                .with_fill(BLUE.with_alpha(77)),
        ),
        sb.spawn(Shape::square_outline(format!("{prefix}-action1"), 0.5, RED).at(a1_pos)),
        sb.spawn(Shape::circle(format!("{prefix}-action2"), 0.3, YELLOW).at(a2_pos)),
        sb.spawn(Shape::triangle(format!("{prefix}-action3"), 0.3, PURPLE).at(a3_pos)),
        sb.spawn(Shape::arrow(
            format!("{prefix}-arrow1"),
            right_pt,
            a1_pos - Vec2::new(0.25, 0.0),
            0.2,
            GREEN,
        )),
        sb.spawn(Shape::arrow(
            format!("{prefix}-arrow2"),
            bottom_pt,
            a2_pos + Vec2::new(0.0, 0.3),
            0.2,
            GREEN,
        )),
        sb.spawn(Shape::arrow(
            format!("{prefix}-arrow3"),
            left_pt,
            a3_pos + Vec2::new(tri_right, 0.0),
            0.2,
            GREEN,
        )),
    ]
}

fn copy_group(sb: &mut SceneBuilder, group: &[ShapeId], prefix: &str) -> Vec<ShapeId> {
    group
        .iter()
        .enumerate()
        .map(|(i, &id)| sb.spawn_copy(id, format!("{prefix}-{i}")))
        .collect()
}

fn group_center(sb: &SceneBuilder, group: &[ShapeId]) -> Vec2 {
    sb.group_bbox(group)
        .map(|b| b.center().to_vec2())
        .unwrap_or(Vec2::ZERO)
}

/// Cross-out X sized to a group's bounding box, spawned hidden at the
/// cursor.
fn spawn_cross(sb: &mut SceneBuilder, group: &[ShapeId], name: &str) -> ShapeId {
    let bbox = sb.group_bbox(group).unwrap_or_default();
    sb.spawn_hidden(
        Shape::cross(name, 1.0, RED)
            .at(bbox.center().to_vec2())
            .with_scale(Vec2::new(bbox.width() / 2.0, bbox.height() / 2.0))
            .with_z(5),
    )
}

pub fn scene(cfg: &ScriptConfig, fonts: &mut TextLayoutEngine) -> ExplainerResult<Scene> {
    let mut sb = SceneBuilder::new("evolution", cfg.fps).with_seed(cfg.seed);

    let initial = spawn_team(&mut sb, "team0");
    sb.wait(1.0);

    // Shrink into the first slot, then three copies fill the rest.
    sb.step(1.0, |s| s.group_scale_move_to(&initial, SMALL_SCALE, SLOTS[0]));
    let mut teams: Vec<Vec<ShapeId>> = vec![initial];
    for (k, &slot) in SLOTS.iter().enumerate().skip(1) {
        let copy = copy_group(&mut sb, &teams[0], &format!("team{k}"));
        let delta = slot - SLOTS[0];
        for &id in &copy {
            sb.offset_now(id, delta);
            sb.hide_now(id);
        }
        teams.push(copy);
    }
    {
        let faded: Vec<ShapeId> = teams[1..].iter().flatten().copied().collect();
        sb.step(1.0, |s| s.group_fade_in(&faded));
    }
    sb.wait(0.5);

    // Generation counter, upper-left corner.
    let half_w = WORLD_HEIGHT * 16.0 / 9.0 / 2.0;
    let corner = Vec2::new(-half_w + 0.5, WORLD_HEIGHT / 2.0 - 0.5);
    let gen_block = label(fonts, "Generation: ", 24.0)?;
    let gen_h = gen_block.height_units();
    let gen_w = gen_block.width_units();
    let gen_pos = Vec2::new(corner.x + gen_w / 2.0, corner.y - gen_h / 2.0);
    let gen_text = sb.spawn_hidden(Shape::text("generation-label", gen_block, WHITE).at(gen_pos));
    let number_x = corner.x + gen_w + 0.2;
    let mut numbers = Vec::new();
    for n in 1..=3u32 {
        let block = label(fonts, &n.to_string(), 24.0)?;
        let pos = Vec2::new(number_x + block.width_units() / 2.0, gen_pos.y);
        numbers.push(sb.spawn_hidden(Shape::text(format!("generation-{n}"), block, WHITE).at(pos)));
    }
    sb.step(0.5, |s| {
        s.fade_in(gen_text);
        s.fade_in(numbers[0]);
    });
    sb.wait(0.5);

    for generation in 0..2usize {
        // Tick the counter.
        sb.step(0.5, |s| {
            s.crossfade(&[numbers[generation]], &[numbers[generation + 1]]);
        });
        sb.wait(0.5);

        // Selection: cross out and remove the first team.
        let doomed = teams.remove(0);
        let deleted_slot = group_center(&sb, &doomed);
        let cross = spawn_cross(&mut sb, &doomed, &format!("cross-{generation}"));
        sb.step(0.5, |s| s.fade_in(cross));
        sb.wait(0.5);
        sb.step(0.5, |s| {
            s.group_fade_out(&doomed);
            s.fade_out(cross);
        });
        sb.wait(1.0);

        if generation == 0 {
            // Crossover: two survivors breed a child on center stage.
            let stage = Vec2::new(0.0, 0.5);
            let p1 = copy_group(&mut sb, &teams[1], "parent1");
            let p2 = copy_group(&mut sb, &teams[2], "parent2");

            let cross_block = label(fonts, "Crossover", 20.0)?;
            let cross_pos = above(stage, 0.0, 0.25, &cross_block);
            let cross_text =
                sb.spawn_hidden(Shape::text("crossover-label", cross_block, WHITE).at(cross_pos));

            sb.step(1.0, |s| {
                s.fade_in(cross_text);
                s.group_move_to(&p1, stage + Vec2::new(-1.0, 0.0));
                s.group_move_to(&p2, stage + Vec2::new(1.0, 0.0));
            });
            sb.wait(0.5);

            sb.step(0.5, |s| {
                for &id in p1.iter().chain(&p2) {
                    s.shift(id, Vec2::new(0.0, 0.3));
                }
            });

            let child_slot = stage + Vec2::new(0.0, -2.0);
            let p1_bottom = {
                let b = sb.group_bbox(&p1).unwrap_or_default();
                Vec2::new(b.center().x, b.y0.min(b.y1))
            };
            let p2_bottom = {
                let b = sb.group_bbox(&p2).unwrap_or_default();
                Vec2::new(b.center().x, b.y0.min(b.y1))
            };
            let arrow1 = sb.spawn(Shape::arrow(
                "child-arrow1",
                p1_bottom,
                child_slot + Vec2::new(0.0, 0.5),
                0.25,
                YELLOW,
            ));
            let arrow2 = sb.spawn(Shape::arrow(
                "child-arrow2",
                p2_bottom,
                child_slot + Vec2::new(0.0, 0.5),
                0.25,
                YELLOW,
            ));
            sb.step(0.5, |s| {
                s.grow(arrow1);
                s.grow(arrow2);
            });

            // The child is a copy of parent 1 recolored purple.
            let child = copy_group(&mut sb, &p1, "child");
            let child_delta = child_slot - group_center(&sb, &child);
            for &id in &child {
                sb.offset_now(id, child_delta);
                sb.hide_now(id);
            }
            sb.restyle_now(child[0], PURPLE.with_alpha(77), PURPLE);
            sb.step(0.5, |s| s.group_fade_in(&child));
            sb.wait(0.5);

            sb.step(0.5, |s| {
                s.group_fade_out(&p1);
                s.group_fade_out(&p2);
                s.fade_out(arrow1);
                s.fade_out(arrow2);
                s.fade_out(cross_text);
                s.group_move_to(&child, deleted_slot);
            });
            teams.push(child);
        } else {
            // Mutation: perturb a copy of the bottom-right survivor.
            let source = teams[1].clone();
            let mutated = copy_group(&mut sb, &source, "mutant");

            let bbox = sb.group_bbox(&mutated).unwrap_or_default();
            let mut_block = label(fonts, "Mutation", 20.0)?;
            let mut_pos = above(
                bbox.center().to_vec2(),
                bbox.height() / 2.0,
                0.25,
                &mut_block,
            );
            let mut_text =
                sb.spawn_hidden(Shape::text("mutation-label", mut_block, WHITE).at(mut_pos));
            sb.step(0.5, |s| s.fade_in(mut_text));

            let flash_at = bbox.center().to_vec2();
            sb.step(0.5, |s| s.flash("mutation-flash", flash_at, YELLOW, 0.5));
            sb.wait(0.3);

            sb.restyle_now(mutated[0], TEAL.with_alpha(77), TEAL);
            for (k, &arrow) in mutated[4..].iter().enumerate() {
                sb.step(0.3, |s| {
                    let angle = 0.3 * (s.unit_hash(&format!("mutation-arrow-{k}")) - 0.5);
                    s.rotate_by(arrow, angle);
                });
            }

            sb.step(0.5, |s| {
                s.fade_out(mut_text);
                s.group_move_to(&mutated, deleted_slot);
            });
            teams.push(mutated);
        }
        sb.wait(0.5);
    }

    sb.wait(2.0);

    // Zoom into the bottom-left survivor; everything else goes.
    let winner = teams.remove(0);
    {
        let losers: Vec<ShapeId> = teams.iter().flatten().copied().collect();
        sb.step(1.0, |s| {
            s.group_fade_out(&losers);
            s.fade_out(gen_text);
            s.fade_out(numbers[2]);
        });
    }
    sb.step(1.5, |s| s.group_scale_move_to(&winner, 2.5, Vec2::ZERO));

    // Crossfade into the simple Team A -> Action diagram.
    let team_pos = Vec2::new(-2.0, 0.0);
    let action_pos = Vec2::new(2.0, 0.0);
    let team_label_block = label(fonts, "Team A", 24.0)?;
    let team_label_pos = above(team_pos, 0.5, 0.2, &team_label_block);
    let action_label_block = label(fonts, "Action", 24.0)?;
    let action_label_pos = below(action_pos, 0.25, 0.2, &action_label_block);
    // Center the diagram group on the origin.
    let top = team_label_pos.y + team_label_block.height_units() / 2.0;
    let bottom = action_label_pos.y - action_label_block.height_units() / 2.0;
    let recenter = Vec2::new(0.0, -(top + bottom) / 2.0);

    let diagram = vec![
        sb.spawn_hidden(Shape::circle("team-a", 0.5, BLUE).at(team_pos + recenter)),
        sb.spawn_hidden(
            Shape::text("team-a-label", team_label_block, WHITE).at(team_label_pos + recenter),
        ),
        sb.spawn_hidden(Shape::square_outline("final-action", 0.5, RED).at(action_pos + recenter)),
        sb.spawn_hidden(
            Shape::text("final-action-label", action_label_block, WHITE)
                .at(action_label_pos + recenter),
        ),
        sb.spawn_hidden(Shape::arrow(
            "team-a-arrow",
            team_pos + Vec2::new(0.5, 0.0) + recenter,
            action_pos - Vec2::new(0.25, 0.0) + recenter,
            0.2,
            GREEN,
        )),
    ];
    sb.step(1.5, |s| s.crossfade(&winner, &diagram));
    sb.wait(2.0);

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
    fn counter_ends_on_generation_three() {
        let Some(scene) = build() else {
            return; // no system font available
        };
        let end = FrameIndex(scene.duration.0 - 1);
        let n1 = scene
            .shapes
            .iter()
            .find(|s| s.name == "generation-1")
            .unwrap();
        let n3 = scene
            .shapes
            .iter()
            .find(|s| s.name == "generation-3")
            .unwrap();
        assert_eq!(n1.opacity.sample(end), 0.0);
        // The whole counter fades before the final zoom, but 3 was the live
        // number during the closing hold of the loop.
        let mid = FrameIndex(scene.duration.0 - scene.fps.secs_to_frames(8.5));
        assert!(n3.opacity.sample(mid) > 0.9);
    }

    #[test]
    fn child_circle_is_purple() {
        let Some(scene) = build() else {
            return;
        };
        let child = scene.shapes.iter().find(|s| s.name == "child-0").unwrap();
        assert_eq!(child.stroke.latest(), PURPLE);
    }

    #[test]
    fn mutant_circle_turns_teal() {
        let Some(scene) = build() else {
            return;
        };
        let mutant = scene.shapes.iter().find(|s| s.name == "mutant-0").unwrap();
        assert_eq!(mutant.stroke.latest(), TEAL);
    }

    #[test]
    fn mutant_is_copied_from_the_bottom_right_team() {
        let Some(scene) = build() else {
            return;
        };
        let mutant = scene.shapes.iter().find(|s| s.name == "mutant-0").unwrap();
        let source = scene.shapes.iter().find(|s| s.name == "team3-0").unwrap();
        assert_eq!(
            mutant.translate.sample(mutant.born),
            source.translate.sample(mutant.born)
        );
    }

    #[test]
    fn ends_on_the_simple_diagram() {
        let Some(scene) = build() else {
            return;
        };
        let end = FrameIndex(scene.duration.0 - 1);
        let team_a = scene.shapes.iter().find(|s| s.name == "team-a").unwrap();
        assert_eq!(team_a.opacity.sample(end), 1.0);
        let winner_circle = scene.shapes.iter().find(|s| s.name == "team2-0").unwrap();
        assert_eq!(winner_circle.opacity.sample(end), 0.0);
    }
}
