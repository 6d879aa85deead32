//! Closing scene: side-by-side rigs contrast the untrained controller with
//! the trained one, then the full program graph is revealed and the takeaway
//! line lands.

use std::f64::consts::{PI, TAU};

use kurbo::Vec2;

use crate::{
    color::{GRAY, GREEN, WHITE},
    ease::Ease,
    error::ExplainerResult,
    graph,
    scene::{Scene, SceneBuilder, ShapeId},
    shape::Shape,
    text::TextLayoutEngine,
};

use super::{ScriptConfig, balance_rig, label, unstable_attempt};

const FAIL_BASE: Vec2 = Vec2::new(-3.0, -2.5);
const OK_BASE: Vec2 = Vec2::new(3.0, -2.5);
const GLIDE_SECS: f64 = 5.0;
const GLIDE_AMP: f64 = 0.5;

const NODE_RADIUS: f64 = 0.25;
const GRAPH_SCALE: f64 = 0.7;

pub fn scene(cfg: &ScriptConfig, fonts: &mut TextLayoutEngine) -> ExplainerResult<Scene> {
    let mut sb = SceneBuilder::new("result", cfg.fps).with_seed(cfg.seed);

    let ground_y = FAIL_BASE.y - 0.5;
    let ground = sb.spawn_hidden(Shape::line(
        "ground",
        Vec2::new(-8.0, ground_y),
        Vec2::new(8.0, ground_y),
        crate::shape::DEFAULT_STROKE_WIDTH,
        GRAY,
    ));

    let (fail_base, fail_rod) = balance_rig("untrained", FAIL_BASE);
    let fail_base = sb.spawn_hidden(fail_base);
    let fail_rod = sb.spawn_hidden(fail_rod);
    let (ok_base, ok_rod) = balance_rig("trained", OK_BASE);
    let ok_base = sb.spawn_hidden(ok_base);
    let ok_rod = sb.spawn_hidden(ok_rod);

    let without_block = label(fonts, "without TPG", 24.0)?;
    let without = sb
        .spawn_hidden(Shape::text("without-label", without_block, WHITE).at(Vec2::new(-3.0, 2.5)));
    let with_block = label(fonts, "with TPG", 24.0)?;
    let with =
        sb.spawn_hidden(Shape::text("with-label", with_block, WHITE).at(Vec2::new(3.0, 2.5)));

    sb.step(1.0, |s| {
        for id in [ground, fail_base, fail_rod, ok_base, ok_rod, without, with] {
            s.fade_in(id);
        }
    });

    // Five seconds of contrast: the left rig repeats the opening failures
    // while the right one glides calmly on a half-sine.
    sb.step(GLIDE_SECS, |s| {
        s.during(0.0, 1.5, |w| {
            unstable_attempt(w, fail_base, fail_rod, PI / 3.0, [-0.3, 0.4, -0.2, 0.1]);
        });
        s.during(1.5, 0.5, |w| w.rotate_to(fail_rod, PI / 2.0));
        s.during(2.5, 0.5, |w| {
            w.move_to(fail_base, FAIL_BASE);
            w.rotate_to(fail_rod, 0.0);
        });
        s.during(3.0, 1.5, |w| {
            unstable_attempt(w, fail_base, fail_rod, -PI / 3.5, [0.2, -0.3, 0.1, -0.2]);
        });
        s.during(4.5, 0.5, |w| w.rotate_to(fail_rod, -PI / 2.0));

        // Updater-style dense keys for the glide.
        let frames = s.len_frames();
        let fps = frames as f64 / GLIDE_SECS;
        for f in 0..=frames {
            let t = f as f64 / fps;
            let dx = GLIDE_AMP * (PI * t / GLIDE_SECS).sin();
            let frame = s.frame_at(t);
            s.translate_track(ok_base)
                .insert_key(frame, OK_BASE + Vec2::new(dx, 0.0), Ease::Linear);
            s.translate_track(ok_rod).insert_key(
                frame,
                OK_BASE + Vec2::new(dx, 0.5),
                Ease::Linear,
            );
        }
    });

    // Clear the stage; the winning label takes center.
    sb.step(1.5, |s| {
        for id in [ground, fail_base, fail_rod, ok_base, ok_rod, without] {
            s.fade_out(id);
        }
        s.scale_by(with, 1.5);
        s.move_to(with, Vec2::new(0.0, 2.5));
    });
    sb.wait(0.5);

    // The full tangled program graph, hidden until its reveal.
    let seed = sb.seed();
    let positions = graph::node_positions();
    let mut graph_ids: Vec<ShapeId> = Vec::new();
    for (a, b) in graph::EDGES {
        let start = positions[a] * GRAPH_SCALE;
        let end = positions[b] * GRAPH_SCALE;
        let span = (end - start).hypot();
        let tip_len = 0.08 * span;
        graph_ids.push(sb.spawn_hidden(Shape::arrow_styled(
            format!("edge-{a}-{b}"),
            start,
            end,
            NODE_RADIUS * GRAPH_SCALE + 0.04,
            GREEN,
            tip_len,
            0.6 * tip_len,
            1.5 / 135.0,
        )));
    }
    for (i, &pos) in positions.iter().enumerate() {
        let colors = graph::node_segment_colors(seed, i);
        let sweep = TAU / colors.len() as f64;
        for (k, &color) in colors.iter().enumerate() {
            graph_ids.push(sb.spawn_hidden(
                Shape::sector(
                    format!("node-{i}-seg-{k}"),
                    NODE_RADIUS * GRAPH_SCALE,
                    k as f64 * sweep,
                    sweep,
                    color,
                )
                .at(pos * GRAPH_SCALE)
                .with_z(1),
            ));
        }
        let num_block = label(fonts, &(i + 1).to_string(), 14.0)?;
        graph_ids.push(sb.spawn_hidden(
            Shape::text(format!("node-{i}-number"), num_block, WHITE)
                .at(pos * GRAPH_SCALE)
                .with_z(2),
        ));
    }

    sb.step(1.5, |s| {
        s.group_fade_in(&graph_ids);
        s.group_scale(&graph_ids, 1.5);
        s.fade_out(with);
    });

    let result_block = label(fonts, "Result: Efficient AI learns complex skills!", 36.0)?;
    let result_y = 4.0 - 0.5 - result_block.height_units() / 2.0;
    let takeaway = sb.spawn_hidden(
        Shape::text("takeaway", result_block, WHITE)
            .at(Vec2::new(0.0, result_y))
            .with_z(3),
    );
    sb.step(1.0, |s| s.fade_in(takeaway));
    sb.wait(3.0);

    // Finish the fade a frame early so the last rendered frame is fully
    // black for the loop transition.
    let frame_secs = 1.0 / cfg.fps.as_f64();
    sb.step(1.0 - frame_secs, |s| {
        s.group_fade_out(&graph_ids);
        s.fade_out(takeaway);
    });
    sb.wait(frame_secs);

    sb.build()
}
