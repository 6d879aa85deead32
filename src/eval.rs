use kurbo::Affine;

use crate::{
    color::Rgba8,
    core::FrameIndex,
    error::{ExplainerError, ExplainerResult},
    scene::{Scene, ShapeId},
};

/// Everything the rasterizer needs for one frame: the visible shapes in
/// back-to-front paint order with their track values sampled.
#[derive(Clone, Debug, serde::Serialize)]
pub struct EvaluatedFrame {
    pub frame: FrameIndex,
    pub nodes: Vec<DrawNode>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct DrawNode {
    pub shape: ShapeId,
    pub z: i32,
    /// Local-to-world transform.
    pub transform: Affine,
    pub opacity: f64,
    pub fill: Rgba8,
    pub stroke: Rgba8,
}

pub struct Evaluator;

impl Evaluator {
    #[tracing::instrument(skip(scene), fields(scene = %scene.name))]
    pub fn eval_frame(scene: &Scene, frame: FrameIndex) -> ExplainerResult<EvaluatedFrame> {
        if frame.0 >= scene.duration.0 {
            return Err(ExplainerError::animation(format!(
                "frame {} out of bounds for scene of {} frames",
                frame.0, scene.duration.0
            )));
        }

        let mut nodes: Vec<DrawNode> = Vec::new();
        for (index, shape) in scene.shapes.iter().enumerate() {
            if frame.0 < shape.born.0 {
                continue;
            }
            let opacity = shape.opacity.sample(frame).clamp(0.0, 1.0);
            nodes.push(DrawNode {
                shape: ShapeId(index),
                z: shape.z,
                transform: shape.transform_at(frame).to_affine(),
                opacity,
                fill: shape.fill.sample(frame),
                stroke: shape.stroke.sample(frame),
            });
        }

        // Spawn order breaks z ties, so later shapes paint on top.
        nodes.sort_by_key(|n| (n.z, n.shape.0));

        Ok(EvaluatedFrame { frame, nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        color::{BLUE, RED},
        scene::SceneBuilder,
        shape::Shape,
    };

    fn two_dot_scene() -> Scene {
        let mut sb = SceneBuilder::new("eval-test", crate::core::Fps::new(30, 1).unwrap());
        let a = sb.spawn(Shape::dot("a", 0.1, BLUE).with_z(5));
        sb.step(1.0, |s| s.fade_out(a));
        sb.spawn(Shape::dot("b", 0.1, RED));
        sb.wait(1.0);
        sb.build().unwrap()
    }

    #[test]
    fn birth_frame_gates_visibility() {
        let scene = two_dot_scene();
        let g0 = Evaluator::eval_frame(&scene, FrameIndex(0)).unwrap();
        assert_eq!(g0.nodes.len(), 1);
        let g_late = Evaluator::eval_frame(&scene, FrameIndex(40)).unwrap();
        assert_eq!(g_late.nodes.len(), 2);
    }

    #[test]
    fn nodes_sorted_by_z_then_spawn_order() {
        let scene = two_dot_scene();
        let g = Evaluator::eval_frame(&scene, FrameIndex(40)).unwrap();
        // Shape b has z 0 and paints under the z-5 shape a.
        assert_eq!(g.nodes[0].shape, ShapeId(1));
        assert_eq!(g.nodes[1].shape, ShapeId(0));
    }

    #[test]
    fn out_of_bounds_frame_is_rejected() {
        let scene = two_dot_scene();
        let end = scene.duration;
        assert!(Evaluator::eval_frame(&scene, end).is_err());
        assert!(Evaluator::eval_frame(&scene, FrameIndex(end.0 - 1)).is_ok());
    }
}
