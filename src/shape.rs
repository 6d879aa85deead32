use kurbo::{BezPath, Circle, CircleSegment, Point, Rect, Shape as _, Vec2};

use crate::{
    color::Rgba8,
    core::{FrameIndex, Transform2D},
    ease::Ease,
    error::ExplainerResult,
    text::TextBlock,
    track::Track,
};

/// Curve flattening tolerance in world units (~0.14px at 1080p).
const PATH_TOLERANCE: f64 = 1e-3;

/// Manim-like default outline width in world units (4px at 1080p).
pub const DEFAULT_STROKE_WIDTH: f64 = 4.0 / 135.0;

/// Static geometry of a shape, authored in local coordinates. The local
/// origin is the pivot for rotation and scale, so constructors place it
/// deliberately (a rod pivots at its lower end, a circle at its center).
#[derive(Clone, Debug, serde::Serialize)]
pub enum Geometry {
    Path(PathGeometry),
    Text(TextBlock),
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct PathGeometry {
    /// Filled region; empty path when the shape has no fill.
    pub fill_path: BezPath,
    /// Outlined region; empty path when the shape has no outline.
    pub stroke_path: BezPath,
    /// Outline width in world units.
    pub stroke_width: f64,
}

/// One animatable visual. Property tracks are keyed in scene-global frames.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Shape {
    pub name: String,
    pub geometry: Geometry,
    /// First frame at which the shape exists at all.
    pub born: FrameIndex,
    pub z: i32,
    pub translate: Track<Vec2>,
    pub rotation: Track<f64>,
    pub scale: Track<Vec2>,
    /// Whole-shape opacity multiplier, 0..1.
    pub opacity: Track<f64>,
    pub fill: Track<Rgba8>,
    pub stroke: Track<Rgba8>,
}

impl Shape {
    fn from_parts(name: impl Into<String>, geometry: Geometry, fill: Rgba8, stroke: Rgba8) -> Self {
        Self {
            name: name.into(),
            geometry,
            born: FrameIndex(0),
            z: 0,
            translate: Track::constant(Vec2::ZERO),
            rotation: Track::constant(0.0),
            scale: Track::constant(Vec2::new(1.0, 1.0)),
            opacity: Track::constant(1.0),
            fill: Track::constant(fill),
            stroke: Track::constant(stroke),
        }
    }

    fn path_shape(
        name: impl Into<String>,
        fill_path: BezPath,
        stroke_path: BezPath,
        stroke_width: f64,
        fill: Rgba8,
        stroke: Rgba8,
    ) -> Self {
        Self::from_parts(
            name,
            Geometry::Path(PathGeometry {
                fill_path,
                stroke_path,
                stroke_width,
            }),
            fill,
            stroke,
        )
    }

    /// Outlined circle centered on the local origin. Fill starts transparent
    /// so it can be faded in later (`set_fill`).
    pub fn circle(name: impl Into<String>, radius: f64, color: Rgba8) -> Self {
        let path = Circle::new(Point::ORIGIN, radius).into_path(PATH_TOLERANCE);
        Self::path_shape(
            name,
            path.clone(),
            path,
            DEFAULT_STROKE_WIDTH,
            color.with_alpha(0),
            color,
        )
    }

    /// Filled disc centered on the local origin.
    pub fn dot(name: impl Into<String>, radius: f64, color: Rgba8) -> Self {
        let path = Circle::new(Point::ORIGIN, radius).into_path(PATH_TOLERANCE);
        Self::path_shape(name, path, BezPath::new(), 0.0, color, color)
    }

    /// Filled square centered on the local origin.
    pub fn square(name: impl Into<String>, side: f64, color: Rgba8) -> Self {
        Self::rectangle(name, side, side, color)
    }

    /// Filled axis-aligned rectangle centered on the local origin.
    pub fn rectangle(name: impl Into<String>, width: f64, height: f64, color: Rgba8) -> Self {
        let r = Rect::new(-width / 2.0, -height / 2.0, width / 2.0, height / 2.0);
        let path = r.into_path(PATH_TOLERANCE);
        Self::path_shape(
            name,
            path.clone(),
            path,
            DEFAULT_STROKE_WIDTH,
            color,
            color,
        )
    }

    /// Outlined square (no fill until `set_fill`).
    pub fn square_outline(name: impl Into<String>, side: f64, color: Rgba8) -> Self {
        let r = Rect::new(-side / 2.0, -side / 2.0, side / 2.0, side / 2.0);
        let path = r.into_path(PATH_TOLERANCE);
        Self::path_shape(
            name,
            path.clone(),
            path,
            DEFAULT_STROKE_WIDTH,
            color.with_alpha(0),
            color,
        )
    }

    /// Outlined equilateral triangle, vertices on a circle of `radius`
    /// around the local origin, one vertex pointing up.
    pub fn triangle(name: impl Into<String>, radius: f64, color: Rgba8) -> Self {
        let mut path = BezPath::new();
        for (i, deg) in [90.0f64, 210.0, 330.0].iter().enumerate() {
            let rad = deg.to_radians();
            let p = Point::new(radius * rad.cos(), radius * rad.sin());
            if i == 0 {
                path.move_to(p);
            } else {
                path.line_to(p);
            }
        }
        path.close_path();
        Self::path_shape(
            name,
            path.clone(),
            path,
            DEFAULT_STROKE_WIDTH,
            color.with_alpha(0),
            color,
        )
    }

    /// Stroked line segment. The local origin is `from`; the shape's
    /// translation should be set to `from`'s world position.
    pub fn line(
        name: impl Into<String>,
        from: Vec2,
        to: Vec2,
        stroke_width: f64,
        color: Rgba8,
    ) -> Self {
        let mut path = BezPath::new();
        path.move_to(Point::ORIGIN);
        path.line_to((to - from).to_point());
        let mut s = Self::path_shape(name, BezPath::new(), path, stroke_width, color, color);
        s.translate = Track::constant(from);
        s
    }

    /// Arrow from `start` to `end` with a `buff` gap at both endpoints and a
    /// filled triangular tip. Local origin at the (buffered) start so that
    /// growing the arrow scales it out of its source.
    pub fn arrow(name: impl Into<String>, start: Vec2, end: Vec2, buff: f64, color: Rgba8) -> Self {
        Self::arrow_styled(name, start, end, buff, color, 0.25, 0.14, DEFAULT_STROKE_WIDTH)
    }

    /// Arrow with explicit tip length/width and shaft width (all world
    /// units). Used for the thin graph edges of the result scene.
    pub fn arrow_styled(
        name: impl Into<String>,
        start: Vec2,
        end: Vec2,
        buff: f64,
        color: Rgba8,
        tip_len: f64,
        tip_width: f64,
        stroke_width: f64,
    ) -> Self {
        let full = end - start;
        let len = full.hypot();
        let dir = if len > 1e-9 {
            full * (1.0 / len)
        } else {
            Vec2::new(1.0, 0.0)
        };
        let origin = start + dir * buff;
        let tail = end - dir * buff;
        let body = tail - origin;
        let body_len = (body.hypot() - tip_len).max(0.0);

        let shaft_end = dir * body_len;
        let mut shaft = BezPath::new();
        shaft.move_to(Point::ORIGIN);
        shaft.line_to(shaft_end.to_point());

        let normal = Vec2::new(-dir.y, dir.x);
        let tip_base_a = shaft_end + normal * (tip_width / 2.0);
        let tip_base_b = shaft_end - normal * (tip_width / 2.0);
        let tip_point = dir * (body_len + tip_len);
        let mut tip = BezPath::new();
        tip.move_to(tip_base_a.to_point());
        tip.line_to(tip_point.to_point());
        tip.line_to(tip_base_b.to_point());
        tip.close_path();

        let mut s = Self::path_shape(name, tip, shaft, stroke_width, color, color);
        s.translate = Track::constant(origin);
        s
    }

    /// Pie segment of a disc (annular sector with zero inner radius).
    pub fn sector(
        name: impl Into<String>,
        radius: f64,
        start_angle: f64,
        sweep_angle: f64,
        color: Rgba8,
    ) -> Self {
        let seg = CircleSegment::new(Point::ORIGIN, radius, 0.0, start_angle, sweep_angle);
        let path = seg.into_path(PATH_TOLERANCE);
        Self::path_shape(name, path, BezPath::new(), 0.0, color, color)
    }

    /// Red X covering a square region of `half` half-extent, for crossing
    /// out a rejected team.
    pub fn cross(name: impl Into<String>, half: f64, color: Rgba8) -> Self {
        let mut path = BezPath::new();
        path.move_to(Point::new(-half, half));
        path.line_to(Point::new(half, -half));
        path.move_to(Point::new(-half, -half));
        path.line_to(Point::new(half, half));
        Self::path_shape(name, BezPath::new(), path, DEFAULT_STROKE_WIDTH * 1.5, color, color)
    }

    /// Radial burst of `count` short strokes between `r0` and `r1`, used by
    /// flash effects.
    pub fn burst(name: impl Into<String>, count: usize, r0: f64, r1: f64, color: Rgba8) -> Self {
        let mut path = BezPath::new();
        for i in 0..count {
            let a = std::f64::consts::TAU * (i as f64) / (count as f64);
            let dir = Vec2::new(a.cos(), a.sin());
            path.move_to((dir * r0).to_point());
            path.line_to((dir * r1).to_point());
        }
        Self::path_shape(name, BezPath::new(), path, DEFAULT_STROKE_WIDTH, color, color)
    }

    /// Shaped text block centered on the local origin.
    pub fn text(name: impl Into<String>, block: TextBlock, color: Rgba8) -> Self {
        Self::from_parts(name, Geometry::Text(block), color, color)
    }

    pub fn at(mut self, pos: Vec2) -> Self {
        self.translate = Track::constant(pos);
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = Track::constant(scale);
        self
    }

    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    pub fn with_fill(mut self, color: Rgba8) -> Self {
        self.fill = Track::constant(color);
        self
    }

    /// Current (latest-scripted) transform, used when cloning shapes and
    /// when computing group pivots at script-build time.
    pub fn latest_transform(&self) -> Transform2D {
        Transform2D {
            translate: self.translate.latest(),
            rotation_rad: self.rotation.latest(),
            scale: self.scale.latest(),
        }
    }

    pub fn transform_at(&self, frame: FrameIndex) -> Transform2D {
        Transform2D {
            translate: self.translate.sample(frame),
            rotation_rad: self.rotation.sample(frame),
            scale: self.scale.sample(frame),
        }
    }

    /// Bounding box of the raw geometry in local coordinates.
    pub fn local_bbox(&self) -> Option<Rect> {
        match &self.geometry {
            Geometry::Path(g) => {
                let fill = (!g.fill_path.elements().is_empty()).then(|| g.fill_path.bounding_box());
                let stroke =
                    (!g.stroke_path.elements().is_empty()).then(|| g.stroke_path.bounding_box());
                match (fill, stroke) {
                    (Some(a), Some(b)) => Some(a.union(b)),
                    (Some(a), None) => Some(a),
                    (None, Some(b)) => Some(b),
                    (None, None) => None,
                }
            }
            Geometry::Text(t) => {
                let (w, h) = (t.width_units(), t.height_units());
                Some(Rect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0))
            }
        }
    }

    /// Bounding box under the latest-scripted transform, in world units.
    pub fn latest_bbox(&self) -> Option<Rect> {
        let local = self.local_bbox()?;
        Some(self.latest_transform().to_affine().transform_rect_bbox(local))
    }

    /// Freeze all tracks at `frame` so later keys animate from that moment.
    pub fn hold_all(&mut self, frame: FrameIndex) {
        self.translate.hold(frame);
        self.rotation.hold(frame);
        self.scale.hold(frame);
        self.opacity.hold(frame);
        self.fill.hold(frame);
        self.stroke.hold(frame);
    }

    pub fn validate(&self, duration: FrameIndex) -> ExplainerResult<()> {
        self.translate.validate(duration)?;
        self.rotation.validate(duration)?;
        self.scale.validate(duration)?;
        self.opacity.validate(duration)?;
        self.fill.validate(duration)?;
        self.stroke.validate(duration)?;
        Ok(())
    }
}

/// Convenience for scripts: start invisible at `frame` (fade-ins key the
/// opacity up later).
pub(crate) fn spawn_hidden(shape: &mut Shape, frame: FrameIndex) {
    shape.born = frame;
    shape.opacity = Track::constant(0.0);
    shape.opacity.insert_key(frame, 0.0, Ease::Linear);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;

    #[test]
    fn line_origin_is_start_point() {
        let s = Shape::line("l", Vec2::new(1.0, 2.0), Vec2::new(1.0, 5.0), 0.05, color::WHITE);
        assert_eq!(s.translate.latest(), Vec2::new(1.0, 2.0));
        let Geometry::Path(g) = &s.geometry else {
            panic!("line is a path shape");
        };
        assert!(g.fill_path.elements().is_empty());
        assert!(!g.stroke_path.elements().is_empty());
    }

    #[test]
    fn arrow_respects_buffers() {
        let s = Shape::arrow("a", Vec2::ZERO, Vec2::new(4.0, 0.0), 0.2, color::GREEN);
        // Origin moved forward by the start buffer.
        assert_eq!(s.translate.latest(), Vec2::new(0.2, 0.0));
        let Geometry::Path(g) = &s.geometry else {
            panic!("arrow is a path shape");
        };
        // Tip is a filled triangle.
        assert!(!g.fill_path.elements().is_empty());
    }

    #[test]
    fn circle_fill_starts_transparent() {
        let s = Shape::circle("c", 1.5, color::BLUE);
        assert_eq!(s.fill.latest().a, 0);
        assert_eq!(s.stroke.latest(), color::BLUE);
    }

    #[test]
    fn burst_has_requested_ray_count() {
        let s = Shape::burst("f", 8, 0.2, 0.5, color::YELLOW);
        let Geometry::Path(g) = &s.geometry else {
            panic!("burst is a path shape");
        };
        let moves = g
            .stroke_path
            .elements()
            .iter()
            .filter(|e| matches!(e, kurbo::PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 8);
    }
}
