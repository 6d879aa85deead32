use kurbo::{Rect, Vec2};

use crate::{
    color::Rgba8,
    core::{FrameIndex, Fps},
    ease::Ease,
    error::{ExplainerError, ExplainerResult},
    shape::{Shape, spawn_hidden},
    track::Track,
};

/// Index of a shape within its scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ShapeId(pub usize);

/// One self-contained, linearly scripted animation sequence.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Scene {
    pub name: String,
    pub fps: Fps,
    /// Total frames; the timeline cursor position when the script ended.
    pub duration: FrameIndex,
    pub shapes: Vec<Shape>,
    pub seed: u64,
}

impl Scene {
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.duration.0)
    }

    pub fn validate(&self) -> ExplainerResult<()> {
        if self.name.trim().is_empty() {
            return Err(ExplainerError::validation("scene name must be non-empty"));
        }
        if self.duration.0 == 0 {
            return Err(ExplainerError::validation("scene duration must be > 0"));
        }
        for shape in &self.shapes {
            if shape.name.trim().is_empty() {
                return Err(ExplainerError::validation("shape name must be non-empty"));
            }
            if shape.born.0 > self.duration.0 {
                return Err(ExplainerError::validation(format!(
                    "shape '{}' is born after the scene ends",
                    shape.name
                )));
            }
            shape.validate(self.duration).map_err(|e| {
                ExplainerError::validation(format!("shape '{}': {e}", shape.name))
            })?;
        }
        Ok(())
    }
}

/// Builds a [`Scene`] by advancing a timeline cursor through timed steps,
/// Manim-fashion: spawn shapes, then `step(secs, |s| ...)` to animate and
/// `wait(secs)` to hold.
pub struct SceneBuilder {
    name: String,
    fps: Fps,
    seed: u64,
    shapes: Vec<Shape>,
    cursor: FrameIndex,
}

impl SceneBuilder {
    pub fn new(name: impl Into<String>, fps: Fps) -> Self {
        Self {
            name: name.into(),
            fps,
            seed: 0,
            shapes: Vec::new(),
            cursor: FrameIndex(0),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn cursor(&self) -> FrameIndex {
        self.cursor
    }

    fn frames(&self, secs: f64) -> u64 {
        self.fps.secs_to_frames(secs)
    }

    /// Add a shape, visible from the current cursor on.
    pub fn spawn(&mut self, mut shape: Shape) -> ShapeId {
        shape.born = self.cursor;
        self.shapes.push(shape);
        ShapeId(self.shapes.len() - 1)
    }

    /// Add a shape that stays invisible until something fades it in.
    pub fn spawn_hidden(&mut self, mut shape: Shape) -> ShapeId {
        spawn_hidden(&mut shape, self.cursor);
        self.shapes.push(shape);
        ShapeId(self.shapes.len() - 1)
    }

    /// Clone `src` at its latest-scripted state into a fresh shape born at
    /// the cursor. Track histories are not copied, only current values.
    pub fn spawn_copy(&mut self, src: ShapeId, name: impl Into<String>) -> ShapeId {
        let src = &self.shapes[src.0];
        let t = src.latest_transform();
        let mut copy = Shape {
            name: name.into(),
            geometry: src.geometry.clone(),
            born: self.cursor,
            z: src.z,
            translate: Track::constant(t.translate),
            rotation: Track::constant(t.rotation_rad),
            scale: Track::constant(t.scale),
            opacity: Track::constant(src.opacity.latest()),
            fill: Track::constant(src.fill.latest()),
            stroke: Track::constant(src.stroke.latest()),
        };
        copy.hold_all(self.cursor);
        self.shapes.push(copy);
        ShapeId(self.shapes.len() - 1)
    }

    pub fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.0]
    }

    /// Reposition a shape instantly at the cursor (no animation window).
    /// Meant for freshly spawned copies before they are faded in.
    pub fn offset_now(&mut self, id: ShapeId, delta: Vec2) {
        let shape = &mut self.shapes[id.0];
        let target = shape.translate.latest() + delta;
        shape.translate.insert_key(self.cursor, target, Ease::Linear);
    }

    /// Make a shape invisible from the cursor on, for a later fade-in.
    pub fn hide_now(&mut self, id: ShapeId) {
        let shape = &mut self.shapes[id.0];
        shape.opacity = Track::constant(0.0);
        shape.opacity.insert_key(self.cursor, 0.0, Ease::Linear);
    }

    /// Recolor a shape instantly at the cursor.
    pub fn restyle_now(&mut self, id: ShapeId, fill: Rgba8, stroke: Rgba8) {
        let shape = &mut self.shapes[id.0];
        shape.fill.insert_key(self.cursor, fill, Ease::Linear);
        shape.stroke.insert_key(self.cursor, stroke, Ease::Linear);
    }

    /// Union bounding box of a group at its latest-scripted state.
    pub fn group_bbox(&self, ids: &[ShapeId]) -> Option<Rect> {
        let mut acc: Option<Rect> = None;
        for &id in ids {
            if let Some(b) = self.shapes[id.0].latest_bbox() {
                acc = Some(match acc {
                    Some(a) => a.union(b),
                    None => b,
                });
            }
        }
        acc
    }

    /// Run a timed step: every op recorded by `f` plays inside the
    /// `[cursor, cursor + secs)` window, then the cursor advances.
    pub fn step<F: FnOnce(&mut Step<'_>)>(&mut self, secs: f64, f: F) {
        let len = self.frames(secs).max(1);
        let mut step = Step {
            shapes: &mut self.shapes,
            fps: self.fps,
            start: self.cursor,
            len,
            seed: self.seed,
        };
        f(&mut step);
        self.cursor = FrameIndex(self.cursor.0 + len);
    }

    /// Hold everything as-is for `secs`.
    pub fn wait(&mut self, secs: f64) {
        self.cursor = FrameIndex(self.cursor.0 + self.frames(secs));
    }

    pub fn build(self) -> ExplainerResult<Scene> {
        let scene = Scene {
            name: self.name,
            fps: self.fps,
            duration: self.cursor,
            shapes: self.shapes,
            seed: self.seed,
        };
        scene.validate()?;
        Ok(scene)
    }
}

/// Animation ops recorded against one step's time window. `during` narrows
/// the window for staggered sub-animations (Manim `Succession`/`lag_ratio`).
pub struct Step<'a> {
    shapes: &'a mut Vec<Shape>,
    fps: Fps,
    start: FrameIndex,
    len: u64,
    seed: u64,
}

impl Step<'_> {
    fn from(&self) -> FrameIndex {
        self.start
    }

    fn to(&self) -> FrameIndex {
        FrameIndex(self.start.0 + self.len)
    }

    /// Record ops over a sub-window `[offset, offset + secs)` of this step.
    pub fn during<F: FnOnce(&mut Step<'_>)>(&mut self, offset_secs: f64, secs: f64, f: F) {
        let offset = self.fps.secs_to_frames(offset_secs).min(self.len);
        let len = self.fps.secs_to_frames(secs).max(1).min(self.len - offset.min(self.len));
        let mut sub = Step {
            shapes: self.shapes,
            fps: self.fps,
            start: FrameIndex(self.start.0 + offset),
            len: len.max(1),
            seed: self.seed,
        };
        f(&mut sub);
    }

    // --- opacity ---

    pub fn fade_in(&mut self, id: ShapeId) {
        self.fade_to(id, 1.0);
    }

    pub fn fade_out(&mut self, id: ShapeId) {
        self.fade_to(id, 0.0);
    }

    pub fn fade_to(&mut self, id: ShapeId, opacity: f64) {
        let (from, to) = (self.from(), self.to());
        self.shapes[id.0]
            .opacity
            .animate(from, to, opacity, Ease::InOutCubic);
    }

    // --- motion ---

    pub fn move_to(&mut self, id: ShapeId, pos: Vec2) {
        let (from, to) = (self.from(), self.to());
        self.shapes[id.0]
            .translate
            .animate(from, to, pos, Ease::InOutCubic);
    }

    pub fn shift(&mut self, id: ShapeId, delta: Vec2) {
        self.shift_with(id, delta, Ease::InOutCubic);
    }

    pub fn shift_with(&mut self, id: ShapeId, delta: Vec2, ease: Ease) {
        let (from, to) = (self.from(), self.to());
        let target = self.shapes[id.0].translate.latest() + delta;
        self.shapes[id.0].translate.animate(from, to, target, ease);
    }

    pub fn rotate_by(&mut self, id: ShapeId, angle_rad: f64) {
        let target = self.shapes[id.0].rotation.latest() + angle_rad;
        self.rotate_to(id, target);
    }

    pub fn rotate_to(&mut self, id: ShapeId, angle_rad: f64) {
        let (from, to) = (self.from(), self.to());
        self.shapes[id.0]
            .rotation
            .animate(from, to, angle_rad, Ease::InOutCubic);
    }

    /// Multiply the shape's scale about its own local origin.
    pub fn scale_by(&mut self, id: ShapeId, factor: f64) {
        let (from, to) = (self.from(), self.to());
        let target = self.shapes[id.0].scale.latest() * factor;
        self.shapes[id.0]
            .scale
            .animate(from, to, target, Ease::InOutCubic);
    }

    /// Grow a shape out of its local origin, Manim `GrowArrow` style. Only
    /// sensible for shapes spawned at this step's start frame.
    pub fn grow(&mut self, id: ShapeId) {
        let (from, to) = (self.from(), self.to());
        let shape = &mut self.shapes[id.0];
        shape.scale.insert_key(from, Vec2::ZERO, Ease::Linear);
        shape
            .scale
            .animate(from, to, Vec2::new(1.0, 1.0), Ease::OutCubic);
    }

    /// Set the vertical scale absolutely (bars growing to a target height).
    pub fn scale_y_to(&mut self, id: ShapeId, sy: f64) {
        let (from, to) = (self.from(), self.to());
        let sx = self.shapes[id.0].scale.latest().x;
        self.shapes[id.0]
            .scale
            .animate(from, to, Vec2::new(sx, sy), Ease::InOutCubic);
    }

    /// Follow a polyline through `points` with eased arclength progress,
    /// compiled to one key per frame.
    pub fn follow_path(&mut self, id: ShapeId, points: &[Vec2], ease: Ease) {
        if points.len() < 2 {
            return;
        }
        let lengths: Vec<f64> = points.windows(2).map(|w| (w[1] - w[0]).hypot()).collect();
        let total: f64 = lengths.iter().sum();
        if total <= 0.0 {
            return;
        }

        let from = self.from();
        self.shapes[id.0].translate.hold(from);
        for i in 0..=self.len {
            let t = ease.apply(i as f64 / self.len as f64);
            let mut dist = t * total;
            let mut pos = points[0];
            for (seg, &seg_len) in lengths.iter().enumerate() {
                if dist <= seg_len || seg == lengths.len() - 1 {
                    let u = if seg_len > 0.0 {
                        (dist / seg_len).clamp(0.0, 1.0)
                    } else {
                        1.0
                    };
                    pos = points[seg] + (points[seg + 1] - points[seg]) * u;
                    break;
                }
                dist -= seg_len;
            }
            self.shapes[id.0]
                .translate
                .insert_key(FrameIndex(from.0 + i), pos, Ease::Linear);
        }
    }

    // --- color ---

    pub fn set_fill(&mut self, id: ShapeId, color: Rgba8) {
        let (from, to) = (self.from(), self.to());
        self.shapes[id.0]
            .fill
            .animate(from, to, color, Ease::InOutCubic);
    }

    pub fn set_stroke(&mut self, id: ShapeId, color: Rgba8) {
        let (from, to) = (self.from(), self.to());
        self.shapes[id.0]
            .stroke
            .animate(from, to, color, Ease::InOutCubic);
    }

    pub fn set_color(&mut self, id: ShapeId, color: Rgba8) {
        self.set_fill(id, color);
        self.set_stroke(id, color);
    }

    /// Brief attention pulse: scale up and recolor for the first half of the
    /// window, then settle back.
    pub fn indicate(&mut self, id: ShapeId, color: Rgba8) {
        let half = self.fps.frames_to_secs(self.len) / 2.0;
        let base_scale = self.shapes[id.0].scale.latest();
        let base_stroke = self.shapes[id.0].stroke.latest();
        self.during(0.0, half, |s| {
            s.scale_by(id, 1.2);
            s.set_stroke(id, color);
        });
        self.during(half, half, |s| {
            let (from, to) = (s.from(), s.to());
            s.shapes[id.0]
                .scale
                .animate(from, to, base_scale, Ease::InOutCubic);
            s.shapes[id.0]
                .stroke
                .animate(from, to, base_stroke, Ease::InOutCubic);
        });
    }

    /// Manim-style flash: a radial burst spawned at `center` that expands
    /// and fades out over the window.
    pub fn flash(&mut self, name: impl Into<String>, center: Vec2, color: Rgba8, radius: f64) {
        let (from, to) = (self.from(), self.to());
        let mut burst = Shape::burst(name, 12, radius * 0.6, radius, color).at(center);
        spawn_hidden(&mut burst, from);
        burst.opacity.insert_key(from, 1.0, Ease::Linear);
        burst.opacity.animate(from, to, 0.0, Ease::OutQuad);
        burst
            .scale
            .animate(from, to, Vec2::new(1.4, 1.4), Ease::OutQuad);
        self.shapes.push(burst);
    }

    /// Manim `Transform` rendered as a crossfade.
    pub fn crossfade(&mut self, old: &[ShapeId], new: &[ShapeId]) {
        for &id in old {
            self.fade_out(id);
        }
        for &id in new {
            self.fade_in(id);
        }
    }

    // --- groups ---

    /// Union bounding box of a group at its latest-scripted state.
    pub fn group_bbox(&self, ids: &[ShapeId]) -> Option<Rect> {
        let mut acc: Option<Rect> = None;
        for &id in ids {
            if let Some(b) = self.shapes[id.0].latest_bbox() {
                acc = Some(match acc {
                    Some(a) => a.union(b),
                    None => b,
                });
            }
        }
        acc
    }

    /// Move a group so its bounding-box center lands on `target`.
    pub fn group_move_to(&mut self, ids: &[ShapeId], target: Vec2) {
        let Some(bbox) = self.group_bbox(ids) else {
            return;
        };
        let delta = target - bbox.center().to_vec2();
        for &id in ids {
            self.shift(id, delta);
        }
    }

    /// Scale a group about a world-space pivot: member translations move
    /// toward/away from the pivot and member scales multiply.
    pub fn group_scale_about(&mut self, ids: &[ShapeId], factor: f64, pivot: Vec2) {
        let (from, to) = (self.from(), self.to());
        for &id in ids {
            let shape = &mut self.shapes[id.0];
            let p = shape.translate.latest();
            let target = pivot + (p - pivot) * factor;
            shape.translate.animate(from, to, target, Ease::InOutCubic);
            let target_scale = shape.scale.latest() * factor;
            shape.scale.animate(from, to, target_scale, Ease::InOutCubic);
        }
    }

    /// Scale a group about its own center while moving that center to
    /// `target`, in one window (Manim `.scale(k).move_to(p)` chain).
    pub fn group_scale_move_to(&mut self, ids: &[ShapeId], factor: f64, target: Vec2) {
        let Some(bbox) = self.group_bbox(ids) else {
            return;
        };
        let center = bbox.center().to_vec2();
        let (from, to) = (self.from(), self.to());
        for &id in ids {
            let shape = &mut self.shapes[id.0];
            let p = shape.translate.latest();
            shape.translate.animate(
                from,
                to,
                target + (p - center) * factor,
                Ease::InOutCubic,
            );
            let target_scale = shape.scale.latest() * factor;
            shape.scale.animate(from, to, target_scale, Ease::InOutCubic);
        }
    }

    /// Scale a group about its own bounding-box center.
    pub fn group_scale(&mut self, ids: &[ShapeId], factor: f64) {
        let Some(bbox) = self.group_bbox(ids) else {
            return;
        };
        self.group_scale_about(ids, factor, bbox.center().to_vec2());
    }

    pub fn group_fade_in(&mut self, ids: &[ShapeId]) {
        for &id in ids {
            self.fade_in(id);
        }
    }

    pub fn group_fade_out(&mut self, ids: &[ShapeId]) {
        for &id in ids {
            self.fade_out(id);
        }
    }

    /// Deterministic unit-interval value for "random" scripted choices.
    pub fn unit_hash(&self, tag: &str) -> f64 {
        crate::core::hash_unit_f64(crate::core::stable_hash64(self.seed, tag))
    }

    /// Raw translate-track access for ops the verbs above don't cover
    /// (dense updater-style keys).
    pub fn translate_track(&mut self, id: ShapeId) -> &mut Track<Vec2> {
        &mut self.shapes[id.0].translate
    }

    pub fn frame_at(&self, offset_secs: f64) -> FrameIndex {
        FrameIndex(self.start.0 + self.fps.secs_to_frames(offset_secs))
    }

    pub fn len_frames(&self) -> u64 {
        self.len
    }

    pub fn len_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.len)
    }
}
