use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    color::{BACKGROUND, Rgba8},
    core::{Affine, BezPath, Canvas, Point},
    error::{ExplainerError, ExplainerResult},
    eval::{DrawNode, EvaluatedFrame},
    scene::Scene,
    shape::{Geometry, PathGeometry},
    text::{TEXT_REF_PX_PER_UNIT, TextBlock},
};

/// One rendered frame, straight off the rasterizer.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Rasterizes evaluated frames onto a reusable pixmap via vello_cpu.
pub struct CpuRenderer {
    canvas: Canvas,
    pixmap: vello_cpu::Pixmap,
    font_cache: HashMap<usize, vello_cpu::peniko::FontData>,
}

impl CpuRenderer {
    pub fn new(canvas: Canvas) -> ExplainerResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ExplainerError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ExplainerError::render("canvas height exceeds u16"))?;
        Ok(Self {
            canvas,
            pixmap: vello_cpu::Pixmap::new(width, height),
            font_cache: HashMap::new(),
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    #[tracing::instrument(skip(self, scene, eval), fields(frame = eval.frame.0))]
    pub fn render_frame(
        &mut self,
        scene: &Scene,
        eval: &EvaluatedFrame,
    ) -> ExplainerResult<FrameRGBA> {
        let mut ctx =
            vello_cpu::RenderContext::new(self.pixmap.width(), self.pixmap.height());
        let to_screen = self.canvas.world_to_screen();

        // render_to_pixmap rewrites every pixel, so the background must be a
        // draw op of its own rather than a pre-cleared buffer.
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color_to_cpu(BACKGROUND));
        ctx.fill_path(&canvas_rect(self.pixmap.width(), self.pixmap.height()));

        for node in &eval.nodes {
            if node.opacity <= 0.0 {
                continue;
            }
            let shape = scene.shapes.get(node.shape.0).ok_or_else(|| {
                ExplainerError::render(format!("draw node references shape {}", node.shape.0))
            })?;
            match &shape.geometry {
                Geometry::Path(g) => draw_path(&mut ctx, to_screen, node, g),
                Geometry::Text(t) => {
                    let font = self.font_for(&t.font_bytes);
                    draw_text(&mut ctx, to_screen, node, t, &font);
                }
            }
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn font_for(&mut self, bytes: &Arc<Vec<u8>>) -> vello_cpu::peniko::FontData {
        let key = Arc::as_ptr(bytes) as usize;
        self.font_cache
            .entry(key)
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                    0,
                )
            })
            .clone()
    }
}

fn draw_path(
    ctx: &mut vello_cpu::RenderContext,
    to_screen: Affine,
    node: &DrawNode,
    g: &PathGeometry,
) {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(to_screen * node.transform));

    if node.opacity < 1.0 {
        ctx.push_opacity_layer(node.opacity as f32);
    }

    if node.fill.a > 0 && !g.fill_path.is_empty() {
        ctx.set_paint(color_to_cpu(node.fill));
        ctx.fill_path(&bezpath_to_cpu(&g.fill_path));
    }
    if node.stroke.a > 0 && g.stroke_width > 0.0 && !g.stroke_path.is_empty() {
        ctx.set_paint(color_to_cpu(node.stroke));
        // Width in local units; the transform scales it to pixels.
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(g.stroke_width));
        ctx.stroke_path(&bezpath_to_cpu(&g.stroke_path));
    }

    if node.opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    to_screen: Affine,
    node: &DrawNode,
    block: &TextBlock,
    font: &vello_cpu::peniko::FontData,
) {
    // Layout is in pixels at reference density, y-down, origin top-left.
    // Flip to y-up world units and center it on the shape origin.
    let unit = 1.0 / TEXT_REF_PX_PER_UNIT;
    let local = Affine::scale_non_uniform(unit, -unit)
        * Affine::translate((-f64::from(block.width_px) / 2.0, -f64::from(block.height_px) / 2.0));
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(to_screen * node.transform * local));

    if node.opacity < 1.0 {
        ctx.push_opacity_layer(node.opacity as f32);
    }
    ctx.set_paint(color_to_cpu(node.fill));

    for line in block.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }

    if node.opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn canvas_rect(width: u16, height: u16) -> vello_cpu::kurbo::BezPath {
    let (w, h) = (f64::from(width), f64::from(height));
    let mut path = vello_cpu::kurbo::BezPath::new();
    path.move_to((0.0, 0.0));
    path.line_to((w, 0.0));
    path.line_to((w, h));
    path.line_to((0.0, h));
    path.close_path();
    path
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        color::WHITE,
        core::{FrameIndex, Fps},
        eval::Evaluator,
        scene::SceneBuilder,
        shape::Shape,
    };

    fn dot_scene() -> Scene {
        let mut sb = SceneBuilder::new("render-test", Fps::new(30, 1).unwrap());
        sb.spawn(Shape::dot("d", 0.5, WHITE));
        sb.wait(1.0);
        sb.build().unwrap()
    }

    fn pixel(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * frame.width + x) * 4) as usize;
        frame.data[i..i + 4].try_into().unwrap()
    }

    #[test]
    fn background_fills_empty_regions() {
        let scene = dot_scene();
        let canvas = Canvas {
            width: 64,
            height: 64,
        };
        let mut renderer = CpuRenderer::new(canvas).unwrap();
        let eval = Evaluator::eval_frame(&scene, FrameIndex(0)).unwrap();
        let frame = renderer.render_frame(&scene, &eval).unwrap();
        assert_eq!(frame.data.len(), 64 * 64 * 4);
        // Opaque background survives the premultiplied readback unchanged.
        assert_eq!(
            pixel(&frame, 1, 1),
            [BACKGROUND.r, BACKGROUND.g, BACKGROUND.b, 0xFF]
        );
        // Corners too: no region escapes the background draw op.
        assert_eq!(
            pixel(&frame, 63, 63),
            [BACKGROUND.r, BACKGROUND.g, BACKGROUND.b, 0xFF]
        );
    }

    #[test]
    fn centered_dot_covers_the_canvas_center() {
        let scene = dot_scene();
        let canvas = Canvas {
            width: 64,
            height: 64,
        };
        let mut renderer = CpuRenderer::new(canvas).unwrap();
        let eval = Evaluator::eval_frame(&scene, FrameIndex(0)).unwrap();
        let frame = renderer.render_frame(&scene, &eval).unwrap();
        let center = pixel(&frame, 32, 32);
        assert!(center[0] > 200 && center[1] > 200 && center[2] > 200);
    }

    #[test]
    fn renders_are_deterministic() {
        let scene = dot_scene();
        let canvas = Canvas {
            width: 48,
            height: 48,
        };
        let eval = Evaluator::eval_frame(&scene, FrameIndex(5)).unwrap();
        let a = CpuRenderer::new(canvas)
            .unwrap()
            .render_frame(&scene, &eval)
            .unwrap();
        let b = CpuRenderer::new(canvas)
            .unwrap()
            .render_frame(&scene, &eval)
            .unwrap();
        assert_eq!(a.data, b.data);
    }
}
