use rayon::prelude::*;

use crate::{
    core::{Canvas, FrameIndex, FrameRange},
    encode::{EncodeConfig, FfmpegEncoder},
    error::{ExplainerError, ExplainerResult},
    eval::Evaluator,
    render::{CpuRenderer, FrameRGBA},
    scene::Scene,
};

/// Evaluate and rasterize a single frame of a scene.
pub fn render_frame(
    scene: &Scene,
    frame: FrameIndex,
    renderer: &mut CpuRenderer,
) -> ExplainerResult<FrameRGBA> {
    let eval = Evaluator::eval_frame(scene, frame)?;
    renderer.render_frame(scene, &eval)
}

#[derive(Clone, Debug)]
pub struct RenderThreading {
    pub parallel: bool,
    pub chunk_size: usize,
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_rendered: u64,
    pub scenes: u64,
}

/// Render a frame range of one scene into memory.
#[tracing::instrument(skip(scene, threading), fields(scene = %scene.name))]
pub fn render_frames(
    scene: &Scene,
    range: FrameRange,
    canvas: Canvas,
    threading: &RenderThreading,
) -> ExplainerResult<Vec<FrameRGBA>> {
    if range.is_empty() {
        return Err(ExplainerError::validation("render range must be non-empty"));
    }
    if range.end.0 > scene.duration.0 {
        return Err(ExplainerError::validation(
            "render range must be within scene duration",
        ));
    }

    if !threading.parallel {
        let mut renderer = CpuRenderer::new(canvas)?;
        let mut out = Vec::with_capacity(range.len_frames() as usize);
        for f in range.start.0..range.end.0 {
            out.push(render_frame(scene, FrameIndex(f), &mut renderer)?);
        }
        return Ok(out);
    }

    let pool = build_thread_pool(threading.threads)?;
    let chunk_size = normalized_chunk_size(threading.chunk_size);
    let mut out = Vec::with_capacity(range.len_frames() as usize);
    let mut chunk_start = range.start.0;
    while chunk_start < range.end.0 {
        let chunk_end = (chunk_start + chunk_size).min(range.end.0);
        out.append(&mut render_chunk_parallel(
            scene,
            chunk_start..chunk_end,
            canvas,
            &pool,
        )?);
        chunk_start = chunk_end;
    }
    Ok(out)
}

/// Options for [`render_scenes_to_mp4`].
#[derive(Clone, Debug)]
pub struct RenderToMp4Opts {
    pub overwrite: bool,
    pub threading: RenderThreading,
}

impl Default for RenderToMp4Opts {
    fn default() -> Self {
        Self {
            overwrite: true,
            threading: RenderThreading::default(),
        }
    }
}

/// Render a sequence of scenes back to back into one MP4 via the system
/// `ffmpeg` binary. All scenes must share the same integer frame rate.
#[tracing::instrument(skip(scenes, opts), fields(scenes = scenes.len()))]
pub fn render_scenes_to_mp4(
    scenes: &[Scene],
    canvas: Canvas,
    out_path: impl Into<std::path::PathBuf> + std::fmt::Debug,
    opts: &RenderToMp4Opts,
) -> ExplainerResult<RenderStats> {
    if scenes.is_empty() {
        return Err(ExplainerError::validation(
            "at least one scene is required for MP4 output",
        ));
    }
    for scene in scenes {
        scene.validate()?;
    }

    let fps = scenes[0].fps;
    if scenes.iter().any(|s| s.fps != fps) {
        return Err(ExplainerError::validation(
            "all scenes must share one frame rate for MP4 output",
        ));
    }
    if fps.den != 1 {
        return Err(ExplainerError::validation(
            "MP4 output currently requires integer fps (fps.den == 1)",
        ));
    }

    let cfg = EncodeConfig {
        width: canvas.width,
        height: canvas.height,
        fps: fps.num,
        out_path: out_path.into(),
        overwrite: opts.overwrite,
    };
    let mut enc = FfmpegEncoder::new(cfg)?;
    let mut stats = RenderStats::default();

    let chunk_size = normalized_chunk_size(opts.threading.chunk_size);
    let mut exec = if opts.threading.parallel {
        ChunkExec::Parallel(build_thread_pool(opts.threading.threads)?)
    } else {
        ChunkExec::Sequential(CpuRenderer::new(canvas)?)
    };

    for scene in scenes {
        tracing::info!(scene = %scene.name, frames = scene.duration.0, "encoding scene");
        let mut chunk_start = 0u64;
        while chunk_start < scene.duration.0 {
            let chunk_end = (chunk_start + chunk_size).min(scene.duration.0);
            let frames = match &mut exec {
                ChunkExec::Parallel(pool) => {
                    render_chunk_parallel(scene, chunk_start..chunk_end, canvas, pool)?
                }
                ChunkExec::Sequential(renderer) => {
                    let mut out = Vec::with_capacity((chunk_end - chunk_start) as usize);
                    for f in chunk_start..chunk_end {
                        out.push(render_frame(scene, FrameIndex(f), renderer)?);
                    }
                    out
                }
            };
            for frame in &frames {
                enc.encode_frame(frame)?;
            }
            stats.frames_rendered += frames.len() as u64;
            chunk_start = chunk_end;
        }
        stats.scenes += 1;
    }

    enc.finish()?;
    Ok(stats)
}

enum ChunkExec {
    Parallel(rayon::ThreadPool),
    Sequential(CpuRenderer),
}

fn render_chunk_parallel(
    scene: &Scene,
    frames: std::ops::Range<u64>,
    canvas: Canvas,
    pool: &rayon::ThreadPool,
) -> ExplainerResult<Vec<FrameRGBA>> {
    let rendered = pool.install(|| {
        frames
            .collect::<Vec<_>>()
            .par_iter()
            .map_init(
                || CpuRenderer::new(canvas),
                |worker, &f| -> ExplainerResult<FrameRGBA> {
                    let renderer = match worker {
                        Ok(r) => r,
                        Err(e) => {
                            return Err(ExplainerError::render(format!(
                                "worker renderer init failed: {e}"
                            )));
                        }
                    };
                    render_frame(scene, FrameIndex(f), renderer)
                },
            )
            .collect::<Vec<_>>()
    });

    rendered.into_iter().collect()
}

fn build_thread_pool(threads: Option<usize>) -> ExplainerResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(ExplainerError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ExplainerError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 { 1 } else { chunk_size as u64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::BLUE, core::Fps, scene::SceneBuilder, shape::Shape};

    fn small_scene() -> Scene {
        let mut sb = SceneBuilder::new("pipeline-test", Fps::new(10, 1).unwrap());
        let d = sb.spawn(Shape::dot("d", 0.3, BLUE));
        sb.step(0.5, |s| s.shift(d, kurbo::Vec2::new(1.0, 0.0)));
        sb.build().unwrap()
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let scene = small_scene();
        let canvas = Canvas {
            width: 32,
            height: 32,
        };
        let range = FrameRange::new(FrameIndex(0), scene.duration).unwrap();
        let seq = render_frames(&scene, range, canvas, &RenderThreading::default()).unwrap();
        let par = render_frames(
            &scene,
            range,
            canvas,
            &RenderThreading {
                parallel: true,
                chunk_size: 2,
                threads: Some(2),
            },
        )
        .unwrap();
        assert_eq!(seq.len(), par.len());
        for (a, b) in seq.iter().zip(&par) {
            assert_eq!(a.data, b.data);
        }
    }

    #[test]
    fn range_past_scene_end_is_rejected() {
        let scene = small_scene();
        let canvas = Canvas {
            width: 32,
            height: 32,
        };
        let range = FrameRange::new(FrameIndex(0), FrameIndex(scene.duration.0 + 1)).unwrap();
        assert!(render_frames(&scene, range, canvas, &RenderThreading::default()).is_err());
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(build_thread_pool(Some(0)).is_err());
    }
}
