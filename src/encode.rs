use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    color::{BACKGROUND, Rgba8},
    error::{ExplainerError, ExplainerResult},
    render::FrameRGBA,
};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> ExplainerResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ExplainerError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(ExplainerError::validation("encode fps must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p subsamples chroma 2x2, so odd dimensions cannot encode.
            return Err(ExplainerError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

pub fn default_mp4_config(
    out_path: impl Into<PathBuf>,
    width: u32,
    height: u32,
    fps: u32,
) -> EncodeConfig {
    EncodeConfig {
        width,
        height,
        fps,
        out_path: out_path.into(),
        overwrite: true,
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ExplainerResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams raw RGBA frames into a system `ffmpeg` child process that
/// writes an H.264 MP4. Using the binary instead of linking FFmpeg
/// keeps the build free of native dev headers.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    bg_rgba: [u8; 4],
    child: Child,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> ExplainerResult<Self> {
        Self::with_background(cfg, BACKGROUND)
    }

    pub fn with_background(cfg: EncodeConfig, bg: Rgba8) -> ExplainerResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(ExplainerError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(ExplainerError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ExplainerError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExplainerError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            scratch: vec![0u8; (cfg.width * cfg.height * 4) as usize],
            cfg,
            bg_rgba: [bg.r, bg.g, bg.b, bg.a],
            child,
            stdin: Some(stdin),
        })
    }

    pub fn encode_frame(&mut self, frame: &FrameRGBA) -> ExplainerResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(ExplainerError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }

        if frame.data.len() != self.scratch.len() {
            return Err(ExplainerError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.bg_rgba,
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ExplainerError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            ExplainerError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    pub fn finish(mut self) -> ExplainerResult<()> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            ExplainerError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExplainerError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Composite a rendered frame over `bg` into a fresh opaque RGBA buffer,
/// for still-image output.
pub fn frame_to_opaque_rgba8(frame: &FrameRGBA, bg: Rgba8) -> ExplainerResult<Vec<u8>> {
    let mut out = vec![0u8; frame.data.len()];
    flatten_to_opaque_rgba8(
        &mut out,
        &frame.data,
        frame.premultiplied,
        [bg.r, bg.g, bg.b, bg.a],
    )?;
    Ok(out)
}

fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> ExplainerResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ExplainerError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            d[3] = 255;
            continue;
        }

        let inv = 255u16 - a;

        let (r, g, b) = if src_is_premul {
            (
                u16::from(s[0]) + mul_div255(bg_r, inv),
                u16::from(s[1]) + mul_div255(bg_g, inv),
                u16::from(s[2]) + mul_div255(bg_b, inv),
            )
        } else {
            (
                mul_div255(u16::from(s[0]), a) + mul_div255(bg_r, inv),
                mul_div255(u16::from(s[1]), a) + mul_div255(bg_g, inv),
                mul_div255(u16::from(s[2]), a) + mul_div255(bg_b, inv),
            )
        };

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(width: u32, height: u32, fps: u32) -> EncodeConfig {
        EncodeConfig {
            width,
            height,
            fps,
            out_path: PathBuf::from("target/out.mp4"),
            overwrite: true,
        }
    }

    #[test]
    fn config_validation_catches_bad_values() {
        assert!(cfg(0, 10, 30).validate().is_err());
        assert!(cfg(11, 10, 30).validate().is_err());
        assert!(cfg(10, 11, 30).validate().is_err());
        assert!(cfg(10, 10, 0).validate().is_err());
        assert!(cfg(1920, 1080, 60).validate().is_ok());
    }

    #[test]
    fn flatten_premul_over_black_produces_expected_rgb() {
        let src = vec![128u8, 0u8, 0u8, 128u8];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, true, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
    }

    #[test]
    fn flatten_straight_over_background_blends() {
        let src = vec![255u8, 0u8, 0u8, 128u8];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, false, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
    }
}
