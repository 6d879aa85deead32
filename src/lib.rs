//! Scripted 2D animation generator for the Tangled Program Graphs
//! explainer video.
//!
//! Scenes are built by [`scenes`] scripts on a keyframe timeline
//! ([`scene::SceneBuilder`]), evaluated per frame ([`eval`]), rasterized on
//! the CPU via vello_cpu ([`render`]), and piped to the system `ffmpeg` as
//! raw RGBA for MP4 output ([`encode`], [`pipeline`]).

#![forbid(unsafe_code)]

pub mod color;
pub mod core;
pub mod ease;
pub mod encode;
pub mod error;
pub mod eval;
pub mod graph;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod scenes;
pub mod shape;
pub mod text;
pub mod track;

pub use color::Rgba8;
pub use core::{Canvas, Fps, FrameIndex, FrameRange, Transform2D};
pub use ease::Ease;
pub use error::{ExplainerError, ExplainerResult};
pub use scene::{Scene, SceneBuilder, ShapeId};
pub use shape::Shape;
