use std::sync::Arc;

use crate::error::{ExplainerError, ExplainerResult};

/// Text is shaped in pixel space at this reference density (1080p: 135 px
/// per world unit) and scaled back into world units, so font sizes read as
/// pixels at 1080p regardless of the render resolution.
pub const TEXT_REF_PX_PER_UNIT: f64 = 135.0;

/// Per-glyph brush. Glyph color is resolved from the shape's fill track at
/// render time, so the brush carries no state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextBrush;

/// A shaped, measured text block ready for rendering.
#[derive(Clone, serde::Serialize)]
pub struct TextBlock {
    pub text: String,
    pub size_px: f32,
    pub width_px: f32,
    pub height_px: f32,
    #[serde(skip)]
    pub layout: Arc<parley::Layout<TextBrush>>,
    #[serde(skip)]
    pub font_bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for TextBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBlock")
            .field("text", &self.text)
            .field("size_px", &self.size_px)
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish_non_exhaustive()
    }
}

impl TextBlock {
    pub fn width_units(&self) -> f64 {
        f64::from(self.width_px) / TEXT_REF_PX_PER_UNIT
    }

    pub fn height_units(&self) -> f64 {
        f64::from(self.height_px) / TEXT_REF_PX_PER_UNIT
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    font_bytes: Arc<Vec<u8>>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font_bytes` once; every layout built by this engine uses
    /// the first family found in them.
    pub fn new(font_bytes: Vec<u8>) -> ExplainerResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ExplainerError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ExplainerError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            font_bytes: Arc::new(font_bytes),
            family_name,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape and measure a single-style text block.
    pub fn layout(&mut self, text: &str, size_px: f32) -> ExplainerResult<TextBlock> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ExplainerError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);

        Ok(TextBlock {
            text: text.to_string(),
            size_px,
            width_px: layout.width(),
            height_px: layout.height(),
            layout: Arc::new(layout),
            font_bytes: self.font_bytes.clone(),
        })
    }
}

/// Locations probed when the CLI is not given an explicit `--font`.
pub const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// Load font bytes from an explicit path, or probe the search list.
pub fn load_font_bytes(explicit: Option<&std::path::Path>) -> ExplainerResult<Vec<u8>> {
    use anyhow::Context as _;

    if let Some(path) = explicit {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font '{}'", path.display()))?;
        return Ok(bytes);
    }

    for candidate in FONT_SEARCH_PATHS {
        if let Ok(bytes) = std::fs::read(candidate) {
            return Ok(bytes);
        }
    }

    Err(ExplainerError::validation(
        "no usable font found; pass --font <path-to-ttf>",
    ))
}
