//! The typesetting engine seam: TeX math in, SVG document out.

use crate::{
    foundation::error::{TexError, TexResult},
    normalize::is_multiline,
};

/// Turns math markup into a standalone SVG document.
///
/// Implementations must fail with [`TexError::Markup`] when the engine rejects
/// the input rather than returning an SVG that renders an error message.
pub trait Typesetter {
    fn typeset(&self, tex: &str) -> TexResult<String>;
}

/// MathJax (TeX input, SVG output) running in an embedded JS engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct MathJax;

impl Typesetter for MathJax {
    #[tracing::instrument(level = "debug", skip(self))]
    fn typeset(&self, tex: &str) -> TexResult<String> {
        let svg = mathjax_svg::convert_to_svg(tex).map_err(|e| TexError::markup(e.to_string()))?;
        if let Some(msg) = mathjax_error(&svg) {
            return Err(TexError::markup(msg));
        }
        Ok(svg)
    }
}

/// Canvas the expression is laid out on before trimming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasHint {
    /// 1x1 in; trimming does the rest.
    Compact,
    /// 8x6 in, room for stacked rows.
    MultiLine,
}

impl CanvasHint {
    pub fn size_inches(self) -> (f32, f32) {
        match self {
            Self::Compact => (1.0, 1.0),
            Self::MultiLine => (8.0, 6.0),
        }
    }

    pub fn size_px(self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.size_inches();
        let dpi = dpi as f32;
        ((w * dpi).ceil() as u32, (h * dpi).ceil() as u32)
    }
}

/// Wrap a normalized expression for the engine and pick its canvas.
///
/// Rows separated by `\\` are stacked in a centered single-column array so
/// they break even when the engine has no top-level line breaking.
pub fn prepare_markup(expr: &str) -> (String, CanvasHint) {
    if is_multiline(expr) {
        (
            format!(r"\begin{{array}}{{c}} {expr} \end{{array}}"),
            CanvasHint::MultiLine,
        )
    } else {
        (expr.to_owned(), CanvasHint::Compact)
    }
}

/// MathJax reports TeX errors in-band as an `merror` node carrying the message
/// in `data-mjx-error`.
fn mathjax_error(svg: &str) -> Option<String> {
    // Unparseable output is left for the rasterizer to report.
    let doc = roxmltree::Document::parse(svg).ok()?;
    let node = doc
        .descendants()
        .find(|n| n.attribute("data-mml-node") == Some("merror"))?;
    let msg = node
        .attribute("data-mjx-error")
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| "math engine rejected the expression".to_owned());
    Some(msg)
}
