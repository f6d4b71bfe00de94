//! Render LaTeX math expressions to standalone PNG images.
//!
//! Expressions come from a string, stdin, or a batch file of `---`-separated
//! sections. Each one is normalized, typeset to SVG by MathJax, rasterized
//! with resvg, trimmed to its ink, padded and written as a PNG.
#![forbid(unsafe_code)]

pub mod config;
pub mod converter;
pub mod foundation;
pub mod naming;
pub mod normalize;
pub mod raster;
pub mod source;
pub mod typeset;

pub use config::{Config, Style};
pub use converter::Converter;
pub use foundation::color::Color;
pub use foundation::error::{TexError, TexResult};
pub use naming::CollisionPolicy;
pub use source::InputKind;
pub use typeset::{CanvasHint, MathJax, Typesetter};
