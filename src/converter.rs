use std::path::{Path, PathBuf};

use crate::{
    config::Config,
    foundation::error::{TexError, TexResult},
    naming::{CollisionPolicy, auto_output_path, resolve_collision},
    normalize::{normalize_aligned, split_sections},
    raster::rasterize,
    source::read_batch_file,
    typeset::{MathJax, Typesetter, prepare_markup},
};

/// Renders expressions to PNG files with one fixed [`Config`].
///
/// Style travels with every call, so two converters with different configs can
/// be used side by side.
pub struct Converter {
    config: Config,
    typesetter: Box<dyn Typesetter>,
}

impl Converter {
    pub fn new(config: Config) -> TexResult<Self> {
        Self::with_typesetter(config, Box::new(MathJax))
    }

    pub fn with_typesetter(config: Config, typesetter: Box<dyn Typesetter>) -> TexResult<Self> {
        config.validate()?;
        Ok(Self { config, typesetter })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render one expression. With no `output_path`, the file lands in the
    /// configured output directory under a hash-derived name.
    pub fn convert_single(&self, expr: &str, output_path: Option<&Path>) -> TexResult<PathBuf> {
        self.convert_in(expr, output_path, &self.config.output_dir)
    }

    /// Render each expression in order. `output_paths` is paired by position;
    /// entries past its end (or `None`) get auto-generated names. The first
    /// failure aborts the batch.
    pub fn convert_batch<S: AsRef<str>>(
        &self,
        exprs: &[S],
        output_paths: &[Option<PathBuf>],
    ) -> TexResult<Vec<PathBuf>> {
        self.batch_in(exprs, output_paths, &self.config.output_dir)
    }

    /// Render every non-empty section of a batch file. `output_dir` overrides
    /// the configured directory for this call only.
    pub fn convert_from_file(
        &self,
        input: &Path,
        output_dir: Option<&Path>,
    ) -> TexResult<Vec<PathBuf>> {
        let content = read_batch_file(input)?;
        let exprs = split_sections(&content);
        tracing::info!(
            input = %input.display(),
            sections = exprs.len(),
            "read batch file"
        );
        let dir = output_dir.unwrap_or(&self.config.output_dir);
        self.batch_in(&exprs, &[], dir)
    }

    fn batch_in<S: AsRef<str>>(
        &self,
        exprs: &[S],
        output_paths: &[Option<PathBuf>],
        dir: &Path,
    ) -> TexResult<Vec<PathBuf>> {
        let mut out = Vec::with_capacity(exprs.len());
        for (i, expr) in exprs.iter().enumerate() {
            let explicit = output_paths.get(i).and_then(|p| p.as_deref());
            out.push(self.convert_in(expr.as_ref(), explicit, dir)?);
        }
        Ok(out)
    }

    #[tracing::instrument(skip(self, dir))]
    fn convert_in(
        &self,
        expr: &str,
        output_path: Option<&Path>,
        dir: &Path,
    ) -> TexResult<PathBuf> {
        let expr = normalize_aligned(expr);
        let (markup, hint) = prepare_markup(&expr);

        let svg = self.typesetter.typeset(&markup)?;
        let style = self.config.style();
        let img = rasterize(&svg, &style, hint)?;

        let path = match output_path {
            Some(p) => {
                if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                    create_dir(parent)?;
                }
                p.to_path_buf()
            }
            None => {
                create_dir(dir)?;
                let candidate = auto_output_path(dir, &self.config.filename_prefix, &expr);
                if self.config.collision == CollisionPolicy::Overwrite && candidate.exists() {
                    tracing::debug!(path = %candidate.display(), "overwriting existing image");
                }
                resolve_collision(candidate, self.config.collision)
            }
        };

        img.save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| TexError::output(format!("write png '{}': {e}", path.display())))?;

        tracing::info!(
            path = %path.display(),
            width = img.width(),
            height = img.height(),
            "wrote image"
        );
        Ok(path)
    }
}

fn create_dir(dir: &Path) -> TexResult<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| TexError::output(format!("create output dir '{}': {e}", dir.display())))
}
