use std::path::PathBuf;

pub type TexResult<T> = Result<T, TexError>;

#[derive(thiserror::Error, Debug)]
pub enum TexError {
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("markup error: {0}")]
    Markup(String),

    #[error("output error: {0}")]
    Output(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("raster error: {0}")]
    Raster(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TexError {
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound(path.into())
    }

    pub fn markup(msg: impl Into<String>) -> Self {
        Self::Markup(msg.into())
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            TexError::input_not_found("eqs.txt")
                .to_string()
                .contains("input not found: eqs.txt")
        );
        assert!(TexError::markup("x").to_string().contains("markup error:"));
        assert!(TexError::output("x").to_string().contains("output error:"));
        assert!(TexError::config("x").to_string().contains("config error:"));
        assert!(TexError::raster("x").to_string().contains("raster error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = TexError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
