use std::{
    io::{self, BufRead},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::foundation::error::{TexError, TexResult};

/// What the CLI positional argument turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// No argument: read expressions from stdin.
    Interactive,
    /// `$...$` with the delimiters already stripped.
    Single(String),
    /// An existing file holding `---`-separated sections.
    File(PathBuf),
    /// Anything else, used as the expression text as-is.
    Raw(String),
}

impl InputKind {
    pub fn classify(input: Option<&str>) -> Self {
        let Some(input) = input else {
            return Self::Interactive;
        };
        if let Some(inner) = strip_math_delimiters(input) {
            return Self::Single(inner.to_owned());
        }
        let path = Path::new(input);
        if path.is_file() {
            return Self::File(path.to_path_buf());
        }
        Self::Raw(input.to_owned())
    }
}

/// Strip one surrounding `$...$` pair. Returns `None` if `s` isn't wrapped.
pub fn strip_math_delimiters(s: &str) -> Option<&str> {
    // A lone `$` both opens and closes.
    if s == "$" {
        return Some("");
    }
    s.strip_prefix('$')?.strip_suffix('$')
}

/// Read one expression per line until a blank line or end of input.
pub fn read_interactive(reader: impl BufRead) -> TexResult<Vec<String>> {
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line.context("read expression line")?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        out.push(line.to_owned());
    }
    Ok(out)
}

/// Only a missing path is [`TexError::InputNotFound`]; any other read failure
/// (permissions, invalid UTF-8, ...) keeps its `io::Error` as the source.
pub fn read_batch_file(path: &Path) -> TexResult<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(TexError::input_not_found(path)),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("read batch file '{}'", path.display()))
            .into()),
    }
}
