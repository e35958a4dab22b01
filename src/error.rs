//! Fatal composition errors.
//!
//! A failing leaf command is not an error: its exit code is captured and
//! rendered as a failure marker. Everything in [`ComposeError`] aborts the
//! whole composition with no partial output.

use std::path::PathBuf;

use thiserror::Error;

use crate::shell::ValidationError;

#[derive(Debug, Error)]
pub enum ComposeError {
    /// `!` with nothing after it.
    #[error("line {line}: empty command directive")]
    EmptyCommand { line: usize },

    /// `@` whose path does not name a markdown file.
    #[error("line {line}: reference path must end in .md (got `{path}`)")]
    ReferenceNotMarkdown { line: usize, path: String },

    /// Malformed command directive (unterminated quote, stray operator, ...).
    #[error("line {line}: {message}")]
    CommandSyntax { line: usize, message: String },

    /// Command directive uses a shell construct outside the accepted subset.
    #[error("line {line}: {source}")]
    Validation {
        line: usize,
        source: ValidationError,
    },

    /// A file is being included while it is still being resolved.
    #[error("circular include detected:\n{chain}")]
    CircularInclude { chain: String },

    /// Referenced file does not exist (full resolution mode only).
    #[error("referenced file not found: {}", path.display())]
    ReferenceNotFound { path: PathBuf },

    /// Resolution-time target is not a markdown file.
    #[error("not a markdown file: {}", path.display())]
    NotMarkdown { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("rendering failed: {0}")]
    Render(#[source] std::io::Error),
}

impl ComposeError {
    /// Attach a path to a raw I/O failure.
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
