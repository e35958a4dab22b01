//! Line scanner: splits markdown source into directives.
//!
//! Scanning is purely line-oriented. A line whose trimmed form starts with
//! `!` is a command directive, one starting with `@` is a file reference,
//! anything else non-empty is literal text. Blank lines produce nothing.

use crate::error::ComposeError;

/// Marker introducing a command directive.
pub const COMMAND_MARKER: char = '!';
/// Marker introducing a file-reference directive.
pub const REFERENCE_MARKER: char = '@';
/// Extension every referenced document must carry.
pub const MARKDOWN_EXT: &str = ".md";

/// One interpreted source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Literal text, trailing whitespace stripped.
    Text { content: String },
    /// Shell command line: everything after the `!` marker, as written.
    Command { line: usize, text: String },
    /// Reference to another markdown document.
    Reference { line: usize, path: String },
}

/// Scan a whole source text into directives.
///
/// Line numbers are 1-based. Malformed directives (empty command, reference
/// without the markdown extension) are hard errors.
pub fn scan(source: &str) -> Result<Vec<Directive>, ComposeError> {
    let mut directives = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix(COMMAND_MARKER) {
            if rest.trim().is_empty() {
                return Err(ComposeError::EmptyCommand { line });
            }
            directives.push(Directive::Command {
                line,
                text: rest.to_string(),
            });
        } else if let Some(rest) = trimmed.strip_prefix(REFERENCE_MARKER) {
            let path = rest.trim();
            if !path.ends_with(MARKDOWN_EXT) {
                return Err(ComposeError::ReferenceNotMarkdown {
                    line,
                    path: path.to_string(),
                });
            }
            directives.push(Directive::Reference {
                line,
                path: path.to_string(),
            });
        } else {
            directives.push(Directive::Text {
                content: raw.trim_end().to_string(),
            });
        }
    }
    Ok(directives)
}
