//! The restricted shell grammar: parsing directive text into an AST and
//! validating it down to the executable subset.

pub mod parse;
pub mod types;
pub mod validate;

pub use parse::{SyntaxError, parse};
pub use types::{Expansion, LogicalOp, Part, Redirect, ShellAst, SimpleCommand, Word};
pub use validate::{ValidAst, ValidCommand, ValidationError, validate};

/// Strip any directory prefix from a program word, so `/usr/bin/ls` and
/// `ls` compare equal.
pub fn base_command(program: &str) -> &str {
    program.rsplit_once('/').map_or(program, |(_, base)| base)
}
