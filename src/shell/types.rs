//! Closed AST for the restricted command grammar.
//!
//! The parser recognizes every construct it rejects so validation can name
//! it precisely. Rejected kinds carry no payload: once identified, the only
//! thing the pipeline does with them is produce an error message.

/// Logical connective between command groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Expansion constructs recognized inside a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// `${...}`, `$VAR`, or a special parameter like `$?`.
    Parameter,
    /// `$(...)` or backticks.
    Command,
    /// `$((...))`.
    Arithmetic,
    /// `<(...)` or `>(...)`.
    Process,
}

/// A word as written (quotes intact), with the expansions it carries
/// in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub expansions: Vec<Expansion>,
}

/// A redirection operator found in a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub op: String,
}

/// One element of a command's prefix or suffix list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Word(Word),
    /// `NAME=value` before the command name.
    Assignment(String),
    Redirect(Redirect),
}

/// A single command in two views: the executable argv (quoting resolved)
/// and the structural word list validation walks over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    /// Original text of this segment, trimmed.
    pub text: String,
    /// Program token with quoting resolved.
    pub program: String,
    /// Argument tokens with quoting resolved.
    pub args: Vec<String>,
    /// First plain word; `None` when the segment is only assignments
    /// or redirects.
    pub name: Option<Word>,
    /// Parts before the name.
    pub prefix: Vec<Part>,
    /// Parts after the name.
    pub suffix: Vec<Part>,
}

/// Parse result for one command directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAst {
    Command(SimpleCommand),
    Pipeline(Vec<SimpleCommand>),
    Logical {
        op: LogicalOp,
        left: Box<ShellAst>,
        right: Box<ShellAst>,
    },
    Subshell,
    CompoundList,
    For,
    While,
    Until,
    If,
    Case,
    Function,
}
