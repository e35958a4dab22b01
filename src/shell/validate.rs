//! Narrowing validation: a parsed [`ShellAst`] either becomes a
//! [`ValidAst`] that the executor can run directly, or a
//! [`ValidationError`] naming the first thing that rules the command out.
//!
//! Checks run in a fixed order over the whole tree, so the reported error
//! is stable regardless of where in the chain the offending piece sits:
//! rejected constructs, then redirections, then environment assignments,
//! then expansions, then include-command placement.

use thiserror::Error;

use super::base_command;
use super::types::{Expansion, LogicalOp, Part, ShellAst, SimpleCommand};

/// Why a syntactically well-formed command cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
    #[error("unsupported redirection `{0}`")]
    Redirection(String),
    #[error("unsupported environment assignment `{0}`")]
    Assignment(String),
    #[error("unsupported parameter expansion `{0}`")]
    Parameter(String),
    #[error("unsupported command substitution `{0}`")]
    CommandSubstitution(String),
    #[error("unsupported arithmetic expansion `{0}`")]
    Arithmetic(String),
    #[error("unsupported process substitution `{0}`")]
    ProcessSubstitution(String),
    #[error("`{0}` must be the entire command")]
    NestedInclude(String),
}

/// A command every check has passed: a bare program and literal arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Original directive text for this command, as written.
    pub text: String,
}

impl From<SimpleCommand> for ValidCommand {
    fn from(cmd: SimpleCommand) -> Self {
        Self {
            program: cmd.program,
            args: cmd.args,
            text: cmd.text,
        }
    }
}

/// The executable subset of [`ShellAst`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidAst {
    Command(ValidCommand),
    Pipeline(Vec<ValidCommand>),
    Logical {
        op: LogicalOp,
        left: Box<ValidAst>,
        right: Box<ValidAst>,
    },
}

/// Check the whole tree, then narrow it.
///
/// `include_command` is the program name that re-enters the composer; it
/// may only appear as the entire command, never inside a pipeline or
/// chain. The comparison ignores any directory prefix on the program.
pub fn validate(ast: ShellAst, include_command: &str) -> Result<ValidAst, ValidationError> {
    if let Some(name) = rejected(&ast) {
        return Err(ValidationError::Unsupported(name));
    }
    let leaves = collect_leaves(&ast);

    for cmd in &leaves {
        for part in cmd.prefix.iter().chain(cmd.suffix.iter()) {
            if let Part::Redirect(redirect) = part {
                return Err(ValidationError::Redirection(redirect.op.clone()));
            }
        }
    }
    for cmd in &leaves {
        for part in &cmd.prefix {
            if let Part::Assignment(text) = part {
                return Err(ValidationError::Assignment(text.clone()));
            }
        }
    }

    for cmd in &leaves {
        let words = cmd.name.iter().chain(cmd.suffix.iter().filter_map(|p| match p {
            Part::Word(word) => Some(word),
            _ => None,
        }));
        for word in words {
            if let Some(kind) = word.expansions.first() {
                return Err(expansion_error(*kind, &word.text));
            }
        }
    }

    // A lone include command is the caller's business, not ours.
    if !matches!(ast, ShellAst::Command(_)) {
        for cmd in &leaves {
            if base_command(&cmd.program) == include_command {
                return Err(ValidationError::NestedInclude(cmd.program.clone()));
            }
        }
    }

    narrow(ast)
}

fn construct_name(ast: &ShellAst) -> &'static str {
    match ast {
        ShellAst::Command(_) => "command",
        ShellAst::Pipeline(_) => "pipeline",
        ShellAst::Logical { .. } => "logical chain",
        ShellAst::Subshell => "subshell",
        ShellAst::CompoundList => "compound list",
        ShellAst::For => "`for` loop",
        ShellAst::While => "`while` loop",
        ShellAst::Until => "`until` loop",
        ShellAst::If => "`if` statement",
        ShellAst::Case => "`case` statement",
        ShellAst::Function => "function definition",
    }
}

fn rejected(ast: &ShellAst) -> Option<&'static str> {
    match ast {
        ShellAst::Command(_) | ShellAst::Pipeline(_) => None,
        ShellAst::Logical { left, right, .. } => rejected(left).or_else(|| rejected(right)),
        other => Some(construct_name(other)),
    }
}

/// Leaf commands in execution order.
fn collect_leaves(ast: &ShellAst) -> Vec<&SimpleCommand> {
    match ast {
        ShellAst::Command(cmd) => vec![cmd],
        ShellAst::Pipeline(cmds) => cmds.iter().collect(),
        ShellAst::Logical { left, right, .. } => {
            let mut leaves = collect_leaves(left);
            leaves.extend(collect_leaves(right));
            leaves
        }
        _ => Vec::new(),
    }
}

fn expansion_error(kind: Expansion, word: &str) -> ValidationError {
    let word = word.to_string();
    match kind {
        Expansion::Parameter => ValidationError::Parameter(word),
        Expansion::Command => ValidationError::CommandSubstitution(word),
        Expansion::Arithmetic => ValidationError::Arithmetic(word),
        Expansion::Process => ValidationError::ProcessSubstitution(word),
    }
}

fn narrow(ast: ShellAst) -> Result<ValidAst, ValidationError> {
    match ast {
        ShellAst::Command(cmd) => Ok(ValidAst::Command(cmd.into())),
        ShellAst::Pipeline(cmds) => Ok(ValidAst::Pipeline(
            cmds.into_iter().map(ValidCommand::from).collect(),
        )),
        ShellAst::Logical { op, left, right } => Ok(ValidAst::Logical {
            op,
            left: Box::new(narrow(*left)?),
            right: Box::new(narrow(*right)?),
        }),
        other => Err(ValidationError::Unsupported(construct_name(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse::parse;
    use super::*;

    fn check(command: &str) -> Result<ValidAst, ValidationError> {
        validate(parse(command).unwrap(), "mdweave")
    }

    #[test]
    fn plain_command_narrows() {
        let ValidAst::Command(cmd) = check("echo hello world").unwrap() else {
            panic!("expected command");
        };
        assert_eq!(cmd.program, "echo");
        assert_eq!(cmd.args, vec!["hello", "world"]);
    }

    #[test]
    fn pipeline_and_chain_narrow() {
        assert!(matches!(
            check("cat a | wc -l").unwrap(),
            ValidAst::Pipeline(stages) if stages.len() == 2
        ));
        assert!(matches!(
            check("true && echo ok").unwrap(),
            ValidAst::Logical { op: LogicalOp::And, .. }
        ));
    }

    #[test]
    fn rejected_constructs() {
        for (command, name) in [
            ("(ls)", "subshell"),
            ("a; b", "compound list"),
            ("sleep 1 &", "compound list"),
            ("for i in x", "`for` loop"),
            ("while true; do a; done", "`while` loop"),
            ("until false; do a; done", "`until` loop"),
            ("if true; then a; fi", "`if` statement"),
            ("case x in esac", "`case` statement"),
            ("f() { a; }", "function definition"),
        ] {
            assert_eq!(
                check(command).unwrap_err(),
                ValidationError::Unsupported(name),
                "in {command:?}"
            );
        }
    }

    #[test]
    fn redirections_rejected() {
        assert_eq!(
            check("ls > out.txt").unwrap_err(),
            ValidationError::Redirection(">".to_string())
        );
        assert_eq!(
            check("ls 2>&1").unwrap_err(),
            ValidationError::Redirection("2>&1".to_string())
        );
    }

    #[test]
    fn assignments_rejected() {
        assert_eq!(
            check("FOO=1 env").unwrap_err(),
            ValidationError::Assignment("FOO=1".to_string())
        );
    }

    #[test]
    fn redirect_reported_before_assignment_anywhere_in_chain() {
        // The redirect sits in a later command, the assignment in an
        // earlier one; the redirect scan still runs first.
        assert_eq!(
            check("FOO=1 env | sort > out").unwrap_err(),
            ValidationError::Redirection(">".to_string())
        );
    }

    #[test]
    fn assignment_reported_before_expansion() {
        assert_eq!(
            check("FOO=$HOME echo $BAR").unwrap_err(),
            ValidationError::Assignment("FOO=$HOME".to_string())
        );
    }

    #[test]
    fn first_expansion_wins() {
        assert_eq!(
            check("echo $HOME $(date)").unwrap_err(),
            ValidationError::Parameter("$HOME".to_string())
        );
        assert_eq!(
            check("echo $(date) $HOME").unwrap_err(),
            ValidationError::CommandSubstitution("$(date)".to_string())
        );
    }

    #[test]
    fn expansion_kinds_reported() {
        assert_eq!(
            check("echo $((1 + 2))").unwrap_err(),
            ValidationError::Arithmetic("$((1 + 2))".to_string())
        );
        assert_eq!(
            check("diff <(sort a) b").unwrap_err(),
            ValidationError::ProcessSubstitution("<(sort a)".to_string())
        );
        assert_eq!(
            check("echo `date`").unwrap_err(),
            ValidationError::CommandSubstitution("`date`".to_string())
        );
    }

    #[test]
    fn expansion_in_name_position_reported() {
        assert_eq!(
            check("$(which ls) -la").unwrap_err(),
            ValidationError::CommandSubstitution("$(which ls)".to_string())
        );
    }

    #[test]
    fn quoted_expansions_pass() {
        let ValidAst::Command(cmd) = check("echo '$HOME and $(date)'").unwrap() else {
            panic!("expected command");
        };
        assert_eq!(cmd.args, vec!["$HOME and $(date)"]);
    }

    #[test]
    fn sole_include_command_passes_placement() {
        assert!(check("mdweave part.md").is_ok());
    }

    #[test]
    fn include_command_rejected_inside_pipeline() {
        assert_eq!(
            check("mdweave part.md | cat").unwrap_err(),
            ValidationError::NestedInclude("mdweave".to_string())
        );
    }

    #[test]
    fn include_command_rejected_inside_chain_by_basename() {
        assert_eq!(
            check("true && /usr/local/bin/mdweave part.md").unwrap_err(),
            ValidationError::NestedInclude("/usr/local/bin/mdweave".to_string())
        );
    }
}
