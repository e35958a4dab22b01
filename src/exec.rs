//! Subprocess execution of validated command trees.
//!
//! Commands run directly, without a shell. Pipelines pass whole output
//! buffers between stages rather than streaming, which keeps every stage's
//! stdout and stderr individually capturable. `&&` and `||` short-circuit
//! on the left side's exit code.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use log::debug;

use crate::shell::{LogicalOp, ValidAst, ValidCommand, base_command};

/// Captured output and exit code of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code, 127 when the program could not be spawned, -1 when the
    /// process died to a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A command that ran, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Program basename, which becomes the element name.
    pub program: String,
    /// The command as written in the directive.
    pub input: String,
    pub result: ExecutionResult,
    /// False when the output was consumed by a later pipeline stage.
    pub stdout_visible: bool,
}

/// The operator joining a command to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Pipe,
    And,
    Or,
}

/// One step of an executed chain, in left-to-right order. An operator node
/// appears only when the command after it actually ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecNode {
    Command(CommandResult),
    Operator(OperatorKind),
}

/// Everything a command directive produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    pub nodes: Vec<ExecNode>,
    /// Exit code of the whole tree: the last pipeline stage, or whichever
    /// side of a logical chain decided it.
    pub exit_code: i32,
}

/// Run a validated tree, collecting every command's output.
pub fn execute(ast: &ValidAst) -> ExecOutcome {
    let mut nodes = Vec::new();
    let exit_code = run(ast, &mut nodes);
    ExecOutcome { nodes, exit_code }
}

fn run(ast: &ValidAst, nodes: &mut Vec<ExecNode>) -> i32 {
    match ast {
        ValidAst::Command(cmd) => {
            let result = run_leaf(cmd, None);
            let code = result.exit_code;
            nodes.push(ExecNode::Command(CommandResult {
                program: base_command(&cmd.program).to_string(),
                input: cmd.text.clone(),
                result,
                stdout_visible: true,
            }));
            code
        }
        ValidAst::Pipeline(stages) => run_pipeline(stages, nodes),
        ValidAst::Logical { op, left, right } => {
            let left_code = run(left, nodes);
            let short_circuit = match op {
                LogicalOp::And => left_code != 0,
                LogicalOp::Or => left_code == 0,
            };
            if short_circuit {
                debug!("short-circuit after exit code {left_code}");
                return left_code;
            }
            nodes.push(ExecNode::Operator(match op {
                LogicalOp::And => OperatorKind::And,
                LogicalOp::Or => OperatorKind::Or,
            }));
            run(right, nodes)
        }
    }
}

/// Run every stage, feeding each one the previous stage's stdout. All
/// stages run regardless of failures; the last stage's exit code wins.
fn run_pipeline(stages: &[ValidCommand], nodes: &mut Vec<ExecNode>) -> i32 {
    let last = stages.len().saturating_sub(1);
    let mut input: Option<String> = None;
    let mut code = 0;
    for (i, stage) in stages.iter().enumerate() {
        if i > 0 {
            nodes.push(ExecNode::Operator(OperatorKind::Pipe));
        }
        let result = run_leaf(stage, input.as_deref());
        code = result.exit_code;
        input = Some(result.stdout.clone());
        nodes.push(ExecNode::Command(CommandResult {
            program: base_command(&stage.program).to_string(),
            input: stage.text.clone(),
            result,
            stdout_visible: i == last,
        }));
    }
    code
}

fn run_leaf(cmd: &ValidCommand, stdin: Option<&str>) -> ExecutionResult {
    debug!("running `{}`", cmd.text);
    let spawned = Command::new(&cmd.program)
        .args(&cmd.args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => return spawn_failure(&cmd.program, &err),
    };

    // Feed stdin from a separate thread so a stage that fills its output
    // pipe before reading all input cannot deadlock us.
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_string();
            Some(thread::spawn(move || {
                let _ = pipe.write_all(input.as_bytes());
            }))
        }
        _ => None,
    };

    let output = child.wait_with_output();
    if let Some(writer) = writer {
        let _ = writer.join();
    }
    match output {
        Ok(output) => {
            let result = ExecutionResult {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            debug!("`{}` exited with {}", cmd.text, result.exit_code);
            result
        }
        Err(err) => spawn_failure(&cmd.program, &err),
    }
}

fn spawn_failure(program: &str, err: &std::io::Error) -> ExecutionResult {
    ExecutionResult {
        exit_code: 127,
        stdout: String::new(),
        stderr: format!("{program}: {err}"),
    }
}
