//! Composition: drive the scanner, shell grammar, executor, and resolver
//! over a root document, producing the raw node tree that the transform
//! passes then shape.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::Config;
use crate::error::ComposeError;
use crate::exec::{self, CommandResult, ExecNode, ExecOutcome, OperatorKind};
use crate::node::{Element, Node};
use crate::resolve::{InclusionChain, ResolvedTarget, resolve_target, wrap_in_tags, wrapper_tags};
use crate::scan::{Directive, MARKDOWN_EXT, scan};
use crate::shell::{ValidAst, ValidCommand, base_command, parse, validate};

/// The program name that re-enters the composer. A command directive
/// consisting solely of this program includes the named file in place
/// instead of spawning anything.
pub const INCLUDE_COMMAND: &str = "mdweave";

/// If a validated tree is a lone include invocation, its command.
pub(crate) fn as_include(ast: &ValidAst) -> Option<&ValidCommand> {
    match ast {
        ValidAst::Command(cmd) if base_command(&cmd.program) == INCLUDE_COMMAND => Some(cmd),
        _ => None,
    }
}

/// One composition run: holds the configuration and the inclusion chain
/// shared by reference directives and include commands alike.
pub struct Composer {
    config: Config,
    chain: InclusionChain,
    cwd: PathBuf,
}

impl Composer {
    pub fn new(config: Config) -> Result<Self, ComposeError> {
        let cwd = std::env::current_dir().map_err(|err| ComposeError::io(Path::new("."), err))?;
        Ok(Self {
            config,
            chain: InclusionChain::default(),
            cwd,
        })
    }

    /// Compose the document rooted at `entry` into untransformed nodes.
    pub fn compose(&mut self, entry: &Path) -> Result<Vec<Node>, ComposeError> {
        if !entry.to_string_lossy().ends_with(MARKDOWN_EXT) {
            return Err(ComposeError::NotMarkdown {
                path: entry.to_path_buf(),
            });
        }
        let canonical = entry
            .canonicalize()
            .map_err(|_| ComposeError::ReferenceNotFound {
                path: entry.to_path_buf(),
            })?;
        self.compose_file(&canonical)
    }

    fn compose_file(&mut self, path: &Path) -> Result<Vec<Node>, ComposeError> {
        self.chain.enter(path)?;
        info!("composing {}", path.display());
        let source = fs::read_to_string(path).map_err(|err| ComposeError::io(path, err))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut nodes = Vec::new();
        for directive in scan(&source)? {
            match directive {
                // Text lines become elements here so every later pass
                // (casing included) sees them as ordinary tags.
                Directive::Text { content } => {
                    nodes.push(Node::Element(Element::with_text("text", &content)));
                }
                Directive::Command { line, text } => {
                    nodes.extend(self.command_nodes(line, &text)?);
                }
                Directive::Reference { path: raw, .. } => {
                    let target = resolve_target(&raw, &base_dir)?;
                    nodes.extend(self.compose_wrapped(&target)?);
                }
            }
        }

        self.chain.leave();
        Ok(nodes)
    }

    fn command_nodes(&mut self, line: usize, text: &str) -> Result<Vec<Node>, ComposeError> {
        let ast = parse(text).map_err(|err| ComposeError::CommandSyntax {
            line,
            message: err.to_string(),
        })?;
        let valid =
            validate(ast, INCLUDE_COMMAND).map_err(|source| ComposeError::Validation { line, source })?;

        if as_include(&valid).is_some() {
            return self.include_nodes(line, &valid);
        }

        let outcome = exec::execute(&valid);
        debug!(
            "command at line {line} finished with exit code {}",
            outcome.exit_code
        );
        Ok(exec_nodes(&outcome))
    }

    /// `mdweave <file.md>` splices the target's composition in place,
    /// resolved against the working directory like a fresh invocation
    /// would be, but sharing this run's inclusion chain.
    fn include_nodes(&mut self, line: usize, valid: &ValidAst) -> Result<Vec<Node>, ComposeError> {
        let arg = match as_include(valid).map(|cmd| &cmd.args[..]) {
            Some([arg]) if arg.ends_with(MARKDOWN_EXT) => arg.clone(),
            _ => {
                return Err(ComposeError::CommandSyntax {
                    line,
                    message: format!(
                        "`{INCLUDE_COMMAND}` takes exactly one markdown file argument"
                    ),
                });
            }
        };
        let base = self.cwd.clone();
        let target = resolve_target(&arg, &base)?;
        info!("including {}", target.canonical.display());
        self.compose_wrapped(&target)
    }

    /// Compose a resolved file and wrap it in its path-derived tags.
    /// Targets written as absolute paths are spliced bare.
    fn compose_wrapped(&mut self, target: &ResolvedTarget) -> Result<Vec<Node>, ComposeError> {
        let nodes = self.compose_file(&target.canonical)?;
        if target.absolute {
            return Ok(nodes);
        }
        let tags = wrapper_tags(&target.written, self.config.structure.path_to_tag_strategy);
        Ok(wrap_in_tags(&tags, nodes))
    }
}

fn exec_nodes(outcome: &ExecOutcome) -> Vec<Node> {
    outcome
        .nodes
        .iter()
        .map(|node| match node {
            ExecNode::Command(cmd) => Node::Element(command_element(cmd)),
            ExecNode::Operator(kind) => Node::Element(Element::new(operator_tag(*kind))),
        })
        .collect()
}

fn operator_tag(kind: OperatorKind) -> &'static str {
    match kind {
        OperatorKind::Pipe => "pipe-operator",
        OperatorKind::And => "logical-and-operator",
        OperatorKind::Or => "logical-or-operator",
    }
}

/// Render one executed command as an element named after the program.
///
/// Trailing newlines on captured output are presentation noise and are
/// dropped here; the raw capture stays untouched in the result.
fn command_element(cmd: &CommandResult) -> Element {
    let mut element = Element::new(&cmd.program);
    element
        .children
        .push(Node::Element(Element::with_text("input", &cmd.input)));

    if cmd.stdout_visible {
        let stdout = cmd.result.stdout.trim_end_matches(['\n', '\r']);
        if stdout.is_empty() {
            element.children.push(Node::Element(Element::new("stdout")));
        } else {
            element
                .children
                .push(Node::Element(Element::with_text("stdout", stdout)));
        }
    } else {
        let mut suppressed = Element::new("stdout");
        suppressed
            .attrs
            .push(("suppressed".to_string(), "true".to_string()));
        element.children.push(Node::Element(suppressed));
    }

    let stderr = cmd.result.stderr.trim_end_matches(['\n', '\r']);
    if !stderr.is_empty() {
        element
            .children
            .push(Node::Element(Element::with_text("stderr", stderr)));
    }

    let mut status = if cmd.result.success() {
        Element::new("success")
    } else {
        Element::new("failed")
    };
    status
        .attrs
        .push(("code".to_string(), cmd.result.exit_code.to_string()));
    element.children.push(Node::Element(status));
    element
}
