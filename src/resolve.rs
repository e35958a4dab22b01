//! Reference resolution: locating target files, tracking the active
//! inclusion chain, deriving wrapper tags from relative paths, and the
//! execution-free dependency scan.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::compose::{INCLUDE_COMMAND, as_include};
use crate::config::PathToTagStrategy;
use crate::error::ComposeError;
use crate::node::{Element, Node};
use crate::scan::{Directive, MARKDOWN_EXT, scan};
use crate::shell::{parse, validate};

/// The stack of files currently being resolved, outermost first.
///
/// Entering a path already on the stack is a circular include; the error
/// message draws the chain from the first occurrence down to the repeat.
#[derive(Debug, Default)]
pub struct InclusionChain {
    stack: Vec<PathBuf>,
}

impl InclusionChain {
    pub fn enter(&mut self, path: &Path) -> Result<(), ComposeError> {
        if let Some(pos) = self.stack.iter().position(|p| p == path) {
            return Err(ComposeError::CircularInclude {
                chain: render_chain(&self.stack[pos..], path),
            });
        }
        self.stack.push(path.to_path_buf());
        Ok(())
    }

    pub fn leave(&mut self) {
        self.stack.pop();
    }
}

fn render_chain(stack: &[PathBuf], repeat: &Path) -> String {
    let mut lines = Vec::new();
    for (i, path) in stack.iter().enumerate() {
        let marker = if i == 0 { "┌─ " } else { "│  " };
        lines.push(format!("{marker}{}", path.display()));
    }
    lines.push(format!("└─ {}", repeat.display()));
    lines.join("\n")
}

/// A reference target resolved against its including file.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Canonical path, used for reading and cycle tracking.
    pub canonical: PathBuf,
    /// The tilde-expanded path as written, for wrapper tag derivation.
    pub written: PathBuf,
    /// Absolute references get no wrapper tags.
    pub absolute: bool,
}

/// Expand `~`, anchor relative paths at `base_dir`, and canonicalize.
pub fn resolve_target(raw: &str, base_dir: &Path) -> Result<ResolvedTarget, ComposeError> {
    let expanded = shellexpand::tilde(raw);
    let written = PathBuf::from(expanded.as_ref());
    let absolute = written.is_absolute();
    let full = if absolute {
        written.clone()
    } else {
        base_dir.join(&written)
    };
    let canonical = full
        .canonicalize()
        .map_err(|_| ComposeError::ReferenceNotFound { path: full.clone() })?;
    Ok(ResolvedTarget {
        canonical,
        written,
        absolute,
    })
}

/// Directory segments of a reference path turned into wrapper tag names,
/// outermost first. The file name itself never becomes a tag.
pub fn wrapper_tags(reference: &Path, strategy: PathToTagStrategy) -> Vec<String> {
    let dirs: Vec<String> = reference
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    if dirs.is_empty() {
        return dirs;
    }
    match strategy {
        PathToTagStrategy::All => dirs,
        PathToTagStrategy::Head => dirs[..1].to_vec(),
        PathToTagStrategy::Tail => dirs[1..].to_vec(),
        PathToTagStrategy::Init => dirs[..dirs.len() - 1].to_vec(),
        PathToTagStrategy::Last => dirs[dirs.len() - 1..].to_vec(),
        PathToTagStrategy::None => Vec::new(),
    }
}

/// Nest `nodes` inside one element per tag, first tag outermost.
pub fn wrap_in_tags(tags: &[String], nodes: Vec<Node>) -> Vec<Node> {
    tags.iter().rev().fold(nodes, |children, tag| {
        let mut element = Element::new(tag);
        element.children = children;
        vec![Node::Element(element)]
    })
}

/// The file graph a root document pulls in, without running anything.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    /// Every reachable file in first-visit depth-first order.
    pub files: Vec<PathBuf>,
    /// Referenced paths that do not exist. Tolerated here, fatal when
    /// composing.
    pub missing: Vec<PathBuf>,
}

/// Walk the reference graph from `root`.
///
/// Edges are `@` references and well-formed include commands, where
/// well-formed means the command would be routed to inclusion when
/// composing: a lone `mdweave` invocation with a single `.md` argument.
/// Files are visited once; cycles are still an error.
pub fn scan_dependencies(root: &Path) -> Result<ScanReport, ComposeError> {
    if !root.to_string_lossy().ends_with(MARKDOWN_EXT) {
        return Err(ComposeError::NotMarkdown {
            path: root.to_path_buf(),
        });
    }
    let canonical = root
        .canonicalize()
        .map_err(|_| ComposeError::ReferenceNotFound {
            path: root.to_path_buf(),
        })?;
    let cwd = std::env::current_dir().map_err(|err| ComposeError::io(Path::new("."), err))?;
    let mut report = ScanReport {
        root: canonical.clone(),
        files: Vec::new(),
        missing: Vec::new(),
    };
    let mut chain = InclusionChain::default();
    let mut seen = HashSet::new();
    visit(&canonical, &cwd, &mut chain, &mut seen, &mut report)?;
    Ok(report)
}

fn visit(
    path: &Path,
    cwd: &Path,
    chain: &mut InclusionChain,
    seen: &mut HashSet<PathBuf>,
    report: &mut ScanReport,
) -> Result<(), ComposeError> {
    chain.enter(path)?;
    if !seen.insert(path.to_path_buf()) {
        chain.leave();
        return Ok(());
    }
    debug!("scanning {}", path.display());
    report.files.push(path.to_path_buf());

    let source = fs::read_to_string(path).map_err(|err| ComposeError::io(path, err))?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    for directive in scan(&source)? {
        let edge = match &directive {
            Directive::Reference { path: raw, .. } => Some((raw.clone(), base_dir.as_path())),
            // Include commands resolve against the working directory,
            // exactly as they would when composing.
            Directive::Command { text, .. } => include_edge(text).map(|raw| (raw, cwd)),
            Directive::Text { .. } => None,
        };
        let Some((raw, base)) = edge else { continue };
        match resolve_target(&raw, base) {
            Ok(target) => visit(&target.canonical, cwd, chain, seen, report)?,
            Err(ComposeError::ReferenceNotFound { path }) => {
                if !report.missing.contains(&path) {
                    report.missing.push(path);
                }
            }
            Err(other) => return Err(other),
        }
    }

    chain.leave();
    Ok(())
}

fn include_edge(text: &str) -> Option<String> {
    let valid = validate(parse(text).ok()?, INCLUDE_COMMAND).ok()?;
    let cmd = as_include(&valid)?;
    match &cmd.args[..] {
        [arg] if arg.ends_with(MARKDOWN_EXT) => Some(arg.clone()),
        _ => None,
    }
}
