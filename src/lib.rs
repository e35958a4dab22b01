//! mdweave: compose markdown files into a single XML document.
//!
//! Source files are read line by line: `!` lines run shell commands and embed
//! their captured output, `@` lines splice other markdown files wrapped in
//! tags derived from their paths, and every other line becomes literal text.
//! The assembled tree passes through configurable structure transforms and is
//! serialized as indented XML.
//!
//! # Architecture
//!
//! - **[`scan`]** — Line classification: command, reference, or plain text.
//! - **[`shell`]** — Command handling: operator split, expansion masking, subset validation.
//! - **[`exec`]** — Pipeline execution: process spawning, capture, short-circuit logic.
//! - **[`resolve`]** — Reference resolution: path expansion, wrapper tags, cycles, dependency scans.
//! - **[`compose`]** — Tree assembly from files, commands, and includes.
//! - **[`transform`]** — Structure passes: lift, inline, sort, tag casing, root wrap.
//! - **[`render`]** — XML serialization.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.

/// Tree assembly: walks markdown files and builds the node tree.
pub mod compose;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Fatal composition errors.
pub mod error;
/// Pipeline execution and output capture.
pub mod exec;
/// Stderr logging setup.
pub mod logging;
/// Text and element nodes of the composed tree.
pub mod node;
/// XML serialization of the composed tree.
pub mod render;
/// Reference resolution, wrapper tags, and dependency scanning.
pub mod resolve;
/// Line classification for markdown sources.
pub mod scan;
/// Shell command parsing and subset validation.
pub mod shell;
/// Structure transforms applied to the assembled tree.
pub mod transform;

use std::path::Path;

use config::Config;
use error::ComposeError;

/// Compose one markdown file into an XML string under the given config.
///
/// This is the main entry point for tests and simple usage. For CLI usage
/// with config overlays and flag overrides, drive [`compose::Composer`],
/// [`transform::apply`], and [`render::render`] directly.
pub fn compose_to_xml(entry: &Path, config: &Config) -> Result<String, ComposeError> {
    let mut composer = compose::Composer::new(config.clone())?;
    let nodes = composer.compose(entry)?;
    let nodes = transform::apply(nodes, config);
    render::render(&nodes, config.output.indent_width)
}
