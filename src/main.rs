//! mdweave: compose modular markdown into one XML document.
//!
//! The entry file is read line by line:
//!   - `!cmd` runs a shell command and embeds its captured output
//!   - `@path.md` splices another markdown file, wrapped in path tags
//!   - anything else becomes literal text
//!
//! Composed XML goes to stdout; diagnostics go to stderr.

use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use mdweave::config::{Config, PathToTagStrategy, TagCase};
use mdweave::error::ComposeError;
use mdweave::{compose_to_xml, logging, resolve};

/// Compose modular markdown into a single XML document.
#[derive(Parser)]
#[command(name = "mdweave", version, about)]
struct Cli {
    /// Entry markdown file.
    file: PathBuf,

    /// Print the file dependency graph as JSON instead of composing.
    #[arg(long)]
    scan: bool,

    /// Path to a config file (default: ~/.config/mdweave/config.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Spaces per indentation level in the output.
    #[arg(long)]
    indent: Option<usize>,

    /// Wrap the whole document in a root tag with this name.
    #[arg(long, value_name = "NAME")]
    root_tag: Option<String>,

    /// Emit no root tag even if the config asks for one.
    #[arg(long, conflicts_with = "root_tag")]
    no_root_tag: bool,

    /// Which directory segments become wrapper tags around references.
    #[arg(long, value_enum)]
    path_to_tag: Option<PathToTagStrategy>,

    /// Move every nested tag directly under the document root.
    #[arg(long)]
    lift_all_tags_to_root: bool,

    /// Merge same-named sibling tags into one.
    #[arg(long)]
    inline_common_tags: bool,

    /// Sort these tags after their siblings (repeatable, order is priority).
    #[arg(long, value_name = "TAG")]
    sort_tags_to_bottom: Vec<String>,

    /// Respell every tag name in this style.
    #[arg(long, value_enum)]
    tag_case: Option<TagCase>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Layer command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(width) = self.indent {
            config.output.indent_width = width;
        }
        if let Some(name) = &self.root_tag {
            config.output.root_tag_name = name.clone();
            config.output.include_root_tag = true;
        }
        if self.no_root_tag {
            config.output.include_root_tag = false;
        }
        if let Some(case) = self.tag_case {
            config.output.tag_case = case;
        }
        if let Some(strategy) = self.path_to_tag {
            config.structure.path_to_tag_strategy = strategy;
        }
        if self.lift_all_tags_to_root {
            config.structure.lift_all_tags_to_root = true;
        }
        if self.inline_common_tags {
            config.structure.inline_common_tags = true;
        }
        for tag in &self.sort_tags_to_bottom {
            if !config.structure.sort_tags_to_bottom.contains(tag) {
                config.structure.sort_tags_to_bottom.push(tag.clone());
            }
        }
    }
}

fn fail(err: &ComposeError) -> ! {
    eprintln!("mdweave: {err}");
    exit(1);
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::load(cli.config.as_deref());
    cli.apply(&mut config);

    if cli.scan {
        match resolve::scan_dependencies(&cli.file) {
            Ok(report) => match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("mdweave: {e}");
                    exit(1);
                }
            },
            Err(e) => fail(&e),
        }
        return;
    }

    match compose_to_xml(&cli.file, &config) {
        Ok(xml) => println!("{xml}"),
        Err(e) => fail(&e),
    }
}
