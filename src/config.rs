use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub structure: StructureConfig,
}

/// How the final tree is written out.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub indent_width: usize,
    #[serde(default)]
    pub root_tag_name: String,
    #[serde(default)]
    pub include_root_tag: bool,
    #[serde(default)]
    pub tag_case: TagCase,
}

/// Which structural passes run and how references wrap.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StructureConfig {
    #[serde(default)]
    pub path_to_tag_strategy: PathToTagStrategy,
    #[serde(default)]
    pub lift_all_tags_to_root: bool,
    #[serde(default)]
    pub inline_common_tags: bool,
    #[serde(default)]
    pub sort_tags_to_bottom: Vec<String>,
}

/// Which directory segments of a relative reference path become wrapper
/// tags, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PathToTagStrategy {
    /// Every directory segment.
    #[default]
    All,
    /// Only the first segment.
    Head,
    /// Everything after the first segment.
    #[serde(alias = "rest")]
    #[value(alias = "rest")]
    Tail,
    /// Everything before the last segment.
    Init,
    /// Only the last segment.
    Last,
    /// No wrapping at all.
    None,
}

/// Spelling applied to every tag name by the case pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TagCase {
    #[default]
    Kebab,
    Pascal,
    Shout,
    Alternating,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    output: OutputOverlay,
    #[serde(default)]
    structure: StructureOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct OutputOverlay {
    indent_width: Option<usize>,
    root_tag_name: Option<String>,
    include_root_tag: Option<bool>,
    tag_case: Option<TagCase>,
}

#[derive(Debug, Deserialize, Default)]
struct StructureOverlay {
    #[serde(default)]
    replace: bool,
    path_to_tag_strategy: Option<PathToTagStrategy>,
    lift_all_tags_to_root: Option<bool>,
    inline_common_tags: Option<bool>,
    #[serde(default)]
    sort_tags_to_bottom: Vec<String>,
    #[serde(default)]
    remove_sort_tags_to_bottom: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the user overlay from `--config` or
    ///    ~/.config/mdweave/config.toml (if it exists)
    ///
    /// User config merges with defaults: scalars override, the sort list
    /// extends. Set `replace = true` in `[structure]` to replace the sort
    /// list entirely; use `remove_sort_tags_to_bottom` to subtract items.
    pub fn load(explicit: Option<&Path>) -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay(explicit) {
            config.apply_overlay(overlay);
        }
        config
    }

    fn load_overlay(explicit: Option<&Path>) -> Option<ConfigOverlay> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let home = std::env::var_os("HOME")?;
                PathBuf::from(home).join(".config/mdweave/config.toml")
            }
        };
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                // The default location is optional; a named file is not.
                if explicit.is_some() {
                    eprintln!("mdweave: cannot read {}: {err}", path.display());
                }
                return None;
            }
        };
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("mdweave: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let o = overlay.output;
        if let Some(v) = o.indent_width {
            self.output.indent_width = v;
        }
        if let Some(v) = o.root_tag_name {
            self.output.root_tag_name = v;
        }
        if let Some(v) = o.include_root_tag {
            self.output.include_root_tag = v;
        }
        if let Some(v) = o.tag_case {
            self.output.tag_case = v;
        }

        let s = overlay.structure;
        if let Some(v) = s.path_to_tag_strategy {
            self.structure.path_to_tag_strategy = v;
        }
        if let Some(v) = s.lift_all_tags_to_root {
            self.structure.lift_all_tags_to_root = v;
        }
        if let Some(v) = s.inline_common_tags {
            self.structure.inline_common_tags = v;
        }
        merge_list(
            &mut self.structure.sort_tags_to_bottom,
            s.sort_tags_to_bottom,
            &s.remove_sort_tags_to_bottom,
            s.replace,
        );
    }

    /// Test helper: apply an overlay from a TOML string.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).expect("test overlay should parse");
        self.apply_overlay(overlay);
    }
}
