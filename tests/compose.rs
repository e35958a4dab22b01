//! End-to-end composition tests: real files, real subprocesses.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use mdweave::compose_to_xml;
use mdweave::config::{Config, PathToTagStrategy, TagCase};
use mdweave::resolve::scan_dependencies;

fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn xml_for(files: &[(&str, &str)], entry: &str, config: &Config) -> String {
    let dir = TempDir::new().unwrap();
    for (rel, content) in files {
        write_file(dir.path(), rel, content);
    }
    compose_to_xml(&dir.path().join(entry), config).unwrap()
}

fn default_xml(files: &[(&str, &str)], entry: &str) -> String {
    xml_for(files, entry, &Config::default_config())
}

macro_rules! error_test {
    ($name:ident, $content:expr, $message:expr) => {
        #[test]
        fn $name() {
            let dir = TempDir::new().unwrap();
            let entry = write_file(dir.path(), "doc.md", $content);
            let err = compose_to_xml(&entry, &Config::default_config()).unwrap_err();
            assert_eq!(err.to_string(), $message);
        }
    };
}

macro_rules! strategy_test {
    ($name:ident, $strategy:ident, $expected:expr) => {
        #[test]
        fn $name() {
            let mut config = Config::default_config();
            config.structure.path_to_tag_strategy = PathToTagStrategy::$strategy;
            let xml = xml_for(
                &[
                    ("root.md", "@docs/guides/intro/leaf.md\n"),
                    ("docs/guides/intro/leaf.md", "hi\n"),
                ],
                "root.md",
                &config,
            );
            assert_eq!(xml, $expected, "strategy {}", stringify!($strategy));
        }
    };
}

// ── Text and commands ──

#[test]
fn text_lines_become_text_elements() {
    let xml = default_xml(&[("doc.md", "alpha\n\nbeta\n")], "doc.md");
    assert_eq!(xml, "<text>alpha</text>\n<text>beta</text>");
}

#[test]
fn command_output_is_captured() {
    let xml = default_xml(&[("doc.md", "!echo hello\n")], "doc.md");
    assert_eq!(
        xml,
        "<echo>\n    <input>echo hello</input>\n    <stdout>hello</stdout>\n    <success code=\"0\"/>\n</echo>"
    );
}

#[test]
fn failing_commands_render_a_failed_marker() {
    let xml = default_xml(&[("doc.md", "!false\n")], "doc.md");
    assert_eq!(
        xml,
        "<false>\n    <input>false</input>\n    <stdout/>\n    <failed code=\"1\"/>\n</false>"
    );
}

#[test]
fn pipelines_mark_operators_and_suppress_consumed_stdout() {
    let xml = default_xml(&[("doc.md", "!echo hello | tr a-z A-Z\n")], "doc.md");
    assert_eq!(
        xml,
        "<echo>\n    <input>echo hello</input>\n    <stdout suppressed=\"true\"/>\n    <success code=\"0\"/>\n</echo>\n\
         <pipe-operator/>\n\
         <tr>\n    <input>tr a-z A-Z</input>\n    <stdout>HELLO</stdout>\n    <success code=\"0\"/>\n</tr>"
    );
}

#[test]
fn short_circuit_hides_the_unrun_side() {
    let xml = default_xml(&[("doc.md", "!false && echo never\n")], "doc.md");
    assert!(!xml.contains("never"));
    assert!(!xml.contains("logical-and-operator"));
    assert!(xml.contains("<failed code=\"1\"/>"));
}

#[test]
fn rescued_failure_keeps_both_sides() {
    let xml = default_xml(&[("doc.md", "!false || echo ok\n")], "doc.md");
    assert!(xml.contains("<logical-or-operator/>"));
    assert!(xml.contains("<stdout>ok</stdout>"));
}

#[test]
fn quoted_operators_are_not_split() {
    let xml = default_xml(&[("doc.md", "!echo 'a && b'\n")], "doc.md");
    assert!(!xml.contains("logical-and-operator"));
    assert!(xml.contains("<stdout>a &amp;&amp; b</stdout>"));
}

#[test]
fn stderr_appears_only_when_nonempty() {
    let with = default_xml(&[("doc.md", "!sh -c 'echo oops >&2'\n")], "doc.md");
    assert!(with.contains("<stderr>oops</stderr>"));
    assert!(with.contains("<success code=\"0\"/>"));

    let without = default_xml(&[("doc.md", "!echo fine\n")], "doc.md");
    assert!(!without.contains("<stderr>"));
}

#[test]
fn multiline_stdout_trims_only_trailing_newlines() {
    let xml = default_xml(&[("doc.md", "!printf 'one\\ntwo\\n\\n'\n")], "doc.md");
    assert!(xml.contains("<stdout>one\ntwo</stdout>"));
}

// ── References ──

#[test]
fn references_wrap_in_directory_tags() {
    let xml = default_xml(
        &[("root.md", "@sub/part.md\n"), ("sub/part.md", "inner\n")],
        "root.md",
    );
    assert_eq!(xml, "<sub>\n    <text>inner</text>\n</sub>");
}

#[test]
fn sibling_references_splice_bare() {
    let xml = default_xml(
        &[("root.md", "@part.md\n"), ("part.md", "inner\n")],
        "root.md",
    );
    assert_eq!(xml, "<text>inner</text>");
}

#[test]
fn parent_relative_references_tag_normal_segments_only() {
    let xml = default_xml(
        &[
            ("root.md", "@a/one.md\n"),
            ("a/one.md", "@../b/two.md\n"),
            ("b/two.md", "far\n"),
        ],
        "root.md",
    );
    assert_eq!(xml, "<a>\n    <b>\n        <text>far</text>\n    </b>\n</a>");
}

// ── Path-to-tag strategies ──

strategy_test!(
    strategy_all_keeps_every_segment,
    All,
    "<docs>\n    <guides>\n        <intro>\n            <text>hi</text>\n        </intro>\n    </guides>\n</docs>"
);
strategy_test!(
    strategy_head_keeps_the_first,
    Head,
    "<docs>\n    <text>hi</text>\n</docs>"
);
strategy_test!(
    strategy_tail_drops_the_first,
    Tail,
    "<guides>\n    <intro>\n        <text>hi</text>\n    </intro>\n</guides>"
);
strategy_test!(
    strategy_init_drops_the_last,
    Init,
    "<docs>\n    <guides>\n        <text>hi</text>\n    </guides>\n</docs>"
);
strategy_test!(
    strategy_last_keeps_the_last,
    Last,
    "<intro>\n    <text>hi</text>\n</intro>"
);
strategy_test!(strategy_none_wraps_nothing, None, "<text>hi</text>");

// ── Transform passes ──

#[test]
fn root_tag_wraps_the_document() {
    let mut config = Config::default_config();
    config.output.include_root_tag = true;
    config.output.root_tag_name = "context".to_string();
    let xml = xml_for(&[("doc.md", "alpha\n")], "doc.md", &config);
    assert_eq!(xml, "<context>\n    <text>alpha</text>\n</context>");
}

#[test]
fn lift_flattens_wrappers_and_command_groups() {
    let mut config = Config::default_config();
    config.structure.lift_all_tags_to_root = true;
    let xml = xml_for(
        &[
            ("root.md", "@sub/inner/leaf.md\n!true\n"),
            ("sub/inner/leaf.md", "deep\n"),
        ],
        "root.md",
        &config,
    );
    assert_eq!(
        xml,
        "<text>deep</text>\n<input>true</input>\n<stdout/>\n<success code=\"0\"/>"
    );
}

#[test]
fn inline_merges_same_named_wrappers() {
    let mut config = Config::default_config();
    config.structure.inline_common_tags = true;
    let xml = xml_for(
        &[
            ("root.md", "@sub/one.md\n@sub/two.md\n"),
            ("sub/one.md", "first\n"),
            ("sub/two.md", "second\n"),
        ],
        "root.md",
        &config,
    );
    assert_eq!(
        xml,
        "<sub>\n    <text>first</text>\n    <text>second</text>\n</sub>"
    );
}

#[test]
fn sort_moves_listed_tags_after_their_siblings() {
    let mut config = Config::default_config();
    config.structure.sort_tags_to_bottom = vec!["text".to_string()];
    let xml = xml_for(&[("doc.md", "alpha\n!echo mid\nbeta\n")], "doc.md", &config);
    assert_eq!(
        xml,
        "<echo>\n    <input>echo mid</input>\n    <stdout>mid</stdout>\n    <success code=\"0\"/>\n</echo>\n\
         <text>alpha</text>\n\
         <text>beta</text>"
    );
}

#[test]
fn pascal_casing_renames_tags_but_not_the_root() {
    let mut config = Config::default_config();
    config.output.tag_case = TagCase::Pascal;
    config.output.include_root_tag = true;
    config.output.root_tag_name = "docSet".to_string();
    let xml = xml_for(&[("doc.md", "alpha\n!false || echo ok\n")], "doc.md", &config);
    let expected = r#"<docSet>
    <Text>alpha</Text>
    <False>
        <Input>false</Input>
        <Stdout/>
        <Failed code="1"/>
    </False>
    <LogicalOrOperator/>
    <Echo>
        <Input>echo ok</Input>
        <Stdout>ok</Stdout>
        <Success code="0"/>
    </Echo>
</docSet>"#;
    assert_eq!(xml, expected);
}

#[test]
fn markup_in_text_is_escaped() {
    let xml = default_xml(&[("doc.md", "a < b & c\n")], "doc.md");
    assert_eq!(xml, "<text>a &lt; b &amp; c</text>");
}

#[test]
fn explicit_config_file_changes_the_output() {
    let dir = TempDir::new().unwrap();
    let conf = write_file(dir.path(), "weave.toml", "[output]\ntag_case = \"pascal\"\n");
    let entry = write_file(dir.path(), "doc.md", "alpha\n");
    let config = Config::load(Some(&conf));
    let xml = compose_to_xml(&entry, &config).unwrap();
    assert_eq!(xml, "<Text>alpha</Text>");
}

// ── Dependency scan ──

#[test]
fn scan_reports_the_file_graph_as_json() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "root.md", "@child.md\n\n@ghost.md\n");
    write_file(dir.path(), "child.md", "leaf\n");

    let report = scan_dependencies(&dir.path().join("root.md")).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["root"].as_str().unwrap().ends_with("root.md"));
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[1].as_str().unwrap().ends_with("child.md"));
    assert!(json["missing"][0].as_str().unwrap().ends_with("ghost.md"));
}

#[test]
fn scan_follows_include_commands() {
    let dir = TempDir::new().unwrap();
    let part = write_file(dir.path(), "part.md", "included\n");
    write_file(dir.path(), "sibling.md", "s\n");
    write_file(
        dir.path(),
        "root.md",
        &format!("!mdweave {}\n\n@sibling.md\n", part.display()),
    );

    let report = scan_dependencies(&dir.path().join("root.md")).unwrap();
    let names: Vec<_> = report.files.iter().filter_map(|p| p.file_name()).collect();
    assert_eq!(names, vec!["root.md", "part.md", "sibling.md"]);
}

// ── Failure modes ──

error_test!(
    unterminated_quote_is_fatal,
    "!echo 'oops\n",
    "line 1: unterminated single quote"
);
error_test!(
    redirection_is_rejected,
    "!ls > out.txt\n",
    "line 1: unsupported redirection `>`"
);
error_test!(
    both_stream_redirection_is_rejected,
    "!ls &> all.txt\n",
    "line 1: unsupported redirection `&>`"
);
error_test!(
    subshells_are_rejected,
    "!(cd /tmp)\n",
    "line 1: unsupported construct: subshell"
);
error_test!(
    sequences_are_rejected,
    "!ls ; pwd\n",
    "line 1: unsupported construct: compound list"
);
error_test!(
    background_jobs_are_rejected,
    "!sleep 5 &\n",
    "line 1: unsupported construct: compound list"
);
error_test!(
    parameter_expansion_is_rejected,
    "!echo $HOME\n",
    "line 1: unsupported parameter expansion `$HOME`"
);
error_test!(
    command_substitution_is_rejected,
    "!echo $(date)\n",
    "line 1: unsupported command substitution `$(date)`"
);
error_test!(
    empty_directives_are_fatal,
    "!\n",
    "line 1: empty command directive"
);
error_test!(
    references_must_be_markdown,
    "@notes.txt\n",
    "line 1: reference path must end in .md (got `notes.txt`)"
);

#[test]
fn error_lines_count_blanks_and_text() {
    let dir = TempDir::new().unwrap();
    let entry = write_file(dir.path(), "doc.md", "intro\n\n!ls > out.txt\n");
    let err = compose_to_xml(&entry, &Config::default_config()).unwrap_err();
    assert_eq!(err.to_string(), "line 3: unsupported redirection `>`");
}

#[test]
fn missing_references_abort_composition() {
    let dir = TempDir::new().unwrap();
    let entry = write_file(dir.path(), "doc.md", "@ghost.md\n");
    let err = compose_to_xml(&entry, &Config::default_config()).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("referenced file not found: "));
    assert!(message.ends_with("ghost.md"));
}

#[test]
fn include_cycles_draw_the_chain() {
    let dir = TempDir::new().unwrap();
    let b = write_file(dir.path(), "b.md", "@a.md\n");
    write_file(dir.path(), "a.md", &format!("!mdweave {}\n", b.display()));

    let err = compose_to_xml(&dir.path().join("a.md"), &Config::default_config()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("circular include detected"));
    assert!(message.contains("┌─"));
    assert!(message.contains("└─"));
    assert!(message.contains("a.md"));
    assert!(message.contains("b.md"));
}
