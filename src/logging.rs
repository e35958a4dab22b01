//! Stderr logging for the command-line tool.

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Install the stderr logger.
///
/// Quiet by default so composed XML on stdout stays clean. `-v` raises the
/// level to info (one line per included file), `-vv` to debug (command
/// execution detail). Best-effort: a failed install leaves logging disabled
/// and composition proceeds.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}
