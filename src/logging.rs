//! Log output for the command-line tool.
//!
//! Lines look like `[14:02:11] [INFO] [vocab_deck::notes] - created 2 of 2 notes`.
//! Times are local.
//!
//! | Flags | Level |
//! |---|---|
//! | `-q` | warn |
//! | none | info |
//! | `-v` | debug |
//! | `-vv` | trace |
//!
//! `RUST_LOG` is applied after the flags and wins. HTTP and TLS crates are
//! capped at warn unless `RUST_LOG` names them.

use chrono::{Local, NaiveTime};
use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

const TIME_FORMAT: &str = "%H:%M:%S";

pub const NOISY_DEPENDENCIES: &[&str] = &["reqwest", "hyper", "hyper_util", "rustls"];

pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn stamp(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Install the global logger. A second call is a no-op.
pub fn init(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    builder.filter_level(level_for(verbose, quiet));
    for module in NOISY_DEPENDENCIES {
        builder.filter_module(module, LevelFilter::Warn);
    }
    builder.parse_env(Env::default());
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] [{}] [{}] - {}",
            stamp(Local::now().time()),
            record.level(),
            record.target(),
            record.args()
        )
    });
    let _ = builder.try_init();
}
