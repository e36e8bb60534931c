// Copyright (c) Anza Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Opt-in logging setup.
//!
//! The library itself only emits records through the [`log`] facade.
//! Applications and tests can call [`init_logging`] to print them.
//! Verbosity is controlled through the `RUST_LOG` environment variable.

use logforth::color::LevelColor;
use logforth::filter::EnvFilter;
use logforth::{Layout, append};

const DEFAULT_FILTER: &str = "info";

/// Prints the level, the emitting module and the message.
#[derive(Clone, Copy, Debug)]
struct CompactLayout;

impl Layout for CompactLayout {
    fn format(
        &self,
        record: &log::Record,
        _: &[Box<dyn logforth::Diagnostic>],
    ) -> anyhow::Result<Vec<u8>> {
        let colors = LevelColor::default();
        let level = colors.colorize_record_level(false, record.level());
        let target = record.target();
        let message = record.args();
        Ok(format!("{level:>5} {target}: {message}").into_bytes())
    }
}

/// Installs a logger writing compact lines to stderr.
pub fn init_logging() {
    init_with_append(append::Stderr::default().with_layout(CompactLayout));
}

/// Installs a logger writing to stderr with `logforth`'s default layout.
pub fn init_logging_stderr() {
    init_with_append(append::Stderr::default());
}

fn init_with_append<A: logforth::Append>(to_append: A) {
    let filter = EnvFilter::from_default_env_or(DEFAULT_FILTER);
    logforth::builder()
        .dispatch(|d| d.filter(filter).append(to_append))
        .apply();
}
