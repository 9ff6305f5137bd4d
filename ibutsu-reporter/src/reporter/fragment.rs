// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writes one report fragment to disk per run.

use super::{
    builder::{ReportBuilder, RunStats},
    events::{EventListener, RunnerEvent},
};
use crate::{
    config::ReporterOptions,
    errors::{DisplayErrorChain, WriteReportError},
};
use camino::{Utf8Path, Utf8PathBuf};
use ibutsu_junit::Report;
use std::io::{self, Write};
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

/// The placeholder in the output path replaced by a hash of the fragment's contents.
pub const HASH_PLACEHOLDER: char = '#';

/// An [`EventListener`] that builds a report for each run and writes it to the configured
/// output file.
///
/// Problems are logged and never stop the run: an out-of-order event is ignored, and a fragment
/// that can't be written is lost.
#[derive(Debug)]
pub struct FragmentReporter {
    builder: ReportBuilder,
    output_file: Utf8PathBuf,
    to_console: bool,
    last_fragment: Option<Utf8PathBuf>,
}

impl FragmentReporter {
    /// Creates a new reporter.
    pub fn new(options: &ReporterOptions) -> Self {
        Self::with_builder(ReportBuilder::new(options), options)
    }

    /// Creates a new reporter that uses the given builder.
    pub fn with_builder(builder: ReportBuilder, options: &ReporterOptions) -> Self {
        Self {
            builder,
            output_file: options.output_file.clone(),
            to_console: options.to_console,
            last_fragment: None,
        }
    }

    /// Returns the statistics for the run in progress, if any.
    pub fn stats(&self) -> Option<RunStats> {
        self.builder.stats()
    }

    /// Returns the path of the last fragment written, if any.
    pub fn last_fragment(&self) -> Option<&Utf8Path> {
        self.last_fragment.as_deref()
    }

    fn remove_stale_fragment(&self) {
        match std::fs::remove_file(&self.output_file) {
            Ok(()) => debug!("removed stale fragment {}", self.output_file),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                let error = WriteReportError::Fs {
                    file: self.output_file.clone(),
                    error,
                };
                warn!(
                    "failed to remove stale fragment: {}",
                    DisplayErrorChain::new(error)
                );
            }
        }
    }

    fn flush(&mut self, report: &Report) {
        let xml = match report.to_string() {
            Ok(xml) => xml,
            Err(error) => {
                let error = WriteReportError::from(error);
                warn!("error occurred when exporting results: {}", DisplayErrorChain::new(error));
                return;
            }
        };

        match write_fragment(&self.output_file, &xml) {
            Ok(path) => {
                debug!("wrote fragment to {path}");
                self.last_fragment = Some(path);
            }
            Err(error) => {
                warn!("error occurred when exporting results: {}", DisplayErrorChain::new(error));
            }
        }

        if self.to_console {
            let mut stdout = io::stdout().lock();
            if let Err(error) = stdout.write_all(xml.as_bytes()).and_then(|()| stdout.flush()) {
                warn!("failed to echo results to stdout: {error}");
            }
        }
    }
}

impl EventListener for FragmentReporter {
    fn handle_event(&mut self, event: RunnerEvent<'_>) {
        if let RunnerEvent::Start = event {
            self.remove_stale_fragment();
        }

        match self.builder.handle_event(event) {
            Ok(Some(report)) => self.flush(&report),
            Ok(None) => {}
            Err(error) => warn!("ignoring event: {error}"),
        }
    }
}

/// Returns the path a fragment with the given contents is written to.
pub fn fragment_path(output_file: &Utf8Path, xml: &str) -> Utf8PathBuf {
    let hash = format!("{:016x}", xxh3_64(xml.as_bytes()));
    output_file
        .as_str()
        .replacen(HASH_PLACEHOLDER, &hash, 1)
        .into()
}

fn write_fragment(output_file: &Utf8Path, xml: &str) -> Result<Utf8PathBuf, WriteReportError> {
    let path = fragment_path(output_file, xml);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|error| WriteReportError::Fs {
            file: dir.to_owned(),
            error,
        })?;
    }
    std::fs::write(&path, xml).map_err(|error| WriteReportError::Fs {
        file: path.clone(),
        error,
    })?;
    Ok(path)
}
