// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merges report fragments into a single report for upload.
//!
//! A merge runs in two steps. [`Merger::run`] discovers and reads every fragment, and fails on
//! the first one that can't be read or parsed. [`Merger::write`] then writes the merged report;
//! callers typically log a failure there rather than abort.

mod aggregator;
mod discovery;
mod properties;

pub use aggregator::*;
pub use discovery::*;
pub use properties::*;

use crate::{
    config::ReporterOptions,
    errors::{MergeError, WriteReportError},
};
use camino::{Utf8Path, Utf8PathBuf};
use ibutsu_junit::Report;
use tracing::{debug, info};

/// Where to read fragments from and where to write the merged report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MergeConfig {
    input_dir: Utf8PathBuf,
    output_dir: Utf8PathBuf,
    output_name: String,
    marker: String,
    properties: UploadProperties,
}

impl MergeConfig {
    /// The default name of the merged report, without its extension.
    pub const DEFAULT_OUTPUT_NAME: &'static str = "merged";

    /// The extension appended to the output name.
    pub const OUTPUT_EXTENSION: &'static str = "ibutsu.xml";

    /// Builds a config from resolved options.
    ///
    /// Fragments are read from `outputDir`, which must be set. The merged report is written to
    /// the same directory as `merged.ibutsu.xml` unless changed.
    pub fn from_options(options: &ReporterOptions) -> Result<Self, MergeError> {
        let input_dir = options
            .output_dir
            .clone()
            .ok_or(MergeError::InputDirectoryNotSet)?;
        Ok(Self {
            output_dir: input_dir.clone(),
            input_dir,
            output_name: Self::DEFAULT_OUTPUT_NAME.to_owned(),
            marker: ReporterOptions::FRAGMENT_MARKER.to_owned(),
            properties: UploadProperties::resolve(options),
        })
    }

    /// Sets the name of the merged report, without its extension.
    pub fn set_output_name(&mut self, output_name: impl Into<String>) -> &mut Self {
        self.output_name = output_name.into();
        self
    }

    /// Sets the directory the merged report is written to.
    pub fn set_output_dir(&mut self, output_dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Replaces the upload properties.
    pub fn set_properties(&mut self, properties: UploadProperties) -> &mut Self {
        self.properties = properties;
        self
    }

    /// Returns the directory fragments are read from.
    pub fn input_dir(&self) -> &Utf8Path {
        &self.input_dir
    }

    /// Returns the upload properties.
    pub fn properties(&self) -> &UploadProperties {
        &self.properties
    }

    /// Returns the path the merged report is written to.
    pub fn output_path(&self) -> Utf8PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.output_name, Self::OUTPUT_EXTENSION))
    }
}

/// The result of a successful [`Merger::run`].
#[derive(Clone, Debug)]
pub struct MergeOutcome {
    /// The merged report.
    pub report: Report,

    /// The merged report, serialized.
    pub xml: String,

    /// The fragments that were merged, in order.
    pub fragments: Vec<Utf8PathBuf>,
}

/// Merges the fragments in a directory.
#[derive(Clone, Debug)]
pub struct Merger {
    config: MergeConfig,
}

impl Merger {
    /// Creates a new merger.
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Returns the config this merger was created with.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Reads and merges every fragment. Nothing is written.
    pub fn run(&self) -> Result<MergeOutcome, MergeError> {
        let fragments = discover_fragments(&self.config.input_dir, &self.config.marker)?;

        let mut aggregator = ReportAggregator::new();
        for file in &fragments {
            debug!("reading fragment {file}");
            aggregator.add_fragment(read_fragment(file)?);
        }

        let totals = aggregator.totals();
        info!(
            "merged {} fragments ({} tests, {} failures, {} skipped)",
            aggregator.fragment_count(),
            totals.tests,
            totals.failures,
            totals.skipped,
        );

        let report = aggregator.finish(&self.config.properties);
        let xml = report.to_string()?;
        Ok(MergeOutcome {
            report,
            xml,
            fragments,
        })
    }

    /// Writes the merged report, creating the output directory if needed.
    pub fn write(&self, outcome: &MergeOutcome) -> Result<Utf8PathBuf, WriteReportError> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(|error| WriteReportError::Fs {
            file: self.config.output_dir.clone(),
            error,
        })?;
        let path = self.config.output_path();
        std::fs::write(&path, &outcome.xml).map_err(|error| WriteReportError::Fs {
            file: path.clone(),
            error,
        })?;
        info!("wrote merged report to {path}");
        Ok(path)
    }
}

fn read_fragment(file: &Utf8Path) -> Result<Report, MergeError> {
    let contents = std::fs::read_to_string(file).map_err(|error| MergeError::FragmentRead {
        file: file.to_owned(),
        error,
    })?;
    contents
        .parse()
        .map_err(|error| MergeError::FragmentParse {
            file: file.to_owned(),
            error,
        })
}
