// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the reporter and merger.

use camino::Utf8PathBuf;
use ibutsu_junit::{DeserializeError, SerializeError};
use std::{error::Error, fmt, io};
use thiserror::Error;

/// An error that occurred while reading a config file.
#[derive(Debug, Error)]
#[error("failed to parse config file `{config_file}`")]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of [`ConfigParseError`] that occurred.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// The file doesn't exist or couldn't be read.
    #[error("config file doesn't exist or isn't readable")]
    Read(#[source] io::Error),

    /// The file isn't valid JSON, or doesn't match the expected shape.
    #[error("error deserializing JSON")]
    Json(#[from] serde_path_to_error::Error<serde_json::Error>),

    /// The file isn't valid TOML, or doesn't match the expected shape.
    #[error("error deserializing TOML")]
    Toml(#[from] toml::de::Error),

    /// The file extension isn't one of the supported formats.
    #[error("unsupported config file format `{extension}` (expected `json` or `toml`)")]
    UnsupportedFormat {
        /// The extension found, or an empty string if there was none.
        extension: String,
    },
}

/// An event was delivered to the report builder in an order it cannot handle.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BuildError {
    /// An event other than `start` arrived before the run started.
    #[error("`{event}` event received before `start`")]
    NotStarted {
        /// The name of the event.
        event: &'static str,
    },

    /// A test event arrived while no suite was open.
    #[error("`{event}` event received with no open suite")]
    NoOpenSuite {
        /// The name of the event.
        event: &'static str,
    },
}

/// An error that occurred while writing a report to disk.
#[derive(Debug, Error)]
pub enum WriteReportError {
    /// The report could not be serialized.
    #[error("error serializing report")]
    Serialize(#[from] SerializeError),

    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },
}

/// An error that stops a merge before any output is written.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The input directory was not specified on the command line or in the config file.
    #[error("directory with test results wasn't set")]
    InputDirectoryNotSet,

    /// The input directory doesn't exist or couldn't be listed.
    #[error("directory `{dir}` doesn't exist or permissions aren't set correctly")]
    InputDirectory {
        /// The input directory.
        dir: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// A fragment couldn't be read.
    #[error("cannot read contents of `{file}`")]
    FragmentRead {
        /// The fragment file.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// A fragment isn't a well-formed report.
    #[error("fragment `{file}` is not a valid report")]
    FragmentParse {
        /// The fragment file.
        file: Utf8PathBuf,

        /// The underlying parse error.
        #[source]
        error: DeserializeError,
    },

    /// The merged report couldn't be serialized.
    #[error("error serializing merged report")]
    Serialize(#[from] SerializeError),
}

/// Displays an error followed by its chain of causes on one line each.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        let mut source = self.error.source();
        while let Some(error) = source {
            write!(f, "\n  caused by: {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
