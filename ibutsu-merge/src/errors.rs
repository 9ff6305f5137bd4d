// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{exit_codes::MergeExitCode, output::StderrStyles};
use camino::Utf8PathBuf;
use ibutsu_junit::{DeserializeError, SerializeError};
use ibutsu_reporter::errors::{ConfigParseError, MergeError};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholder messages: errors are expected to be printed out with
// display_to_stderr, which colorizes them.

/// An error that stops a merge, with a documented exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("input directory not set")]
    InputDirectoryNotSet,
    #[error("input directory unreadable")]
    InputDirectoryError {
        dir: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("fragment read error")]
    FragmentReadError {
        file: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("fragment parse error")]
    FragmentParseError {
        file: Utf8PathBuf,
        #[source]
        err: DeserializeError,
    },
    #[error("serialize failed")]
    SerializeFailed {
        #[source]
        err: SerializeError,
    },
}

impl From<MergeError> for ExpectedError {
    fn from(error: MergeError) -> Self {
        match error {
            MergeError::InputDirectoryNotSet => Self::InputDirectoryNotSet,
            MergeError::InputDirectory { dir, error } => Self::InputDirectoryError { dir, err: error },
            MergeError::FragmentRead { file, error } => Self::FragmentReadError { file, err: error },
            MergeError::FragmentParse { file, error } => {
                Self::FragmentParseError { file, err: error }
            }
            MergeError::Serialize(err) => Self::SerializeFailed { err },
        }
    }
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } | Self::InputDirectoryNotSet => {
                MergeExitCode::SETUP_ERROR
            }
            Self::InputDirectoryError { .. } => MergeExitCode::INPUT_DIRECTORY_ERROR,
            Self::FragmentReadError { .. } | Self::FragmentParseError { .. } => {
                MergeExitCode::FRAGMENT_PARSE_FAILED
            }
            Self::SerializeFailed { .. } => MergeExitCode::SERIALIZE_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse config file `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::InputDirectoryNotSet => {
                tracing::error!(
                    "directory with test results wasn't set (hint: pass {} or set {} in the config file)",
                    "--directory".style(styles.bold),
                    "reporterOptions.outputDir".style(styles.bold),
                );
                None
            }
            Self::InputDirectoryError { dir, err } => {
                tracing::error!(
                    "directory `{}` doesn't exist or permissions aren't set correctly",
                    dir.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::FragmentReadError { file, err } => {
                tracing::error!(
                    "cannot read contents of `{}`",
                    file.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::FragmentParseError { file, err } => {
                tracing::error!(
                    "fragment `{}` is not a valid report",
                    file.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::SerializeFailed { err } => {
                tracing::error!("failed to serialize merged report");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: "ibutsu_merge::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn merge_errors_map_to_exit_codes() {
        let io_error = || io::Error::new(io::ErrorKind::NotFound, "not found");
        let cases = [
            (MergeError::InputDirectoryNotSet, MergeExitCode::SETUP_ERROR),
            (
                MergeError::InputDirectory {
                    dir: "results".into(),
                    error: io_error(),
                },
                MergeExitCode::INPUT_DIRECTORY_ERROR,
            ),
            (
                MergeError::FragmentRead {
                    file: "results/tmp-1.xml".into(),
                    error: io_error(),
                },
                MergeExitCode::FRAGMENT_PARSE_FAILED,
            ),
            (
                MergeError::Serialize(SerializeError::Io(io_error())),
                MergeExitCode::SERIALIZE_FAILED,
            ),
        ];

        for (error, expected) in cases {
            let description = error.to_string();
            assert_eq!(
                ExpectedError::from(error).process_exit_code(),
                expected,
                "exit code for {description}"
            );
        }
    }
}
