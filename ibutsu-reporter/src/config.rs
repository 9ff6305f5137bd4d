// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the reporter and the merger.
//!
//! Both read the same `reporterOptions` object. Options can come from a config file (JSON or
//! TOML), and values supplied directly (for example on the command line) take precedence over
//! the file.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

/// Options shared by the reporter and the merger.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReporterOptions {
    /// The project name sent to Ibutsu.
    pub project: Option<String>,

    /// The component under test.
    pub component: Option<String>,

    /// Where the tests were run from, e.g. a CI build identifier.
    pub source: Option<String>,

    /// The environment the tests were run in.
    #[serde(alias = "env")]
    pub environment: Option<String>,

    /// The directory holding fragments to merge.
    pub output_dir: Option<Utf8PathBuf>,

    /// Where the reporter writes its fragment. A `#` is replaced by a hash of the contents.
    pub output_file: Utf8PathBuf,

    /// Whether pending tests are written to the fragment as skipped cases.
    pub include_pending: bool,

    /// Whether the reporter echoes each fragment to standard output.
    pub to_console: bool,

    /// The name used for the root suite, whose own title is empty.
    pub root_suite_title: String,

    /// The name of the root `<testsuites>` element in fragments.
    pub testsuites_title: String,

    /// Whether suite names include the titles of their ancestors.
    pub use_full_suite_title: bool,

    /// The separator between titles when `use_full_suite_title` is set.
    pub suite_title_separated_by: String,
}

impl ReporterOptions {
    /// The default fragment location.
    pub const DEFAULT_OUTPUT_FILE: &'static str = "cypress/results/tmp-#.xml";

    /// The substring identifying fragment files. The default output file name contains it.
    pub const FRAGMENT_MARKER: &'static str = "tmp";

    /// The default root suite title.
    pub const DEFAULT_ROOT_SUITE_TITLE: &'static str = "Root Suite";

    /// The default name of the root element.
    pub const DEFAULT_TESTSUITES_TITLE: &'static str = "Mocha Tests";

    /// Reads options from the `reporterOptions` object of a JSON or TOML config file.
    ///
    /// The format is chosen by file extension. Fields missing from the file take their default
    /// values.
    pub fn from_config_file(config_file: &Utf8Path) -> Result<Self, ConfigParseError> {
        let contents = std::fs::read_to_string(config_file)
            .map_err(|error| ConfigParseError::new(config_file, ConfigParseErrorKind::Read(error)))?;

        let parsed: ConfigFile = match config_file.extension() {
            Some("json") => {
                let deserializer = &mut serde_json::Deserializer::from_str(&contents);
                serde_path_to_error::deserialize(deserializer)
                    .map_err(|error| ConfigParseError::new(config_file, error.into()))?
            }
            Some("toml") => toml::from_str(&contents)
                .map_err(|error| ConfigParseError::new(config_file, error.into()))?,
            other => {
                return Err(ConfigParseError::new(
                    config_file,
                    ConfigParseErrorKind::UnsupportedFormat {
                        extension: other.unwrap_or_default().to_owned(),
                    },
                ));
            }
        };

        debug!("read reporter options from {config_file}");
        Ok(parsed.reporter_options)
    }

    /// Applies values supplied directly, which take precedence over the config file.
    pub fn apply_overrides(&mut self, overrides: OptionOverrides) -> &mut Self {
        let OptionOverrides {
            project,
            component,
            source,
            environment,
            output_dir,
        } = overrides;

        if project.is_some() {
            self.project = project;
        }
        if component.is_some() {
            self.component = component;
        }
        if source.is_some() {
            self.source = source;
        }
        if environment.is_some() {
            self.environment = environment;
        }
        if output_dir.is_some() {
            self.output_dir = output_dir;
        }
        self
    }
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            project: None,
            component: None,
            source: None,
            environment: None,
            output_dir: None,
            output_file: Self::DEFAULT_OUTPUT_FILE.into(),
            include_pending: false,
            to_console: false,
            root_suite_title: Self::DEFAULT_ROOT_SUITE_TITLE.to_owned(),
            testsuites_title: Self::DEFAULT_TESTSUITES_TITLE.to_owned(),
            use_full_suite_title: false,
            suite_title_separated_by: " ".to_owned(),
        }
    }
}

/// Values supplied directly to the merger, overriding the config file.
#[derive(Clone, Debug, Default)]
pub struct OptionOverrides {
    /// Overrides [`ReporterOptions::project`].
    pub project: Option<String>,
    /// Overrides [`ReporterOptions::component`].
    pub component: Option<String>,
    /// Overrides [`ReporterOptions::source`].
    pub source: Option<String>,
    /// Overrides [`ReporterOptions::environment`].
    pub environment: Option<String>,
    /// Overrides [`ReporterOptions::output_dir`].
    pub output_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default)]
    reporter_options: ReporterOptions,
}
