// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::config::ReporterOptions;
use ibutsu_junit::Property;

/// Metadata attached to a merged report for upload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadProperties {
    /// The project the results belong to.
    pub project: String,

    /// The component under test.
    pub component: String,

    /// Where the tests were run from.
    pub source: String,

    /// The environment the tests were run in. May be empty.
    pub env: String,
}

impl UploadProperties {
    /// Used when no project is configured.
    pub const DEFAULT_PROJECT: &'static str = "sample-project";

    /// Used when no component is configured.
    pub const DEFAULT_COMPONENT: &'static str = "sample-component";

    /// Used when no source is configured and none of [`Self::SOURCE_ENV_VARS`] is set.
    pub const DEFAULT_SOURCE: &'static str = "local";

    /// Environment variables consulted for the source, in order.
    pub const SOURCE_ENV_VARS: [&'static str; 2] = ["BUILD_TAG", "RUNNER_TRACKING_ID"];

    /// Resolves properties from options, falling back to the process environment and then to
    /// defaults.
    pub fn resolve(options: &ReporterOptions) -> Self {
        Self::resolve_with_env(options, |name| std::env::var(name).ok())
    }

    /// Resolves properties using `env` to look up environment variables.
    ///
    /// Empty environment variables are treated as unset.
    pub fn resolve_with_env(
        options: &ReporterOptions,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let source = options.source.clone().or_else(|| {
            Self::SOURCE_ENV_VARS
                .into_iter()
                .find_map(|name| env(name).filter(|value| !value.is_empty()))
        });

        Self {
            project: options
                .project
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_PROJECT.to_owned()),
            component: options
                .component
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_COMPONENT.to_owned()),
            source: source.unwrap_or_else(|| Self::DEFAULT_SOURCE.to_owned()),
            env: options.environment.clone().unwrap_or_default(),
        }
    }

    /// Returns the properties in the order they are written.
    pub fn to_properties(&self) -> [Property; 4] {
        [
            Property::new("project", &self.project),
            Property::new("component", &self.component),
            Property::new("source", &self.source),
            Property::new("env", &self.env),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn resolve_source(option: Option<&str>, vars: &[(&str, &str)]) -> String {
        let options = ReporterOptions {
            source: option.map(str::to_owned),
            ..ReporterOptions::default()
        };
        UploadProperties::resolve_with_env(&options, |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
        })
        .source
    }

    #[test_case(None, &[], "local" ; "nothing set")]
    #[test_case(None, &[("BUILD_TAG", "build-42")], "build-42" ; "build tag")]
    #[test_case(None, &[("RUNNER_TRACKING_ID", "runner-7")], "runner-7" ; "runner id")]
    #[test_case(
        None,
        &[("RUNNER_TRACKING_ID", "runner-7"), ("BUILD_TAG", "build-42")],
        "build-42"
        ; "build tag before runner id"
    )]
    #[test_case(None, &[("BUILD_TAG", ""), ("RUNNER_TRACKING_ID", "runner-7")], "runner-7" ; "empty var is unset")]
    #[test_case(Some("nightly"), &[("BUILD_TAG", "build-42")], "nightly" ; "option wins")]
    fn source_precedence(option: Option<&str>, vars: &[(&str, &str)], expected: &str) {
        assert_eq!(resolve_source(option, vars), expected);
    }

    #[test]
    fn defaults_and_order() {
        let options = ReporterOptions {
            environment: Some("stage".to_owned()),
            ..ReporterOptions::default()
        };
        let properties = UploadProperties::resolve_with_env(&options, |_| None);
        let pairs: Vec<_> = properties
            .to_properties()
            .into_iter()
            .map(|property| (property.key, property.value))
            .collect();
        assert_eq!(
            pairs,
            [
                ("project".to_owned(), "sample-project".to_owned()),
                ("component".to_owned(), "sample-component".to_owned()),
                ("source".to_owned(), "local".to_owned()),
                ("env".to_owned(), "stage".to_owned()),
            ]
        );
    }
}
