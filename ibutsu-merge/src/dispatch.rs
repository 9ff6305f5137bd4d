// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    exit_codes::MergeExitCode,
    output::{OutputContext, OutputOpts, clap_styles},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser};
use ibutsu_reporter::{
    config::{OptionOverrides, ReporterOptions},
    errors::DisplayErrorChain,
    merge::{MergeConfig, Merger},
};
use std::io::Write;
use tracing::{debug, warn};

/// Merges results of Cypress tests into one file, which can be uploaded to Ibutsu.
#[derive(Debug, Parser)]
#[command(version, name = "ibutsu-merge", styles = clap_styles::style())]
pub struct MergeApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    options: MergeOpts,
}

#[derive(Debug, Args)]
struct MergeOpts {
    /// Config file with a `reporterOptions` object (.json or .toml)
    #[arg(long, short, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// Name of the project
    #[arg(long, short)]
    project: Option<String>,

    /// Component being tested
    #[arg(long, short = 'm')]
    component: Option<String>,

    /// Path to the directory with results
    #[arg(long, short, value_name = "PATH")]
    directory: Option<Utf8PathBuf>,

    /// Source from which the tests were run
    #[arg(long, short)]
    source: Option<String>,

    /// Environment the tests were run in
    #[arg(long, short)]
    environment: Option<String>,

    /// Name of the exported file, without the `.ibutsu.xml` extension
    #[arg(long, short, value_name = "NAME", default_value = MergeConfig::DEFAULT_OUTPUT_NAME)]
    output: String,

    /// Directory to write the exported file to [default: the results directory]
    #[arg(long, value_name = "PATH")]
    output_dir: Option<Utf8PathBuf>,
}

impl MergeOpts {
    fn reporter_options(&self) -> Result<ReporterOptions> {
        let mut options = match &self.config {
            Some(config) => ReporterOptions::from_config_file(config)?,
            None => ReporterOptions::default(),
        };
        options.apply_overrides(OptionOverrides {
            project: self.project.clone(),
            component: self.component.clone(),
            source: self.source.clone(),
            environment: self.environment.clone(),
            output_dir: self.directory.clone(),
        });
        Ok(options)
    }

    fn merge_config(&self) -> Result<MergeConfig> {
        let options = self.reporter_options()?;
        let mut config = MergeConfig::from_options(&options)?;
        config.set_output_name(self.output.as_str());
        if let Some(output_dir) = &self.output_dir {
            config.set_output_dir(output_dir.clone());
        }
        Ok(config)
    }
}

impl MergeApp {
    /// Initializes logging and returns the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    ///
    /// With `--verbose`, the merged report is also written to `stdout`.
    pub fn exec(self, output: OutputContext, stdout: &mut dyn Write) -> Result<i32> {
        let config = self.options.merge_config()?;
        debug!(
            "merging fragments in {} with {:?}",
            config.input_dir(),
            config.properties()
        );

        let merger = Merger::new(config);
        let outcome = merger.run().map_err(ExpectedError::from)?;

        if output.verbose {
            if let Err(error) = writeln!(stdout, "{}", outcome.xml).and_then(|()| stdout.flush()) {
                warn!("failed to write merged results to stdout: {error}");
            }
        }

        if let Err(error) = merger.write(&outcome) {
            warn!("cannot write results file: {}", DisplayErrorChain::new(error));
        }

        Ok(MergeExitCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use clap::CommandFactory;
    use ibutsu_junit::Report;
    use pretty_assertions::assert_eq;

    static FRAGMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites name="Mocha Tests" time="0.250" tests="1" failures="0" errors="0">
  <testsuite name="Smoke" tests="1" file="cypress/e2e/smoke.cy.js" timestamp="2024-03-01T12:30:00" failures="0" time="0.250">
    <testcase name="loads" time="0.250" failure="false" error="false" success="true"/>
  </testsuite>
</testsuites>
"#;

    fn output() -> OutputContext {
        OutputContext {
            verbose: false,
            color: crate::output::Color::Never,
        }
    }

    fn parse(args: &[&str]) -> MergeApp {
        MergeApp::try_parse_from(std::iter::once("ibutsu-merge").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn verify_app() {
        MergeApp::command().debug_assert();
    }

    #[test]
    fn cli_overrides_config_file() {
        let dir = tempdir().expect("tempdir created");
        let config_file = dir.path().join("cypress.config.json");
        std::fs::write(
            &config_file,
            r#"{ "reporterOptions": { "project": "from-file", "component": "frontend", "outputDir": "from-file" } }"#,
        )
        .expect("config written");

        let app = parse(&[
            "--config",
            config_file.as_str(),
            "-p",
            "from-cli",
            "-d",
            "results",
            "-e",
            "stage",
        ]);
        let options = app.options.reporter_options().expect("options resolve");
        assert_eq!(options.project.as_deref(), Some("from-cli"));
        assert_eq!(options.component.as_deref(), Some("frontend"));
        assert_eq!(options.environment.as_deref(), Some("stage"));
        assert_eq!(options.output_dir.as_deref().map(|dir| dir.as_str()), Some("results"));

        let config = app.options.merge_config().expect("config builds");
        assert_eq!(config.output_path().as_str(), "results/merged.ibutsu.xml");
    }

    #[test]
    fn missing_directory_is_a_setup_error() {
        let error = parse(&[])
            .exec(output(), &mut Vec::<u8>::new())
            .expect_err("directory is required");
        assert!(matches!(error, ExpectedError::InputDirectoryNotSet));
        assert_eq!(error.process_exit_code(), MergeExitCode::SETUP_ERROR);
    }

    #[test]
    fn unreadable_directory_exit_code() {
        let dir = tempdir().expect("tempdir created");
        let missing = dir.path().join("missing");
        let error = parse(&["-d", missing.as_str()])
            .exec(output(), &mut Vec::<u8>::new())
            .expect_err("directory doesn't exist");
        assert_eq!(error.process_exit_code(), MergeExitCode::INPUT_DIRECTORY_ERROR);
    }

    #[test]
    fn merges_and_echoes_when_verbose() {
        let dir = tempdir().expect("tempdir created");
        std::fs::write(dir.path().join("tmp-1.xml"), FRAGMENT).expect("fragment written");
        let out_dir = dir.path().join("upload");

        let mut stdout = Vec::new();
        let code = parse(&[
            "-d",
            dir.path().as_str(),
            "-o",
            "nightly",
            "--output-dir",
            out_dir.as_str(),
            "-s",
            "build-42",
        ])
        .exec(
            OutputContext {
                verbose: true,
                ..output()
            },
            &mut stdout,
        )
        .expect("merge succeeds");
        assert_eq!(code, MergeExitCode::OK);

        let written = std::fs::read_to_string(out_dir.join("nightly.ibutsu.xml"))
            .expect("merged report written");
        assert_eq!(String::from_utf8(stdout).expect("stdout is UTF-8"), format!("{written}\n"));

        let report: Report = written.parse().expect("merged report parses");
        assert_eq!(report.tests, 1);
        assert_eq!(report.properties[2].value, "build-42");
    }

    #[test]
    fn write_failure_still_exits_ok() {
        let dir = tempdir().expect("tempdir created");
        std::fs::write(dir.path().join("tmp-1.xml"), FRAGMENT).expect("fragment written");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").expect("file written");

        let code = parse(&[
            "-d",
            dir.path().as_str(),
            "--output-dir",
            blocker.join("out").as_str(),
        ])
        .exec(output(), &mut Vec::<u8>::new())
        .expect("merge succeeds");
        assert_eq!(code, MergeExitCode::OK);
    }
}
