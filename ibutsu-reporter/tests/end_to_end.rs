// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs events through the reporter and merges the fragments it writes.

use camino_tempfile::tempdir;
use ibutsu_reporter::{
    config::ReporterOptions,
    merge::{MergeConfig, Merger},
    reporter::{EventListener, FailureInfo, FragmentReporter, RunnerEvent, SuiteInfo, TestInfo},
};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn reporter_fragments_merge_into_one_report() {
    let dir = tempdir().expect("tempdir created");
    let options = ReporterOptions {
        output_dir: Some(dir.path().to_owned()),
        output_file: dir.path().join("tmp-#.xml"),
        include_pending: true,
        environment: Some("stage".to_owned()),
        source: Some("pipeline-17".to_owned()),
        ..ReporterOptions::default()
    };

    // First test file: a teardown hook fails after a passing test.
    let root = SuiteInfo::root()
        .with_file("cypress/e2e/login.cy.js")
        .with_suites(1);
    let login = SuiteInfo::new("Login")
        .with_tests(2)
        .with_ancestors([""]);
    let shows_form = TestInfo::new("shows the form").with_duration(Duration::from_millis(300));
    let logs_in = TestInfo::new("logs in").with_duration(Duration::from_millis(700));
    let after_each = TestInfo::new(r#""after each" hook for "logs in""#);
    let cleanup = FailureInfo::new("session not cleared")
        .with_name("Error")
        .with_stack("Error: session not cleared\n    at Context.<anonymous>");

    let mut reporter = FragmentReporter::new(&options);
    for event in [
        RunnerEvent::Start,
        RunnerEvent::SuiteEnter(&root),
        RunnerEvent::SuiteEnter(&login),
        RunnerEvent::TestPass(&shows_form),
        RunnerEvent::TestPass(&logs_in),
        RunnerEvent::TestFail(&after_each, &cleanup),
        RunnerEvent::End,
    ] {
        reporter.handle_event(event);
    }
    let first = reporter.last_fragment().expect("first fragment").to_owned();

    // Second test file: a setup hook fails and one test is pending.
    let settings = SuiteInfo::new("Settings")
        .with_file("cypress/e2e/settings.cy.js")
        .with_tests(2);
    let before_each = TestInfo::new(r#""before each" hook for "saves profile""#);
    let later = TestInfo::new("deletes account");
    let timeout = FailureInfo::new("Timed out retrying").with_name("CypressError");

    let mut reporter = FragmentReporter::new(&options);
    for event in [
        RunnerEvent::Start,
        RunnerEvent::SuiteEnter(&settings),
        RunnerEvent::TestFail(&before_each, &timeout),
        RunnerEvent::TestPending(&later),
        RunnerEvent::End,
    ] {
        reporter.handle_event(event);
    }
    let second = reporter.last_fragment().expect("second fragment").to_owned();
    assert_ne!(first, second);

    let merger = Merger::new(MergeConfig::from_options(&options).expect("input dir set"));
    let outcome = merger.run().expect("merge succeeds");
    let mut expected_fragments = vec![first, second];
    expected_fragments.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    assert_eq!(outcome.fragments, expected_fragments);

    let report = &outcome.report;
    assert_eq!((report.tests, report.failures), (4, 2));
    assert_eq!(report.skipped, Some(1));

    let login_suite = report
        .test_suites
        .iter()
        .find(|test_suite| test_suite.name == "Login")
        .expect("Login suite merged");
    assert_eq!(login_suite.file.as_deref(), Some("cypress/e2e/login.cy.js"));
    let logs_in_case = &login_suite.test_cases[1];
    assert_eq!(logs_in_case.name, "logs in");
    assert!(!logs_in_case.success());
    assert_eq!(logs_in_case.failure_details[0].ty, "Error");

    let settings_suite = report
        .test_suites
        .iter()
        .find(|test_suite| test_suite.name == "Settings")
        .expect("Settings suite merged");
    let names: Vec<_> = settings_suite
        .test_cases
        .iter()
        .map(|test_case| test_case.name.as_str())
        .collect();
    assert_eq!(names, ["saves profile", "deletes account"]);
    assert!(settings_suite.test_cases[1].skipped);

    assert!(outcome.xml.contains(r#"<property key="source" value="pipeline-17"/>"#));
    assert!(outcome.xml.contains(r#"<property key="env" value="stage"/>"#));
}
