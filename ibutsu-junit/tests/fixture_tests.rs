// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use ibutsu_junit::{FailureDetail, Property, Report, TestCase, TestSuite};
use pretty_assertions::assert_eq;
use std::{fs::File, time::Duration};

#[test]
fn cypress_fragment() {
    let f = File::open("tests/fixtures/cypress_fragment.xml").expect("fixture exists");
    let report = Report::deserialize(f).expect("fixture parses");

    assert_eq!(report.name.as_deref(), Some("Mocha Tests"));
    assert_eq!((report.tests, report.failures, report.skipped), (4, 2, None));

    let inventory = &report.test_suites[1];
    assert_eq!(inventory.name, "Inventory");
    let names: Vec<_> = inventory.test_cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["lists systems", "filters by tag", "sorts by name", "exports to csv"]
    );

    // A teardown hook failure was attributed to the case that ran before it.
    let filters = &inventory.test_cases[1];
    assert_eq!(filters.failure_details.len(), 2);
    assert_eq!(filters.failure_details[1].ty, "CypressError");
    assert!(!filters.success());

    let mut copy = inventory.clone();
    copy.compute_aggregates();
    assert_eq!(copy.failures, Some(2));
    assert_eq!(copy.skipped, Some(1));
    assert_eq!(copy.time, Some(Duration::from_millis(2350)));
}

#[test]
fn merged_report_layout() {
    let report = merged_report();
    let xml = report.to_string().expect("serializing merged report succeeds");

    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.ends_with("</testsuites>\n"));
    let properties_at = xml.find("<properties>").expect("properties block written");
    let suite_at = xml.find("<testsuite ").expect("suite written");
    assert!(properties_at < suite_at, "properties precede suites");
    assert!(xml.contains(r#"<property key="source" value="local"/>"#));
    assert!(xml.contains(r#"<testsuites tests="2" failures="1" errors="0">"#));
    assert!(xml.contains(r#"success="false""#));

    let reparsed: Report = xml.parse().expect("merged report parses");
    assert_eq!(reparsed, report);
}

fn merged_report() -> Report {
    let mut report = Report::new();
    report.add_properties([
        Property::new("project", "sample-project"),
        Property::new("component", "sample-component"),
        Property::new("source", "local"),
        Property::new("env", ""),
    ]);

    let mut test_suite = TestSuite::new("Inventory");
    test_suite.set_file("cypress/e2e/inventory.cy.js").set_tests(2);

    let mut test_case = TestCase::new("lists systems");
    test_case.set_time(Duration::from_millis(1200));
    test_suite.add_test_case(test_case);

    let mut test_case = TestCase::new("filters by tag");
    test_case
        .add_failure_detail(FailureDetail::new(
            "expected 3 rows",
            "AssertionError",
            "AssertionError: expected 3 rows",
        ))
        .set_time(Duration::from_millis(800));
    test_suite.add_test_case(test_case);
    test_suite.compute_aggregates();

    report.add_test_suite(test_suite).set_failures(1);
    report
}
