// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::UploadProperties;
use ibutsu_junit::{Report, TestSuite};
use tracing::debug;

/// Totals accumulated from the root attributes of each fragment.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MergeTotals {
    /// The sum of `tests`.
    pub tests: usize,

    /// The sum of `failures`.
    pub failures: usize,

    /// The sum of `skipped`, counting a missing attribute as zero.
    pub skipped: usize,
}

/// Combines fragments into a single report.
///
/// Totals come from each fragment's root attributes and are not recomputed from the cases, so
/// tests that were counted but not written (such as excluded pending tests) are still counted.
#[derive(Clone, Debug, Default)]
pub struct ReportAggregator {
    totals: MergeTotals,
    test_suites: Vec<TestSuite>,
    fragment_count: usize,
}

impl ReportAggregator {
    /// Creates a new, empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment.
    ///
    /// A suite without a file inherits the file of the nearest preceding suite in the same
    /// fragment. Suites without test cases are dropped.
    pub fn add_fragment(&mut self, fragment: Report) -> &mut Self {
        self.totals.tests += fragment.tests;
        self.totals.failures += fragment.failures;
        self.totals.skipped += fragment.skipped.unwrap_or_default();
        self.fragment_count += 1;

        let mut last_file: Option<String> = None;
        for mut test_suite in fragment.test_suites {
            if let Some(file) = &test_suite.file {
                last_file = Some(file.clone());
            } else {
                test_suite.file.clone_from(&last_file);
            }

            if test_suite.test_cases.is_empty() {
                debug!(suite = %test_suite.name, "dropping suite without test cases");
            } else {
                self.test_suites.push(test_suite);
            }
        }
        self
    }

    /// Returns the totals accumulated so far.
    pub fn totals(&self) -> MergeTotals {
        self.totals
    }

    /// Returns the number of fragments added so far.
    pub fn fragment_count(&self) -> usize {
        self.fragment_count
    }

    /// Produces the merged report, with the upload properties ahead of the suites.
    pub fn finish(self, properties: &UploadProperties) -> Report {
        let mut report = Report::new();
        report
            .add_properties(properties.to_properties())
            .set_failures(self.totals.failures)
            .set_skipped(self.totals.skipped);
        report.tests = self.totals.tests;
        report.test_suites = self.test_suites;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibutsu_junit::TestCase;
    use pretty_assertions::assert_eq;
    use proptest::{collection::vec, prelude::*};

    fn properties() -> UploadProperties {
        UploadProperties {
            project: "insights".to_owned(),
            component: "frontend".to_owned(),
            source: "local".to_owned(),
            env: String::new(),
        }
    }

    fn suite(name: &str, file: Option<&str>, cases: usize) -> TestSuite {
        let mut test_suite = TestSuite::new(name);
        test_suite.file = file.map(str::to_owned);
        test_suite.set_tests(cases);
        for index in 0..cases {
            test_suite.add_test_case(TestCase::new(format!("{name} case {index}")));
        }
        test_suite
    }

    fn fragment(tests: usize, failures: usize, skipped: usize, suites: Vec<TestSuite>) -> Report {
        let mut report = Report::new();
        report.set_name("Mocha Tests").set_failures(failures).set_skipped(skipped);
        report.tests = tests;
        report.test_suites = suites;
        report
    }

    fn suite_names(report: &Report) -> Vec<&str> {
        report
            .test_suites
            .iter()
            .map(|test_suite| test_suite.name.as_str())
            .collect()
    }

    #[test]
    fn totals_are_summed_from_fragments() {
        let mut aggregator = ReportAggregator::new();
        aggregator
            .add_fragment(fragment(4, 1, 0, vec![suite("A", Some("a.cy.js"), 1)]))
            .add_fragment(fragment(3, 2, 2, vec![suite("B", Some("b.cy.js"), 1)]));
        assert_eq!(
            aggregator.totals(),
            MergeTotals {
                tests: 7,
                failures: 3,
                skipped: 2,
            }
        );
        assert_eq!(aggregator.fragment_count(), 2);

        let report = aggregator.finish(&properties());
        assert_eq!((report.tests, report.failures, report.errors), (7, 3, 0));
        assert_eq!(report.skipped, Some(2));
        assert_eq!(report.name, None);
        assert_eq!(report.time, None);
        assert_eq!(report.properties.len(), 4);
    }

    #[test]
    fn zero_skipped_is_omitted() {
        let mut aggregator = ReportAggregator::new();
        aggregator.add_fragment(fragment(1, 0, 0, vec![suite("A", None, 1)]));
        assert_eq!(aggregator.finish(&properties()).skipped, None);
    }

    #[test]
    fn single_fragment_keeps_suites() {
        let original = fragment(
            2,
            0,
            0,
            vec![suite("A", Some("a.cy.js"), 1), suite("B", Some("b.cy.js"), 1)],
        );
        let mut aggregator = ReportAggregator::new();
        aggregator.add_fragment(original.clone());
        let merged = aggregator.finish(&properties());

        assert_eq!(merged.test_suites, original.test_suites);
        assert_eq!(merged.tests, original.tests);
        assert_eq!(merged.properties, properties().to_properties());
    }

    #[test]
    fn files_are_inherited_forward_within_a_fragment() {
        let mut aggregator = ReportAggregator::new();
        aggregator
            .add_fragment(fragment(
                5,
                0,
                0,
                vec![
                    suite("1", Some("a.js"), 1),
                    suite("2", None, 1),
                    suite("3", None, 1),
                    suite("4", Some("b.js"), 1),
                    suite("5", None, 1),
                ],
            ))
            .add_fragment(fragment(1, 0, 0, vec![suite("6", None, 1)]));

        let report = aggregator.finish(&properties());
        let files: Vec<_> = report
            .test_suites
            .iter()
            .map(|test_suite| test_suite.file.as_deref())
            .collect();
        assert_eq!(
            files,
            [
                Some("a.js"),
                Some("a.js"),
                Some("a.js"),
                Some("b.js"),
                Some("b.js"),
                None
            ]
        );
    }

    #[test]
    fn suites_without_cases_are_dropped_but_pass_on_their_file() {
        let mut aggregator = ReportAggregator::new();
        aggregator.add_fragment(fragment(
            1,
            0,
            0,
            vec![suite("Root Suite", Some("a.js"), 0), suite("Inner", None, 1)],
        ));

        let report = aggregator.finish(&properties());
        assert_eq!(suite_names(&report), ["Inner"]);
        assert_eq!(report.test_suites[0].file.as_deref(), Some("a.js"));
    }

    #[test]
    fn fragment_order_is_preserved() {
        let mut aggregator = ReportAggregator::new();
        for name in ["A", "B", "C"] {
            aggregator.add_fragment(fragment(
                2,
                0,
                0,
                vec![
                    suite(&format!("{name}1"), None, 1),
                    suite(&format!("{name}2"), None, 1),
                ],
            ));
        }
        let report = aggregator.finish(&properties());
        assert_eq!(suite_names(&report), ["A1", "A2", "B1", "B2", "C1", "C2"]);
    }

    proptest! {
        #[test]
        fn proptest_totals_are_additive(
            counts in vec((0..500usize, 0..500usize, 0..500usize), 0..16),
        ) {
            let mut aggregator = ReportAggregator::new();
            for (tests, failures, skipped) in &counts {
                aggregator.add_fragment(fragment(*tests, *failures, *skipped, vec![]));
            }
            let report = aggregator.finish(&properties());

            let tests: usize = counts.iter().map(|(tests, _, _)| tests).sum();
            let failures: usize = counts.iter().map(|(_, failures, _)| failures).sum();
            let skipped: usize = counts.iter().map(|(_, _, skipped)| skipped).sum();
            prop_assert_eq!(report.tests, tests);
            prop_assert_eq!(report.failures, failures);
            prop_assert_eq!(report.skipped, (skipped > 0).then_some(skipped));
            prop_assert_eq!(report.errors, 0);
        }
    }
}
