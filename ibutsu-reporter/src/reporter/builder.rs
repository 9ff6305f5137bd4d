// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds a report fragment from runner events.

use super::{
    events::{FailureInfo, RunnerEvent, SuiteInfo, TestInfo},
    hooks::{HookKind, classify_hook, recover_test_title},
};
use crate::{config::ReporterOptions, errors::BuildError};
use chrono::{NaiveDateTime, Utc};
use ibutsu_junit::{FailureDetail, Report, TestCase, TestSuite};
use std::time::Duration;
use tracing::debug;

/// Counts of test outcomes over a run, kept independently of what ends up in the report.
///
/// Pending tests are counted even when they are left out of the report, and every failure event
/// is counted, including those from hooks.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunStats {
    /// The number of tests that passed.
    pub passes: usize,

    /// The number of failure events.
    pub failures: usize,

    /// The number of pending tests.
    pub pending: usize,
}

#[derive(Debug)]
enum BuilderState {
    Idle,
    Collecting {
        test_suites: Vec<TestSuite>,
        stats: RunStats,
    },
}

/// Turns an ordered stream of [`RunnerEvent`]s into one [`Report`] per run.
#[derive(Debug)]
pub struct ReportBuilder {
    root_suite_title: String,
    testsuites_title: String,
    full_suite_title_separator: Option<String>,
    include_pending: bool,
    clock: fn() -> NaiveDateTime,
    state: BuilderState,
}

impl ReportBuilder {
    /// Creates a new builder. Suite timestamps are taken from the current UTC time.
    pub fn new(options: &ReporterOptions) -> Self {
        Self {
            root_suite_title: options.root_suite_title.clone(),
            testsuites_title: options.testsuites_title.clone(),
            full_suite_title_separator: options
                .use_full_suite_title
                .then(|| options.suite_title_separated_by.clone()),
            include_pending: options.include_pending,
            clock: now_utc,
            state: BuilderState::Idle,
        }
    }

    /// Replaces the source of suite timestamps.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Returns true between `start` and `end`.
    pub fn is_collecting(&self) -> bool {
        matches!(self.state, BuilderState::Collecting { .. })
    }

    /// Returns the statistics for the run in progress, if any.
    pub fn stats(&self) -> Option<RunStats> {
        match &self.state {
            BuilderState::Idle => None,
            BuilderState::Collecting { stats, .. } => Some(*stats),
        }
    }

    /// Processes a single event.
    ///
    /// Returns the finished report when the event is `end`.
    pub fn handle_event(&mut self, event: RunnerEvent<'_>) -> Result<Option<Report>, BuildError> {
        if let RunnerEvent::Start = event {
            if self.is_collecting() {
                debug!("run restarted, discarding partial report");
            }
            self.state = BuilderState::Collecting {
                test_suites: Vec::new(),
                stats: RunStats::default(),
            };
            return Ok(None);
        }

        let BuilderState::Collecting { test_suites, stats } = &mut self.state else {
            return Err(BuildError::NotStarted {
                event: event.name(),
            });
        };

        match event {
            RunnerEvent::Start => unreachable!("handled above"),
            RunnerEvent::SuiteEnter(suite) => {
                if is_invalid_suite(suite) {
                    debug!(title = %suite.title, "skipping suite without tests");
                    return Ok(None);
                }
                let name = suite_name(
                    suite,
                    &self.root_suite_title,
                    self.full_suite_title_separator.as_deref(),
                );
                let mut test_suite = TestSuite::new(name);
                test_suite
                    .set_tests(suite.num_tests)
                    .set_timestamp((self.clock)());
                if let Some(file) = &suite.file {
                    test_suite.set_file(file.as_str());
                }
                test_suites.push(test_suite);
            }
            RunnerEvent::TestPass(test) => {
                stats.passes += 1;
                open_suite(test_suites, &event)?.add_test_case(test_case(test));
            }
            RunnerEvent::TestFail(test, failure) => {
                stats.failures += 1;
                let test_suite = open_suite(test_suites, &event)?;
                record_failure(test_suite, test, failure);
            }
            RunnerEvent::TestPending(test) => {
                stats.pending += 1;
                if self.include_pending {
                    let mut test_case = test_case(test);
                    test_case.set_skipped();
                    open_suite(test_suites, &event)?.add_test_case(test_case);
                }
            }
            RunnerEvent::End => {
                let stats = *stats;
                let test_suites = std::mem::take(test_suites);
                self.state = BuilderState::Idle;
                return Ok(Some(self.finish(test_suites, stats)));
            }
        }

        Ok(None)
    }

    fn finish(&self, mut test_suites: Vec<TestSuite>, stats: RunStats) -> Report {
        let mut time = Duration::ZERO;
        for test_suite in &mut test_suites {
            test_suite.compute_aggregates();
            time += test_suite.time.unwrap_or_default();
        }

        let mut report = Report::new();
        report
            .set_name(self.testsuites_title.as_str())
            .set_time(time)
            .add_test_suites(test_suites)
            .set_failures(stats.failures)
            .set_skipped(stats.pending);
        debug!(
            tests = report.tests,
            failures = report.failures,
            pending = stats.pending,
            "finished report"
        );
        report
    }
}

fn now_utc() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn is_invalid_suite(suite: &SuiteInfo) -> bool {
    (!suite.root && suite.title.is_empty()) || (suite.num_tests == 0 && suite.num_suites == 0)
}

fn suite_name(suite: &SuiteInfo, root_title: &str, full_title_separator: Option<&str>) -> String {
    let own_title = if suite.root {
        root_title
    } else {
        suite.title.as_str()
    };

    let name = match full_title_separator {
        Some(separator) => {
            let mut titles: Vec<&str> = suite
                .ancestors
                .iter()
                .enumerate()
                .map(|(index, title)| {
                    if index == 0 && title.is_empty() {
                        root_title
                    } else {
                        title.as_str()
                    }
                })
                .collect();
            titles.push(own_title);
            titles.join(separator)
        }
        None => own_title.to_owned(),
    };
    strip_ansi_escapes::strip_str(name)
}

fn open_suite<'a>(
    test_suites: &'a mut [TestSuite],
    event: &RunnerEvent<'_>,
) -> Result<&'a mut TestSuite, BuildError> {
    test_suites.last_mut().ok_or(BuildError::NoOpenSuite {
        event: event.name(),
    })
}

fn test_case(test: &TestInfo) -> TestCase {
    let mut test_case = TestCase::new(strip_ansi_escapes::strip_str(&test.title));
    test_case.set_time(test.duration.unwrap_or_default());
    test_case
}

fn failure_detail(failure: &FailureInfo) -> FailureDetail {
    let description = non_empty(failure.stack.as_deref())
        .or_else(|| non_empty(failure.message.as_deref()))
        .or(failure.inspect.as_deref())
        .unwrap_or_default();
    FailureDetail::new(
        failure.message.clone().unwrap_or_default(),
        failure.name.clone().unwrap_or_default(),
        description,
    )
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.is_empty())
}

fn record_failure(test_suite: &mut TestSuite, test: &TestInfo, failure: &FailureInfo) {
    let detail = failure_detail(failure);
    let mut test_case = test_case(test);

    match classify_hook(&test_case.name) {
        Some(kind) if kind.is_teardown() => {
            if let Some(previous) = test_suite.last_test_case_mut() {
                debug!(hook = %test_case.name, test = %previous.name, "attaching teardown failure");
                previous.add_failure_detail(detail);
                return;
            }
        }
        Some(kind @ (HookKind::BeforeEach | HookKind::BeforeAll)) => {
            if let Some(title) = recover_test_title(&test_case.name, kind) {
                test_case.name = title.to_owned();
            }
        }
        Some(_) | None => {}
    }

    test_case.add_failure_detail(detail);
    test_suite.add_test_case(test_case);
}
