// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle events emitted by a test runner.
//!
//! The runner owns its suites and tests; events borrow a snapshot of what the reporter needs.

use std::time::Duration;

/// A lifecycle event, delivered in the order the runner produced it.
#[derive(Clone, Copy, Debug)]
pub enum RunnerEvent<'a> {
    /// The run started.
    Start,

    /// The runner entered a suite.
    SuiteEnter(&'a SuiteInfo),

    /// A test passed.
    TestPass(&'a TestInfo),

    /// A test or hook failed.
    TestFail(&'a TestInfo, &'a FailureInfo),

    /// A test was marked pending and not run.
    TestPending(&'a TestInfo),

    /// The run finished.
    End,
}

impl RunnerEvent<'_> {
    /// Returns the name the runner uses for this event.
    pub fn name(&self) -> &'static str {
        match self {
            RunnerEvent::Start => "start",
            RunnerEvent::SuiteEnter(_) => "suite",
            RunnerEvent::TestPass(_) => "pass",
            RunnerEvent::TestFail(..) => "fail",
            RunnerEvent::TestPending(_) => "pending",
            RunnerEvent::End => "end",
        }
    }
}

/// Receives lifecycle events one at a time.
pub trait EventListener {
    /// Handles a single event. Each call returns before the next event is delivered.
    fn handle_event(&mut self, event: RunnerEvent<'_>);
}

/// A suite as seen when the runner enters it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SuiteInfo {
    /// The suite's own title. Empty for the root suite.
    pub title: String,

    /// Whether this is the root suite.
    pub root: bool,

    /// The file the suite was defined in, if the runner knows it.
    pub file: Option<String>,

    /// The number of tests declared directly in the suite.
    pub num_tests: usize,

    /// The number of child suites.
    pub num_suites: usize,

    /// Titles of the enclosing suites, outermost first. The root suite's title is empty.
    pub ancestors: Vec<String>,
}

impl SuiteInfo {
    /// Creates a non-root suite with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Creates the root suite.
    pub fn root() -> Self {
        Self {
            root: true,
            ..Self::default()
        }
    }

    /// Sets the file the suite was defined in.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Sets the number of tests declared directly in the suite.
    pub fn with_tests(mut self, num_tests: usize) -> Self {
        self.num_tests = num_tests;
        self
    }

    /// Sets the number of child suites.
    pub fn with_suites(mut self, num_suites: usize) -> Self {
        self.num_suites = num_suites;
        self
    }

    /// Sets the titles of the enclosing suites, outermost first.
    pub fn with_ancestors(mut self, ancestors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ancestors = ancestors.into_iter().map(Into::into).collect();
        self
    }
}

/// A test (or hook, when it fails) as seen when it finishes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestInfo {
    /// The title. Failed hooks are titled like `"before each" hook for "test title"`.
    pub title: String,

    /// How long the test ran, if known.
    pub duration: Option<Duration>,
}

impl TestInfo {
    /// Creates a test with the given title and no duration.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            duration: None,
        }
    }

    /// Sets how long the test ran.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// The error a test or hook failed with.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FailureInfo {
    /// The error message.
    pub message: Option<String>,

    /// The error's type name, e.g. `AssertionError`.
    pub name: Option<String>,

    /// The stack trace.
    pub stack: Option<String>,

    /// A string rendering of the error, used when there is no message.
    pub inspect: Option<String>,
}

impl FailureInfo {
    /// Creates a failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Sets the error's type name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Sets the string rendering of the error.
    pub fn with_inspect(mut self, inspect: impl Into<String>) -> Self {
        self.inspect = Some(inspect.into());
        self
    }
}
