// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    deserialize::deserialize_report,
    errors::{DeserializeError, DeserializeErrorKind, SerializeError},
    serialize::{serialize_report, xml_chars},
};
use chrono::NaiveDateTime;
use indexmap::map::IndexMap;
use std::{io, str::FromStr, time::Duration};

/// The literal used in the `file` attribute of a suite whose source file is unknown.
pub const NULL_FILE: &str = "null";

/// The format used for suite timestamps: ISO-8601 with second precision and no zone suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The root element of a report.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    /// The name of this report.
    ///
    /// Fragments written by the reporter carry a name; merged reports do not.
    pub name: Option<String>,

    /// The overall time taken by the run, serialized as the number of seconds.
    pub time: Option<Duration>,

    /// The total number of tests from all test suites.
    pub tests: usize,

    /// The total number of failures.
    pub failures: usize,

    /// The total number of errors. Always zero for reports produced by this crate's users, but
    /// preserved when read.
    pub errors: usize,

    /// The total number of skipped tests, or `None` if the attribute is absent.
    pub skipped: Option<usize>,

    /// Upload metadata, serialized in a single `<properties>` block before the suites.
    pub properties: Vec<Property>,

    /// The test suites contained in this report.
    pub test_suites: Vec<TestSuite>,
}

impl Report {
    /// Creates a new, empty `Report`.
    pub fn new() -> Self {
        Self {
            name: None,
            time: None,
            tests: 0,
            failures: 0,
            errors: 0,
            skipped: None,
            properties: vec![],
            test_suites: vec![],
        }
    }

    /// Sets the name of the report.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the time taken for overall execution.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Sets the number of failures.
    pub fn set_failures(&mut self, failures: usize) -> &mut Self {
        self.failures = failures;
        self
    }

    /// Sets the skipped count. A count of zero removes the attribute.
    pub fn set_skipped(&mut self, skipped: usize) -> &mut Self {
        self.skipped = (skipped > 0).then_some(skipped);
        self
    }

    /// Adds a property.
    pub fn add_property(&mut self, property: impl Into<Property>) -> &mut Self {
        self.properties.push(property.into());
        self
    }

    /// Adds several properties.
    pub fn add_properties(
        &mut self,
        properties: impl IntoIterator<Item = impl Into<Property>>,
    ) -> &mut Self {
        for property in properties {
            self.add_property(property);
        }
        self
    }

    /// Adds a new test suite and adds its `tests` count to the report's.
    pub fn add_test_suite(&mut self, test_suite: TestSuite) -> &mut Self {
        self.tests += test_suite.tests;
        self.test_suites.push(test_suite);
        self
    }

    /// Adds several test suites, updating the `tests` count.
    pub fn add_test_suites(
        &mut self,
        test_suites: impl IntoIterator<Item = TestSuite>,
    ) -> &mut Self {
        for test_suite in test_suites {
            self.add_test_suite(test_suite);
        }
        self
    }

    /// Serialize this report to the given writer.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serialize_report(self, writer)
    }

    /// Serialize this report to a string.
    pub fn to_string(&self) -> Result<String, SerializeError> {
        let mut buf: Vec<u8> = vec![];
        self.serialize(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Reads a report from the given reader.
    pub fn deserialize(mut reader: impl io::Read) -> Result<Self, DeserializeError> {
        let mut input = String::new();
        reader
            .read_to_string(&mut input)
            .map_err(|error| DeserializeError::new("", DeserializeErrorKind::Io(error)))?;
        deserialize_report(&input)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Report {
    type Err = DeserializeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        deserialize_report(s)
    }
}

/// Represents a single test suite: one test file or `describe` group.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct TestSuite {
    /// The name of this test suite.
    pub name: String,

    /// The source file the suite was defined in, if known.
    ///
    /// Serialized as the literal `null` if absent.
    pub file: Option<String>,

    /// The number of tests declared directly in this suite.
    pub tests: usize,

    /// The time at which the suite started.
    pub timestamp: Option<NaiveDateTime>,

    /// The number of cases that ended in a failure, once computed.
    pub failures: Option<usize>,

    /// The sum of case durations, once computed.
    pub time: Option<Duration>,

    /// The number of skipped cases. `None` if zero or not computed.
    pub skipped: Option<usize>,

    /// The test cases that form this suite.
    pub test_cases: Vec<TestCase>,

    /// Other attributes found while reading the suite, written back out unchanged.
    pub extra: IndexMap<String, String>,
}

impl TestSuite {
    /// Creates a new `TestSuite`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
            tests: 0,
            timestamp: None,
            failures: None,
            time: None,
            skipped: None,
            test_cases: vec![],
            extra: IndexMap::new(),
        }
    }

    /// Sets the source file. The literal `null` clears it.
    pub fn set_file(&mut self, file: impl Into<String>) -> &mut Self {
        let file = file.into();
        self.file = (file != NULL_FILE).then_some(file);
        self
    }

    /// Sets the number of tests declared in this suite.
    pub fn set_tests(&mut self, tests: usize) -> &mut Self {
        self.tests = tests;
        self
    }

    /// Sets the start timestamp.
    pub fn set_timestamp(&mut self, timestamp: NaiveDateTime) -> &mut Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Appends a test case.
    ///
    /// Unlike JUnit writers that count as they go, `tests` is left alone: it reflects the number
    /// of tests the runner declared for the suite.
    pub fn add_test_case(&mut self, test_case: TestCase) -> &mut Self {
        self.test_cases.push(test_case);
        self
    }

    /// Returns the most recently added test case, if any.
    pub fn last_test_case_mut(&mut self) -> Option<&mut TestCase> {
        self.test_cases.last_mut()
    }

    /// Computes `failures`, `skipped` and `time` from the test cases.
    ///
    /// A case counts as a failure if its last child element is a failure, and as skipped if it
    /// carries a skipped marker.
    pub fn compute_aggregates(&mut self) -> &mut Self {
        let mut failures = 0;
        let mut skipped = 0;
        let mut time = Duration::ZERO;
        for test_case in &self.test_cases {
            failures += usize::from(test_case.is_failure());
            skipped += usize::from(test_case.skipped);
            time += test_case.time;
        }

        self.failures = Some(failures);
        self.skipped = (skipped > 0).then_some(skipped);
        self.time = Some(time);
        self
    }
}

/// Represents a single test case.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct TestCase {
    /// The name of the test case.
    pub name: String,

    /// The time it took to execute this test case.
    pub time: Duration,

    /// Whether the case failed.
    pub failure: bool,

    /// Whether the case errored. Always set together with `failure` by the reporter.
    pub error: bool,

    /// Failure details, in the order they were recorded.
    ///
    /// A case has two entries if a teardown hook failed after the case itself failed.
    pub failure_details: Vec<FailureDetail>,

    /// Whether the case was skipped.
    pub skipped: bool,

    /// Other attributes found while reading the case, written back out unchanged.
    pub extra: IndexMap<String, String>,
}

impl TestCase {
    /// Creates a new, successful test case.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: Duration::ZERO,
            failure: false,
            error: false,
            failure_details: vec![],
            skipped: false,
            extra: IndexMap::new(),
        }
    }

    /// Returns true if the case neither failed nor errored.
    pub fn success(&self) -> bool {
        !self.failure && !self.error
    }

    /// Returns true if the last child element of this case is a failure.
    pub fn is_failure(&self) -> bool {
        !self.skipped && !self.failure_details.is_empty()
    }

    /// Sets the time taken for the test case.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = time;
        self
    }

    /// Records a failure: appends the detail and marks the case as failed and errored.
    pub fn add_failure_detail(&mut self, detail: FailureDetail) -> &mut Self {
        self.failure_details.push(detail);
        self.mark_failed()
    }

    /// Marks the case as failed and errored without recording a detail.
    pub fn mark_failed(&mut self) -> &mut Self {
        self.failure = true;
        self.error = true;
        self
    }

    /// Marks the case as skipped.
    pub fn set_skipped(&mut self) -> &mut Self {
        self.skipped = true;
        self
    }
}

/// Diagnostics for a single failure recorded on a [`TestCase`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureDetail {
    /// The failure message.
    pub message: String,

    /// The category of failure, typically the exception name.
    pub ty: String,

    /// The stack trace or string representation of the failure.
    ///
    /// Serialized as a CDATA section in the body of the `<failure>` element.
    pub description: String,
}

impl FailureDetail {
    /// Creates a new failure detail, removing characters XML cannot represent.
    pub fn new(
        message: impl AsRef<str>,
        ty: impl AsRef<str>,
        description: impl AsRef<str>,
    ) -> Self {
        Self {
            message: xml_chars(message.as_ref()).into_owned(),
            ty: xml_chars(ty.as_ref()).into_owned(),
            description: xml_chars(description.as_ref()).into_owned(),
        }
    }
}

/// Upload metadata attached to a report, such as the project or environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// The key of the property.
    pub key: String,

    /// The value of the property.
    pub value: String,
}

impl Property {
    /// Creates a new `Property` instance.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<T> From<(T, T)> for Property
where
    T: Into<String>,
{
    fn from((k, v): (T, T)) -> Self {
        Property::new(k, v)
    }
}
