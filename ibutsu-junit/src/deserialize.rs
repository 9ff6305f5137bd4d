// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read a `Report` from XML.

use crate::{
    DeserializeError, DeserializeErrorKind, FailureDetail, Property, Report, TestCase, TestSuite,
    serialize::{
        FAILURE_TAG, PROPERTIES_TAG, PROPERTY_TAG, SKIPPED_TAG, TESTCASE_TAG, TESTSUITE_TAG,
        TESTSUITES_TAG,
    },
};
use chrono::{DateTime, NaiveDateTime};
use indexmap::IndexMap;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::time::Duration;

pub(crate) fn deserialize_report(input: &str) -> Result<Report, DeserializeError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);
    ReportReader {
        reader,
        path: Vec::new(),
    }
    .read_report()
}

struct ReportReader<'a> {
    reader: Reader<&'a [u8]>,
    path: Vec<String>,
}

/// Whether an element was written as `<tag/>` or as `<tag>...</tag>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ElementForm {
    Empty,
    Open,
}

impl<'a> ReportReader<'a> {
    fn read_report(mut self) -> Result<Report, DeserializeError> {
        let (root, form) = loop {
            match self.next_event()? {
                Event::Start(e) => break (e, ElementForm::Open),
                Event::Empty(e) => break (e, ElementForm::Empty),
                Event::Eof => return Err(self.error(DeserializeErrorKind::NoRoot)),
                // Declarations, comments, doctypes and stray text before the root.
                _ => {}
            }
        };

        let root_name = element_name(&root);
        if root_name != TESTSUITES_TAG {
            return Err(self.error(DeserializeErrorKind::UnexpectedRoot(root_name)));
        }
        self.path.push(root_name);

        let mut attributes = self.attributes(&root)?;
        let mut report = Report::new();
        report.name = attributes.shift_remove("name");
        report.time = self.optional_time(&mut attributes, "time")?;
        report.tests = self.required_count(&mut attributes, "tests")?;
        report.failures = self.required_count(&mut attributes, "failures")?;
        report.errors = self.optional_count(&mut attributes, "errors")?.unwrap_or(0);
        report.skipped = self.optional_count(&mut attributes, "skipped")?;

        if form == ElementForm::Empty {
            return Ok(report);
        }

        let mut suite_index = 0;
        loop {
            match self.next_event()? {
                Event::Start(e) => match element_name(&e).as_str() {
                    name if name == PROPERTIES_TAG => {
                        self.path.push(name.to_owned());
                        self.read_properties(&mut report.properties)?;
                        self.path.pop();
                    }
                    name if name == TESTSUITE_TAG => {
                        report
                            .test_suites
                            .push(self.read_test_suite(&e, ElementForm::Open, suite_index)?);
                        suite_index += 1;
                    }
                    _ => self.skip_element(&e)?,
                },
                Event::Empty(e) => {
                    if element_name(&e) == TESTSUITE_TAG {
                        report
                            .test_suites
                            .push(self.read_test_suite(&e, ElementForm::Empty, suite_index)?);
                        suite_index += 1;
                    }
                }
                Event::End(_) => break,
                Event::Eof => return Err(self.error(DeserializeErrorKind::UnexpectedEof)),
                _ => {}
            }
        }

        Ok(report)
    }

    fn read_properties(&mut self, properties: &mut Vec<Property>) -> Result<(), DeserializeError> {
        loop {
            match self.next_event()? {
                Event::Empty(e) if element_name(&e) == PROPERTY_TAG => {
                    properties.push(self.property(&e)?);
                }
                Event::Start(e) if element_name(&e) == PROPERTY_TAG => {
                    properties.push(self.property(&e)?);
                    self.skip_element(&e)?;
                }
                Event::Start(e) => self.skip_element(&e)?,
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.error(DeserializeErrorKind::UnexpectedEof)),
                _ => {}
            }
        }
    }

    fn property(&self, e: &BytesStart<'_>) -> Result<Property, DeserializeError> {
        let mut attributes = self.attributes(e)?;
        // `key` is what Ibutsu expects; plain JUnit writers use `name`.
        let key = match attributes.shift_remove("key") {
            Some(key) => key,
            None => self.required(&mut attributes, "name")?,
        };
        let value = attributes.shift_remove("value").unwrap_or_default();
        Ok(Property::new(key, value))
    }

    fn read_test_suite(
        &mut self,
        e: &BytesStart<'_>,
        form: ElementForm,
        index: usize,
    ) -> Result<TestSuite, DeserializeError> {
        self.path.push(format!("{TESTSUITE_TAG}[{index}]"));

        let mut attributes = self.attributes(e)?;
        let mut test_suite = TestSuite::new(self.required(&mut attributes, "name")?);
        if let Some(file) = attributes.shift_remove("file") {
            test_suite.set_file(file);
        }
        test_suite.tests = self.optional_count(&mut attributes, "tests")?.unwrap_or(0);
        if let Some(timestamp) = attributes.shift_remove("timestamp") {
            let parsed = parse_timestamp(&timestamp).ok_or_else(|| {
                self.error(DeserializeErrorKind::InvalidAttribute {
                    attribute: "timestamp",
                    value: timestamp.clone(),
                    expected: "an ISO-8601 timestamp",
                })
            })?;
            test_suite.set_timestamp(parsed);
        }
        test_suite.failures = self.optional_count(&mut attributes, "failures")?;
        test_suite.time = self.optional_time(&mut attributes, "time")?;
        test_suite.skipped = self.optional_count(&mut attributes, "skipped")?;
        test_suite.extra = attributes;

        if form == ElementForm::Open {
            let mut case_index = 0;
            loop {
                match self.next_event()? {
                    Event::Start(e) if element_name(&e) == TESTCASE_TAG => {
                        let test_case =
                            self.read_test_case(&e, ElementForm::Open, case_index)?;
                        test_suite.add_test_case(test_case);
                        case_index += 1;
                    }
                    Event::Empty(e) if element_name(&e) == TESTCASE_TAG => {
                        let test_case =
                            self.read_test_case(&e, ElementForm::Empty, case_index)?;
                        test_suite.add_test_case(test_case);
                        case_index += 1;
                    }
                    Event::Start(e) => self.skip_element(&e)?,
                    Event::End(_) => break,
                    Event::Eof => return Err(self.error(DeserializeErrorKind::UnexpectedEof)),
                    _ => {}
                }
            }
        }

        self.path.pop();
        Ok(test_suite)
    }

    fn read_test_case(
        &mut self,
        e: &BytesStart<'_>,
        form: ElementForm,
        index: usize,
    ) -> Result<TestCase, DeserializeError> {
        self.path.push(format!("{TESTCASE_TAG}[{index}]"));

        let mut attributes = self.attributes(e)?;
        let mut test_case = TestCase::new(self.required(&mut attributes, "name")?);
        test_case.time = self
            .optional_time(&mut attributes, "time")?
            .unwrap_or_default();
        test_case.failure = self.optional_bool(&mut attributes, "failure")?;
        test_case.error = self.optional_bool(&mut attributes, "error")?;
        // Derived from `failure` and `error`.
        attributes.shift_remove("success");
        test_case.extra = attributes;

        if form == ElementForm::Open {
            loop {
                match self.next_event()? {
                    Event::Start(e) => match element_name(&e).as_str() {
                        name if name == FAILURE_TAG => {
                            let detail = self.read_failure(&e, ElementForm::Open)?;
                            test_case.failure_details.push(detail);
                        }
                        name if name == SKIPPED_TAG => {
                            test_case.set_skipped();
                            self.skip_element(&e)?;
                        }
                        _ => self.skip_element(&e)?,
                    },
                    Event::Empty(e) => match element_name(&e).as_str() {
                        name if name == FAILURE_TAG => {
                            let detail = self.read_failure(&e, ElementForm::Empty)?;
                            test_case.failure_details.push(detail);
                        }
                        name if name == SKIPPED_TAG => {
                            test_case.set_skipped();
                        }
                        _ => {}
                    },
                    Event::End(_) => break,
                    Event::Eof => return Err(self.error(DeserializeErrorKind::UnexpectedEof)),
                    _ => {}
                }
            }
        }

        self.path.pop();
        Ok(test_case)
    }

    fn read_failure(
        &mut self,
        e: &BytesStart<'_>,
        form: ElementForm,
    ) -> Result<FailureDetail, DeserializeError> {
        let mut attributes = self.attributes(e)?;
        let message = attributes.shift_remove("message").unwrap_or_default();
        let ty = attributes.shift_remove("type").unwrap_or_default();

        let mut description = String::new();
        if form == ElementForm::Open {
            loop {
                match self.next_event()? {
                    Event::CData(cdata) => description.push_str(&String::from_utf8_lossy(&cdata)),
                    Event::Text(text) => {
                        let text = text.unescape().map_err(|error| self.xml_error(error))?;
                        description.push_str(&text);
                    }
                    Event::Start(e) => self.skip_element(&e)?,
                    Event::End(_) => break,
                    Event::Eof => return Err(self.error(DeserializeErrorKind::UnexpectedEof)),
                    _ => {}
                }
            }
        }

        Ok(FailureDetail::new(message, ty, description))
    }

    // ---
    // Helper methods
    // ---

    fn next_event(&mut self) -> Result<Event<'a>, DeserializeError> {
        self.reader
            .read_event()
            .map_err(|error| self.xml_error(error))
    }

    fn skip_element(&mut self, e: &BytesStart<'_>) -> Result<(), DeserializeError> {
        self.reader
            .read_to_end(e.name())
            .map(|_| ())
            .map_err(|error| self.xml_error(error))
    }

    fn attributes(
        &self,
        e: &BytesStart<'_>,
    ) -> Result<IndexMap<String, String>, DeserializeError> {
        let mut attributes = IndexMap::new();
        for attribute in e.attributes() {
            let attribute =
                attribute.map_err(|error| self.xml_error(quick_xml::Error::from(error)))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|error| self.xml_error(error))?
                .into_owned();
            attributes.insert(key, value);
        }
        Ok(attributes)
    }

    fn required(
        &self,
        attributes: &mut IndexMap<String, String>,
        name: &'static str,
    ) -> Result<String, DeserializeError> {
        attributes
            .shift_remove(name)
            .ok_or_else(|| self.error(DeserializeErrorKind::MissingAttribute(name)))
    }

    fn required_count(
        &self,
        attributes: &mut IndexMap<String, String>,
        name: &'static str,
    ) -> Result<usize, DeserializeError> {
        self.optional_count(attributes, name)?
            .ok_or_else(|| self.error(DeserializeErrorKind::MissingAttribute(name)))
    }

    fn optional_count(
        &self,
        attributes: &mut IndexMap<String, String>,
        name: &'static str,
    ) -> Result<Option<usize>, DeserializeError> {
        attributes
            .shift_remove(name)
            .map(|value| {
                value.trim().parse::<usize>().map_err(|_| {
                    self.error(DeserializeErrorKind::InvalidAttribute {
                        attribute: name,
                        value,
                        expected: "a non-negative integer",
                    })
                })
            })
            .transpose()
    }

    fn optional_time(
        &self,
        attributes: &mut IndexMap<String, String>,
        name: &'static str,
    ) -> Result<Option<Duration>, DeserializeError> {
        attributes
            .shift_remove(name)
            .map(|value| {
                value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                    .ok_or_else(|| {
                        self.error(DeserializeErrorKind::InvalidAttribute {
                            attribute: name,
                            value,
                            expected: "a non-negative number of seconds",
                        })
                    })
            })
            .transpose()
    }

    fn optional_bool(
        &self,
        attributes: &mut IndexMap<String, String>,
        name: &'static str,
    ) -> Result<bool, DeserializeError> {
        let Some(value) = attributes.shift_remove(name) else {
            return Ok(false);
        };
        let parsed = match value.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        };
        parsed.ok_or_else(|| {
            self.error(DeserializeErrorKind::InvalidAttribute {
                attribute: name,
                value,
                expected: "`true` or `false`",
            })
        })
    }

    fn xml_error(&self, error: quick_xml::Error) -> DeserializeError {
        self.error(DeserializeErrorKind::Xml(error))
    }

    fn error(&self, kind: DeserializeErrorKind) -> DeserializeError {
        DeserializeError::new(self.path.join("/"), kind)
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Parses the timestamp formats seen in practice: RFC 3339 with a zone, or a naive ISO-8601
/// date-time with optional fractional seconds.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|timestamp| timestamp.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}
