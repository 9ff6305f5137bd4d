// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `Report`.

use crate::{
    FailureDetail, NULL_FILE, Property, Report, SerializeError, TIMESTAMP_FORMAT, TestCase,
    TestSuite,
};
use quick_xml::{
    Writer,
    events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event},
};
use std::{borrow::Cow, io, time::Duration};

pub(crate) static TESTSUITES_TAG: &str = "testsuites";
pub(crate) static TESTSUITE_TAG: &str = "testsuite";
pub(crate) static TESTCASE_TAG: &str = "testcase";
pub(crate) static PROPERTIES_TAG: &str = "properties";
pub(crate) static PROPERTY_TAG: &str = "property";
pub(crate) static FAILURE_TAG: &str = "failure";
pub(crate) static SKIPPED_TAG: &str = "skipped";

pub(crate) fn serialize_report(
    report: &Report,
    writer: impl io::Write,
) -> Result<(), SerializeError> {
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    writer.write_event(Event::Decl(decl))?;

    serialize_report_impl(report, &mut writer)?;

    // Add a trailing newline.
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn serialize_report_impl(
    report: &Report,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let Report {
        name,
        time,
        tests,
        failures,
        errors,
        skipped,
        properties,
        test_suites,
    } = report;

    let mut testsuites_tag = BytesStart::new(TESTSUITES_TAG);
    if let Some(name) = name {
        testsuites_tag.push_attribute(("name", xml_chars(name).as_ref()));
    }
    if let Some(time) = time {
        testsuites_tag.push_attribute(("time", serialize_time(time).as_str()));
    }
    testsuites_tag.push_attribute(("tests", tests.to_string().as_str()));
    testsuites_tag.push_attribute(("failures", failures.to_string().as_str()));
    testsuites_tag.push_attribute(("errors", errors.to_string().as_str()));
    if let Some(skipped) = skipped {
        testsuites_tag.push_attribute(("skipped", skipped.to_string().as_str()));
    }
    writer.write_event(Event::Start(testsuites_tag))?;

    if !properties.is_empty() {
        writer.write_event(Event::Start(BytesStart::new(PROPERTIES_TAG)))?;
        for property in properties {
            serialize_property(property, writer)?;
        }
        serialize_end_tag(PROPERTIES_TAG, writer)?;
    }

    for test_suite in test_suites {
        serialize_test_suite(test_suite, writer)?;
    }

    serialize_end_tag(TESTSUITES_TAG, writer)
}

fn serialize_property(
    property: &Property,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    let mut property_tag = BytesStart::new(PROPERTY_TAG);
    property_tag.push_attribute(("key", xml_chars(&property.key).as_ref()));
    property_tag.push_attribute(("value", xml_chars(&property.value).as_ref()));

    writer.write_event(Event::Empty(property_tag))?;
    Ok(())
}

fn serialize_test_suite(
    test_suite: &TestSuite,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    let TestSuite {
        name,
        file,
        tests,
        timestamp,
        failures,
        time,
        skipped,
        test_cases,
        extra,
    } = test_suite;

    let mut testsuite_tag = BytesStart::new(TESTSUITE_TAG);
    testsuite_tag.push_attribute(("name", xml_chars(name).as_ref()));
    testsuite_tag.push_attribute(("tests", tests.to_string().as_str()));
    testsuite_tag.push_attribute(("file", xml_chars(file.as_deref().unwrap_or(NULL_FILE)).as_ref()));
    if let Some(timestamp) = timestamp {
        testsuite_tag.push_attribute((
            "timestamp",
            timestamp.format(TIMESTAMP_FORMAT).to_string().as_str(),
        ));
    }
    if let Some(failures) = failures {
        testsuite_tag.push_attribute(("failures", failures.to_string().as_str()));
    }
    if let Some(time) = time {
        testsuite_tag.push_attribute(("time", serialize_time(time).as_str()));
    }
    if let Some(skipped) = skipped {
        testsuite_tag.push_attribute(("skipped", skipped.to_string().as_str()));
    }
    for (k, v) in extra {
        testsuite_tag.push_attribute((k.as_str(), xml_chars(v).as_ref()));
    }

    if test_cases.is_empty() {
        writer.write_event(Event::Empty(testsuite_tag))?;
        return Ok(());
    }

    writer.write_event(Event::Start(testsuite_tag))?;
    for test_case in test_cases {
        serialize_test_case(test_case, writer)?;
    }
    serialize_end_tag(TESTSUITE_TAG, writer)
}

fn serialize_test_case(
    test_case: &TestCase,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    let TestCase {
        name,
        time,
        failure,
        error,
        failure_details,
        skipped,
        extra,
    } = test_case;

    let mut testcase_tag = BytesStart::new(TESTCASE_TAG);
    testcase_tag.push_attribute(("name", xml_chars(name).as_ref()));
    testcase_tag.push_attribute(("time", serialize_time(time).as_str()));
    testcase_tag.push_attribute(("failure", serialize_bool(*failure)));
    testcase_tag.push_attribute(("error", serialize_bool(*error)));
    testcase_tag.push_attribute(("success", serialize_bool(test_case.success())));
    for (k, v) in extra {
        testcase_tag.push_attribute((k.as_str(), xml_chars(v).as_ref()));
    }

    if failure_details.is_empty() && !skipped {
        writer.write_event(Event::Empty(testcase_tag))?;
        return Ok(());
    }

    writer.write_event(Event::Start(testcase_tag))?;
    for detail in failure_details {
        serialize_failure(detail, writer)?;
    }
    if *skipped {
        writer.write_event(Event::Empty(BytesStart::new(SKIPPED_TAG)))?;
    }
    serialize_end_tag(TESTCASE_TAG, writer)
}

fn serialize_failure(
    detail: &FailureDetail,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    let mut tag = BytesStart::new(FAILURE_TAG);
    tag.push_attribute(("message", xml_chars(&detail.message).as_ref()));
    tag.push_attribute(("type", xml_chars(&detail.ty).as_ref()));

    if detail.description.is_empty() {
        writer.write_event(Event::Empty(tag))?;
        return Ok(());
    }

    writer.write_event(Event::Start(tag))?;
    for section in cdata_sections(&xml_chars(&detail.description)) {
        writer.write_event(Event::CData(BytesCData::new(section)))?;
    }
    serialize_end_tag(FAILURE_TAG, writer)
}

fn serialize_end_tag(
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    writer.write_event(Event::End(BytesEnd::new(tag_name)))?;
    Ok(())
}

/// Splits text into CDATA section bodies so that no section contains the `]]>` terminator.
///
/// Each `]]>` is split between two adjacent sections, as `]]` and `>`.
fn cdata_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut parts = text.split("]]>").peekable();
    let mut carry = "";
    while let Some(part) = parts.next() {
        let mut section = String::with_capacity(carry.len() + part.len() + 2);
        section.push_str(carry);
        section.push_str(part);
        if parts.peek().is_some() {
            section.push_str("]]");
            carry = ">";
        }
        sections.push(section);
    }
    sections
}

/// Removes the C0 control characters XML 1.0 can't represent, even as character references.
///
/// Tab, line feed and carriage return are kept.
pub(crate) fn xml_chars(text: &str) -> Cow<'_, str> {
    if text.contains(is_restricted_char) {
        Cow::Owned(text.replace(is_restricted_char, ""))
    } else {
        Cow::Borrowed(text)
    }
}

fn is_restricted_char(c: char) -> bool {
    matches!(c, '\x00'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f')
}

fn serialize_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

// Serialize time as seconds with 3 decimal points.
fn serialize_time(time: &Duration) -> String {
    format!("{:.3}", time.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdata_sections_split_terminator() {
        assert_eq!(cdata_sections("plain"), vec!["plain".to_owned()]);
        assert_eq!(
            cdata_sections("a]]>b"),
            vec!["a]]".to_owned(), ">b".to_owned()]
        );
        assert_eq!(
            cdata_sections("]]>]]>"),
            vec!["]]".to_owned(), ">]]".to_owned(), ">".to_owned()]
        );
    }

    #[test]
    fn xml_chars_keeps_whitespace() {
        assert!(matches!(xml_chars("plain\ttext\r\n"), Cow::Borrowed("plain\ttext\r\n")));
        assert_eq!(xml_chars("\x1b[31mred\x1b[0m\x00"), "[31mred[0m");
    }

    #[test]
    fn control_characters_are_not_written() {
        let mut detail = FailureDetail::new("", "AssertionError", "");
        detail.message = "expected \x1b[31mred\x1b[0m".to_owned();
        detail.description = "stack\x00trace".to_owned();
        let mut test_case = TestCase::new("shows \x1b[1mbold\x1b[0m");
        test_case.add_failure_detail(detail);
        let mut test_suite = TestSuite::new("Suite\x07");
        test_suite.set_tests(1).add_test_case(test_case);
        let mut report = Report::new();
        report
            .add_property(("env", "stage\x00"))
            .add_test_suite(test_suite);

        let xml = report.to_string().expect("report serializes");
        assert!(
            !xml.contains(is_restricted_char),
            "restricted character written in:\n{xml}"
        );

        let parsed: Report = xml.parse().expect("report parses");
        let test_case = &parsed.test_suites[0].test_cases[0];
        assert_eq!(parsed.test_suites[0].name, "Suite");
        assert_eq!(parsed.properties[0].value, "stage");
        assert_eq!(test_case.name, "shows [1mbold[0m");
        assert_eq!(test_case.failure_details[0].message, "expected [31mred[0m");
        assert_eq!(test_case.failure_details[0].description, "stacktrace");
    }

    #[test]
    fn time_has_three_decimals() {
        assert_eq!(serialize_time(&Duration::from_millis(1234)), "1.234");
        assert_eq!(serialize_time(&Duration::ZERO), "0.000");
    }
}
