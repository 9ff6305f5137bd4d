// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io;
use thiserror::Error;

/// An error that occurs while serializing a [`Report`](crate::Report).
///
/// Returned by [`Report::serialize`](crate::Report::serialize) and
/// [`Report::to_string`](crate::Report::to_string).
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The XML writer failed.
    #[error("error serializing JUnit report")]
    Xml(#[from] quick_xml::Error),

    /// The underlying writer failed.
    #[error("error writing JUnit report")]
    Io(#[from] io::Error),

    /// The serialized report was not valid UTF-8.
    #[error("serialized JUnit report is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// An error that occurs while reading a [`Report`](crate::Report) from XML.
///
/// Returned by [`Report::deserialize`](crate::Report::deserialize) and the
/// [`FromStr`](std::str::FromStr) implementation for `Report`.
#[derive(Debug, Error)]
#[error("error reading JUnit report at `{path}`")]
pub struct DeserializeError {
    path: String,
    #[source]
    kind: DeserializeErrorKind,
}

impl DeserializeError {
    pub(crate) fn new(path: impl Into<String>, kind: DeserializeErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Returns the element path at which the error occurred, e.g. `testsuites/testsuite[1]`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &DeserializeErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while reading a report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeserializeErrorKind {
    /// Reading the input failed.
    #[error("error reading input")]
    Io(#[from] io::Error),

    /// The input is not well-formed XML.
    #[error("malformed XML")]
    Xml(#[from] quick_xml::Error),

    /// The document has no root element.
    #[error("document has no root element")]
    NoRoot,

    /// The root element is not `<testsuites>`.
    #[error("expected root element `testsuites`, found `{0}`")]
    UnexpectedRoot(String),

    /// A required attribute is missing.
    #[error("missing required attribute `{0}`")]
    MissingAttribute(&'static str),

    /// An attribute value could not be parsed.
    #[error("invalid value `{value}` for attribute `{attribute}` (expected {expected})")]
    InvalidAttribute {
        /// The attribute name.
        attribute: &'static str,
        /// The value found in the document.
        value: String,
        /// A description of what was expected.
        expected: &'static str,
    },

    /// The document ended before all open elements were closed.
    #[error("unexpected end of document")]
    UnexpectedEof,
}
