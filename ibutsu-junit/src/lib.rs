// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate and read the JUnit reports exchanged between the Ibutsu reporter and merger.
//!
//! The schema is a JUnit dialect: test cases carry `failure`/`error`/`success` boolean
//! attributes, suites carry the `file` they were defined in, and the root element holds a single
//! `<properties>` block with upload metadata.

#![warn(missing_docs)]

mod deserialize;
mod errors;
mod report;
mod serialize;

pub use errors::*;
pub use report::*;
