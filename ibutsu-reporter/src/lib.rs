// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for the Ibutsu test reporter.
//!
//! The flow of data is:
//!
//! 1. A test runner emits [lifecycle events](reporter::RunnerEvent). A
//!    [`FragmentReporter`](reporter::FragmentReporter) turns them into one JUnit fragment per run
//!    and writes it to disk.
//! 2. After all runs complete, the [`merge`] module reads every fragment in a directory and
//!    combines them into a single report annotated with upload metadata.

pub mod config;
pub mod errors;
pub mod merge;
pub mod reporter;
