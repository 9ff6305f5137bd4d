// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merges the JUnit fragments written by the Ibutsu Cypress reporter into a single report that
//! can be uploaded to Ibutsu.
//!
//! Exit codes are documented in [`MergeExitCode`].

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::MergeExitCode;
#[doc(hidden)]
pub use output::{Color, OutputContext, StderrStyles};
