// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns test runner events into report fragments.
//!
//! The main structure in this module is [`FragmentReporter`], which composes a [`ReportBuilder`]
//! with fragment output.

mod builder;
mod events;
mod fragment;
mod hooks;

pub use builder::*;
pub use events::*;
pub use fragment::*;
pub use hooks::*;
