// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `ibutsu-merge` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum MergeExitCode {}

impl MergeExitCode {
    /// No errors occurred and the merge completed normally.
    ///
    /// This includes the case where the merged report couldn't be written: that failure is
    /// reported as a warning.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up the merge, such as an unreadable config file or a
    /// missing input directory option.
    pub const SETUP_ERROR: i32 = 96;

    /// The input directory doesn't exist or couldn't be listed.
    pub const INPUT_DIRECTORY_ERROR: i32 = 97;

    /// A fragment couldn't be read or isn't a well-formed report.
    pub const FRAGMENT_PARSE_FAILED: i32 = 98;

    /// The merged report couldn't be serialized.
    pub const SERIALIZE_FAILED: i32 = 99;
}
