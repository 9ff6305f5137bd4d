// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recognizing failures that come from setup and teardown hooks.
//!
//! The runner reports a failing hook as a failing test whose title names the hook, e.g.
//! `"before each" hook for "logs in"`. Matching is on fixed, case-sensitive phrases.

/// The kind of hook a failure came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HookKind {
    /// Runs after every test in a suite.
    AfterEach,
    /// Runs once after all tests in a suite.
    AfterAll,
    /// Runs before every test in a suite.
    BeforeEach,
    /// Runs once before all tests in a suite.
    BeforeAll,
}

impl HookKind {
    /// Hook kinds in the order they are matched.
    pub const ALL: [HookKind; 4] = [
        HookKind::AfterEach,
        HookKind::AfterAll,
        HookKind::BeforeEach,
        HookKind::BeforeAll,
    ];

    /// The phrase identifying this hook in a title.
    pub fn phrase(self) -> &'static str {
        match self {
            HookKind::AfterEach => "after each",
            HookKind::AfterAll => "after all",
            HookKind::BeforeEach => "before each",
            HookKind::BeforeAll => "before all",
        }
    }

    /// Returns true for hooks that run after a test has already reported a result.
    pub fn is_teardown(self) -> bool {
        matches!(self, HookKind::AfterEach | HookKind::AfterAll)
    }
}

/// Returns the hook a failing test's title refers to, or `None` for an ordinary test.
pub fn classify_hook(title: &str) -> Option<HookKind> {
    HookKind::ALL
        .into_iter()
        .find(|kind| title.contains(kind.phrase()))
}

/// Recovers the title of the test a setup hook ran for.
///
/// For `"before each" hook for "logs in"` this returns `logs in`. Returns `None` if the title
/// doesn't have the `for "..."` suffix, e.g. for a `before all` hook reported against its suite.
pub fn recover_test_title(title: &str, kind: HookKind) -> Option<&str> {
    const FOR_MARKER: &str = " for \"";

    let phrase_end = title.find(kind.phrase())? + kind.phrase().len();
    let rest = &title[phrase_end..];
    let marker_start = rest.find(FOR_MARKER)?;
    let recovered = rest[marker_start + FOR_MARKER.len()..].strip_suffix('"')?;
    (!recovered.is_empty()).then_some(recovered)
}
