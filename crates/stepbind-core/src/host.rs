//! Seam between the binding engine and whatever test harness runs the tests
//!
//! The engine never runs tests itself. It opens named groups and registers
//! test bodies on a [`HostRunner`]; the host decides when and how to poll
//! them.

use crate::error::{BindResult, StepFailure};
use futures::future::BoxFuture;
use std::time::Duration;

/// Registration flavour of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TestMode {
    /// Plain test
    #[default]
    Normal,
    /// Registered but not run
    Skip,
    /// Focused: the host runs only focused tests
    Only,
    /// May run concurrently with other concurrent tests
    Concurrent,
}

impl TestMode {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Skip => "skip",
            Self::Only => "only",
            Self::Concurrent => "concurrent",
        }
    }
}

/// Runnable body of a registered test
pub type TestBody = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), StepFailure>> + Send>;

/// Body of a group; receives the host so nested registrations land inside it
pub type GroupBody<'a> = Box<dyn FnOnce(&mut dyn HostRunner) -> BindResult<()> + 'a>;

/// Test harness the engine registers into
pub trait HostRunner {
    /// Open a named group, run `body` inside it and close it
    ///
    /// # Errors
    /// Must return whatever `body` returned
    fn group(&mut self, name: &str, body: GroupBody<'_>) -> BindResult<()>;

    /// Register a runnable test
    fn test(&mut self, mode: TestMode, name: &str, body: TestBody, timeout: Option<Duration>);

    /// Register a test that is reported but never run
    fn disabled_test(&mut self, name: &str);
}
