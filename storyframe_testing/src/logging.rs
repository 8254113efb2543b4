//! Shared log capture for tests.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use logtest::Logger;
use rstest::fixture;

/// Exclusive handle to the process-wide [`Logger`].
///
/// Tests holding a handle never observe each other's records.
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Lock the shared logger, starting it on first use.
    ///
    /// A panic in another test does not poison capture for the rest.
    #[must_use]
    pub fn new() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let guard = LOGGER
            .get_or_init(|| Mutex::new(Logger::start()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Self { guard }
    }

    /// Drain captured records and return those whose message contains
    /// `needle`, as `(level, message)` pairs.
    pub fn take_matching(&mut self, needle: &str) -> Vec<(log::Level, String)> {
        let mut found = Vec::new();
        while let Some(record) = self.guard.pop() {
            let message = record.args().to_string();
            if message.contains(needle) {
                found.push((record.level(), message));
            }
        }
        found
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

impl std::ops::Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl std::ops::DerefMut for LoggerHandle {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.guard }
}

/// rstest fixture yielding a cleared [`LoggerHandle`].
#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logger() -> LoggerHandle {
    let mut handle = LoggerHandle::new();
    while handle.pop().is_some() {}
    handle
}
