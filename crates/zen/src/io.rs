//! Output sinks for the `print` builtin.

use std::io::{self, Write as _};

/// Trait for handling output from the `print()` builtin function.
///
/// Implement this trait to capture or redirect print output from embedded Zen
/// code. The default implementation [`StdPrint`] writes to stdout.
pub trait PrintWriter {
    /// Called with the fully formatted output of one `print()` call,
    /// including the trailing newline.
    fn write(&mut self, output: &str);
}

/// Default `PrintWriter` that writes to stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn write(&mut self, output: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(output.as_bytes());
        let _ = stdout.flush();
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Returns the collected output as a string slice.
    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn write(&mut self, output: &str) {
        self.0.push_str(output);
    }
}

/// `PrintWriter` that ignores all output.
///
/// Useful for suppressing print output during testing or benchmarking.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write(&mut self, _output: &str) {}
}
