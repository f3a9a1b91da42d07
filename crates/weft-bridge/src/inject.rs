//! Script injection helpers.
//!
//! Scripts injected into the webview are wrapped so that an exception is
//! reported through the page's log channel before being re-thrown. On the Rust
//! side, [`InjectionScope`] gives the same guarantee around whatever runs the
//! script: failures are reported, then propagated.

use std::fmt::Display;

use crate::error::BridgeError;

/// Wrap a script in try/catch that logs through `window.logMessage` (or
/// `console.error`) and re-throws. The trailing `true;` keeps platforms that
/// evaluate the result from choking on non-serializable values.
pub fn wrap_injected_script(js: &str) -> String {
    format!(
        "\ntry {{\n\t{js}\n}}\ncatch(e) {{\n\t(window.logMessage || console.error)('Error in injected JS:' + e, e);\n\tthrow e;\n}};\n\ntrue;"
    )
}

/// Scoped failure reporter for running injected scripts.
///
/// Created before a script runs. If the scope is left by an error it is
/// reported and converted into [`BridgeError::InjectionFailure`]; if it is left
/// by unwinding it is reported from `Drop` and the panic continues.
pub struct InjectionScope<F: FnMut(String)> {
    report: Option<F>,
    label: String,
}

impl<F: FnMut(String)> InjectionScope<F> {
    pub fn new(label: impl Into<String>, report: F) -> Self {
        Self {
            report: Some(report),
            label: label.into(),
        }
    }

    /// Run `f` inside the scope.
    pub fn run<R, E: Display>(mut self, f: impl FnOnce() -> Result<R, E>) -> Result<R, BridgeError> {
        match f() {
            Ok(value) => {
                self.report = None;
                Ok(value)
            }
            Err(e) => {
                let message = format!("Error in injected JS:{e}");
                if let Some(mut report) = self.report.take() {
                    report(format!("{}: {message}", self.label));
                }
                Err(BridgeError::InjectionFailure(e.to_string()))
            }
        }
    }
}

impl<F: FnMut(String)> Drop for InjectionScope<F> {
    fn drop(&mut self) {
        if let Some(mut report) = self.report.take() {
            if std::thread::panicking() {
                report(format!("{}: Error in injected JS: panicked", self.label));
            }
        }
    }
}
