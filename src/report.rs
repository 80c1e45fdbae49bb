//! Error accumulation for the reconciliation sweep.

/// Collects every anomaly and failed remote call encountered during a run.
///
/// Reported errors are logged the moment they are recorded; the accumulated
/// list decides the process exit status once the sweep completes. The sweep
/// itself never aborts on a reported error.
#[derive(Debug, Default)]
pub struct ErrorSink {
    errors: Vec<String>,
}

impl ErrorSink {
    pub fn new() -> ErrorSink {
        ErrorSink::default()
    }

    pub fn report(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.errors.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}
