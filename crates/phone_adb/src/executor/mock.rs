//! Scripted command runner for testing without a device
//!
//! `ScriptedRunner` never spawns anything. Each call is recorded and answered
//! by a responder closure, which lets tests replay captured adb output and
//! assert on the exact argument lists that were issued.
//!
//! ```ignore
//! let runner = ScriptedRunner::new(|args| {
//!     Ok(ExecutionResult::from_output(0, "connected to 10.0.0.2:5555\n", ""))
//! });
//! let conn = AdbConnection::with_runner(runner.clone(), Arc::new(TimingConfig::default()));
//! conn.connect("10.0.0.2", Duration::from_secs(5)).await?;
//! assert_eq!(runner.calls()[0], vec!["connect", "10.0.0.2:5555"]);
//! ```

use super::{CommandRunner, ExecutionResult};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = dyn Fn(&[String]) -> Result<ExecutionResult> + Send + Sync;

/// Records every invocation and answers from a closure
///
/// Clones share the call log and the responder.
#[derive(Clone)]
pub struct ScriptedRunner {
    responder: Arc<Responder>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedRunner {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&[String]) -> Result<ExecutionResult> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A runner that answers every call with empty, successful output
    pub fn succeeding() -> Self {
        Self::new(|_| Ok(ExecutionResult::from_output(0, "", "")))
    }

    /// Argument lists of every call so far, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for ScriptedRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedRunner")
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, args: &[String], _timeout: Duration) -> Result<ExecutionResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.to_vec());
        }
        (self.responder)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdbError;

    #[tokio::test]
    async fn test_records_calls_across_clones() {
        let runner = ScriptedRunner::succeeding();
        let clone = runner.clone();

        clone
            .run(&["devices".to_string()], Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(runner.call_count(), 1);
        assert_eq!(runner.calls()[0], vec!["devices".to_string()]);
    }

    #[tokio::test]
    async fn test_responder_errors_propagate() {
        let runner = ScriptedRunner::new(|_| Err(AdbError::Timeout("scripted".to_string())));
        let err = runner.run(&[], Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, AdbError::Timeout(_)));
    }
}
