use tokio::time::Instant;
use tracing::trace;

use crate::ClientApiResult;

/// Traces one key/value operation when dropped: its name, key, outcome code
/// and elapsed time.
///
/// Dropping the timer without [`finish`](OpTimer::finish), e.g. when the
/// caller abandons the operation future, reports the outcome `ABANDONED`.
pub(crate) struct OpTimer<'a> {
    start: Instant,
    op: &'static str,
    key: &'a str,
    outcome: Option<String>,
}

impl<'a> OpTimer<'a> {
    pub(crate) fn new(
        op: &'static str,
        key: &'a str,
    ) -> Self {
        Self {
            start: Instant::now(),
            op,
            key,
            outcome: None,
        }
    }

    /// Records the outcome of the operation and passes the result through.
    pub(crate) fn finish<T>(
        mut self,
        result: ClientApiResult<T>,
    ) -> ClientApiResult<T> {
        self.outcome = Some(match &result {
            Ok(_) => "OK".to_string(),
            Err(e) => e.code().to_string(),
        });
        result
    }
}

impl Drop for OpTimer<'_> {
    fn drop(&mut self) {
        let outcome = self.outcome.as_deref().unwrap_or("ABANDONED");
        trace!(
            op = %self.op,
            key = %self.key,
            outcome = %outcome,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            "etcd operation finished"
        );
    }
}
