//! Index build-status polling.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::BackendError;
use crate::traits::SchemaManager;
use crate::types::IndexStatus;

/// Polls an index until it reaches a target build status.
///
/// Defaults: target [`IndexStatus::Registered`], 60 second timeout, 500ms
/// poll interval. A `None` timeout waits indefinitely.
///
/// ```ignore
/// IndexStatusWatcher::new(graph.schema(), "graph-name-index")
///     .status(&[IndexStatus::Registered, IndexStatus::Enabled])
///     .timeout(Some(Duration::from_secs(10)))
///     .call()
///     .await?;
/// ```
pub struct IndexStatusWatcher<'a> {
    schema: &'a dyn SchemaManager,
    index_name: String,
    statuses: Vec<IndexStatus>,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl<'a> IndexStatusWatcher<'a> {
    /// Create a watcher for `index_name` with default target and intervals.
    pub fn new(schema: &'a dyn SchemaManager, index_name: impl Into<String>) -> Self {
        Self {
            schema,
            index_name: index_name.into(),
            statuses: vec![IndexStatus::Registered],
            timeout: Some(Duration::from_secs(60)),
            poll_interval: Duration::from_millis(500),
        }
    }

    /// Set the target statuses; reaching any of them completes the watch.
    pub fn status(mut self, statuses: &[IndexStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    /// Set the maximum wall-clock wait. `None` waits indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout in whole seconds; a negative value waits indefinitely.
    pub fn timeout_secs(self, secs: i64) -> Self {
        let timeout = u64::try_from(secs).ok().map(Duration::from_secs);
        self.timeout(timeout)
    }

    /// Set the interval between status reads.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn targets_to_string(&self) -> String {
        self.statuses
            .iter()
            .map(IndexStatus::to_string)
            .collect::<Vec<_>>()
            .join(" or ")
    }

    /// Poll until the index reaches a target status.
    ///
    /// Returns the status that satisfied the watch, or
    /// [`BackendError::IndexBuildTimeout`] once the timeout elapses.
    pub async fn call(self) -> Result<IndexStatus, BackendError> {
        let started = Instant::now();
        debug!(
            "awaiting status {} on index '{}'",
            self.targets_to_string(),
            self.index_name
        );

        loop {
            let status = self.schema.index_status(&self.index_name).await?;
            if self.statuses.contains(&status) {
                debug!(
                    "index '{}' reached status {} after {:?}",
                    self.index_name,
                    status,
                    started.elapsed()
                );
                return Ok(status);
            }

            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    return Err(BackendError::index_build_timeout(
                        &self.index_name,
                        self.targets_to_string(),
                        limit,
                    ));
                }
            }

            trace!(
                "index '{}' at status {}, polling again in {:?}",
                self.index_name,
                status,
                self.poll_interval
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
