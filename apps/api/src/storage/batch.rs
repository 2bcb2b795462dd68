//! Batch upload orchestrator: fans N uploads out through the blob store with
//! bounded concurrency. One item's failure is reported in its slot of the
//! result, never raised to the caller.

use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::warn;

use crate::storage::ObjectStore;

pub struct UploadItem {
    pub key: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub key: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Uploads every item, at most `max_concurrency` in flight, each bounded by
/// `timeout`. Outcomes come back in input order, one per item.
pub async fn upload_batch(
    store: &dyn ObjectStore,
    items: Vec<UploadItem>,
    max_concurrency: usize,
    timeout: Duration,
) -> Vec<UploadOutcome> {
    let mut outcomes: Vec<(usize, UploadOutcome)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| async move {
            let outcome = match tokio::time::timeout(timeout, store.put(&item.key, item.bytes))
                .await
            {
                Ok(Ok(())) => UploadOutcome {
                    key: item.key,
                    success: true,
                    error: None,
                },
                Ok(Err(e)) => {
                    warn!("Upload of '{}' failed: {e}", item.key);
                    UploadOutcome {
                        key: item.key,
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
                Err(_) => {
                    warn!("Upload of '{}' timed out after {:?}", item.key, timeout);
                    UploadOutcome {
                        key: item.key,
                        success: false,
                        error: Some(format!("upload timed out after {}s", timeout.as_secs())),
                    }
                }
            };
            (index, outcome)
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::storage::StorageError;

    /// Fails any upload whose key contains the configured marker; records
    /// peak concurrency across all puts.
    #[derive(Default)]
    struct ProbeStore {
        fail_marker: Option<String>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        stored: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for ProbeStore {
        async fn put(&self, key: &str, _bytes: Bytes) -> Result<(), StorageError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(marker) = &self.fail_marker {
                if key.contains(marker.as_str()) {
                    return Err(StorageError::Upload("simulated outage".to_string()));
                }
            }
            self.stored.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn presigned_get_url(
            &self,
            _key: &str,
            _expires_in: Duration,
        ) -> Result<String, StorageError> {
            unimplemented!("not used in upload tests")
        }

        async fn presigned_put_url(
            &self,
            _key: &str,
            _expires_in: Duration,
        ) -> Result<String, StorageError> {
            unimplemented!("not used in upload tests")
        }
    }

    fn items(keys: &[&str]) -> Vec<UploadItem> {
        keys.iter()
            .map(|k| UploadItem {
                key: k.to_string(),
                bytes: Bytes::from_static(b"payload"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_failure_is_isolated() {
        let store = ProbeStore {
            fail_marker: Some("broken".to_string()),
            ..Default::default()
        };

        let outcomes = upload_batch(
            &store,
            items(&["a", "b", "broken", "d", "e"]),
            3,
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(outcomes.len(), 5);
        let failures: Vec<_> = outcomes.iter().filter(|o| !o.success).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, "broken");
        assert!(failures[0].error.as_deref().unwrap().contains("outage"));
        assert!(outcomes.iter().filter(|o| o.success).count() == 4);
    }

    #[tokio::test]
    async fn test_outcomes_preserve_input_order() {
        let store = ProbeStore::default();
        let keys = ["k0", "k1", "k2", "k3", "k4", "k5"];

        let outcomes = upload_batch(&store, items(&keys), 4, Duration::from_secs(5)).await;

        let returned: Vec<&str> = outcomes.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(returned, keys);
    }

    #[tokio::test]
    async fn test_concurrency_stays_within_bound() {
        let store = ProbeStore::default();
        let keys: Vec<String> = (0..20).map(|i| format!("k{i}")).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();

        upload_batch(&store, items(&key_refs), 3, Duration::from_secs(5)).await;

        assert!(store.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(store.stored.lock().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_empty_batch_returns_no_outcomes() {
        let store = ProbeStore::default();
        let outcomes = upload_batch(&store, Vec::new(), 5, Duration::from_secs(5)).await;
        assert!(outcomes.is_empty());
    }

    /// Hangs forever on a chosen key so the per-item timeout path fires.
    struct StallingStore {
        stall_key: String,
    }

    #[async_trait]
    impl ObjectStore for StallingStore {
        async fn put(&self, key: &str, _bytes: Bytes) -> Result<(), StorageError> {
            if key == self.stall_key {
                futures::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn presigned_get_url(
            &self,
            _key: &str,
            _expires_in: Duration,
        ) -> Result<String, StorageError> {
            unimplemented!("not used in upload tests")
        }

        async fn presigned_put_url(
            &self,
            _key: &str,
            _expires_in: Duration,
        ) -> Result<String, StorageError> {
            unimplemented!("not used in upload tests")
        }
    }

    #[tokio::test]
    async fn test_timed_out_upload_reports_failure() {
        let store = StallingStore {
            stall_key: "stuck".to_string(),
        };

        let outcomes = upload_batch(
            &store,
            items(&["ok", "stuck"]),
            2,
            Duration::from_millis(20),
        )
        .await;

        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(outcomes[1].error.as_deref().unwrap().contains("timed out"));
    }
}
