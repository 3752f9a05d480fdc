use super::key::submission_key;
use super::{Coordinator, SubmitReceipt, SubmitRequest};
use crate::errors::ClientError;
use crate::mirror::SecondarySink;
use crate::model::{FormData, FormType};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Client-side state for one multi-page flow: the cached assessment id and
/// the in-flight dedup set. One session per flow; dropping it forgets the id.
pub struct SubmissionSession {
    coordinator: Arc<dyn Coordinator>,
    mirror: Option<Arc<dyn SecondarySink>>,
    policy: RetryPolicy,
    dedup_ttl: Duration,
    assessment_id: Mutex<Option<String>>,
    in_flight: Mutex<HashMap<String, Instant>>,
}

impl SubmissionSession {
    pub fn new(coordinator: Arc<dyn Coordinator>) -> Self {
        Self {
            coordinator,
            mirror: None,
            policy: RetryPolicy::default(),
            dedup_ttl: Duration::from_secs(30),
            assessment_id: Mutex::new(None),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn SecondarySink>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_dedup_ttl(mut self, ttl: Duration) -> Self {
        self.dedup_ttl = ttl;
        self
    }

    pub fn assessment_id(&self) -> Option<String> {
        self.assessment_id.lock().unwrap().clone()
    }

    /// Submit one page. Attaches the cached assessment id, collapses an
    /// identical in-flight submission, retries transient transport failures
    /// (safe: the server-side upsert is idempotent per page), and caches the
    /// resolved id for the pages that follow.
    pub async fn submit(
        &self,
        form_type: FormType,
        action_type: &str,
        data: FormData,
    ) -> Result<SubmitReceipt, ClientError> {
        let key = submission_key(form_type, action_type, &data);
        self.claim_in_flight(&key)?;

        let req = SubmitRequest {
            assessment_id: self.assessment_id(),
            form_type,
            action_type: action_type.to_string(),
            data,
        };

        let result = self.submit_with_retry(&req).await;
        self.release_in_flight(&key);

        let receipt = result?;
        *self.assessment_id.lock().unwrap() = Some(receipt.assessment_id.clone());

        if let Some(mirror) = &self.mirror {
            // Best effort only: the primary result is already decided.
            if let Err(e) = mirror
                .record(&receipt.assessment_id, form_type, action_type, &req.data)
                .await
            {
                tracing::warn!(
                    event = "mirror_failed",
                    sink = mirror.sink_name(),
                    assessment_id = %receipt.assessment_id,
                    form_type = form_type.as_str(),
                    error = %e,
                    "secondary sink write failed"
                );
            }
        }

        Ok(receipt)
    }

    /// Mark the flow complete. Requires a cached id: finalize never creates
    /// an assessment, so calling it before any page was saved is a bug here.
    pub async fn finalize(&self) -> Result<(), ClientError> {
        let id = self
            .assessment_id()
            .ok_or(ClientError::MissingAssessmentId)?;

        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            match self.coordinator.finalize(&id).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    last_error = e.to_string();
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
        Err(ClientError::RetriesExhausted {
            attempts: self.policy.max_attempts,
            last_error,
        })
    }

    async fn submit_with_retry(&self, req: &SubmitRequest) -> Result<SubmitReceipt, ClientError> {
        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            match self.coordinator.submit_form(req).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    tracing::warn!(
                        event = "submit_retry",
                        coordinator = self.coordinator.coordinator_name(),
                        form_type = req.form_type.as_str(),
                        attempt,
                        error = %e,
                        "transient submit failure, retrying"
                    );
                    last_error = e.to_string();
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
        Err(ClientError::RetriesExhausted {
            attempts: self.policy.max_attempts,
            last_error,
        })
    }

    fn claim_in_flight(&self, key: &str) -> Result<(), ClientError> {
        let mut set = self.in_flight.lock().unwrap();
        let ttl = self.dedup_ttl;
        // Stale entries from calls that never returned are dropped first
        set.retain(|_, started| started.elapsed() < ttl);
        if set.contains_key(key) {
            return Err(ClientError::AlreadyInFlight);
        }
        set.insert(key.to_string(), Instant::now());
        Ok(())
    }

    fn release_in_flight(&self, key: &str) {
        self.in_flight.lock().unwrap().remove(key);
    }
}
