use super::{Coordinator, SubmitReceipt, SubmitRequest};
use crate::errors::ClientError;
use crate::model::FormType;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory coordinator for session tests. Mirrors the store's contract:
/// mints an id when none is supplied, keeps one row per (assessment,
/// form_type), finalize on an unknown id is a 404.
#[derive(Default)]
pub struct FakeCoordinator {
    pub assessments: Mutex<HashMap<String, HashSet<FormType>>>,
    pub finalized: Mutex<HashSet<String>>,
    pub submit_calls: AtomicU32,
    transport_failures: AtomicU32,
    next_submission_id: AtomicU64,
}

impl FakeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next `n` submit calls fail with a transport error before recording.
    pub fn fail_next_submits(&self, n: u32) {
        self.transport_failures.store(n, Ordering::SeqCst);
    }

    pub fn form_count(&self, assessment_id: &str) -> usize {
        self.assessments
            .lock()
            .unwrap()
            .get(assessment_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Coordinator for FakeCoordinator {
    async fn submit_form(&self, req: &SubmitRequest) -> Result<SubmitReceipt, ClientError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.transport_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transport_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ClientError::Transport("injected failure".into()));
        }

        let id = match &req.assessment_id {
            Some(id) => id.clone(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        self.assessments
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default()
            .insert(req.form_type);

        let sid = self.next_submission_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SubmitReceipt {
            assessment_id: id,
            submission_id: sid.to_string(),
        })
    }

    async fn finalize(&self, assessment_id: &str) -> Result<(), ClientError> {
        if !self
            .assessments
            .lock()
            .unwrap()
            .contains_key(assessment_id)
        {
            return Err(ClientError::Rejected {
                status: 404,
                message: "assessment not found".into(),
            });
        }
        self.finalized
            .lock()
            .unwrap()
            .insert(assessment_id.to_string());
        Ok(())
    }

    fn coordinator_name(&self) -> &'static str {
        "fake"
    }
}
