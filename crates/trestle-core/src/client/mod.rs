use crate::errors::ClientError;
use crate::model::{FormData, FormType};
use async_trait::async_trait;

/// Transport seam between the submission session and the API boundary. The
/// real implementation speaks HTTP; tests swap in an in-memory fake.
#[async_trait]
pub trait Coordinator: Send + Sync {
    async fn submit_form(&self, req: &SubmitRequest) -> Result<SubmitReceipt, ClientError>;
    async fn finalize(&self, assessment_id: &str) -> Result<(), ClientError>;
    fn coordinator_name(&self) -> &'static str;
}

/// One page submission as handed to the transport.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub assessment_id: Option<String>,
    pub form_type: FormType,
    pub action_type: String,
    pub data: FormData,
}

/// Wire-shaped acknowledgement. Identifiers stay strings here; only the
/// Store knows submission ids are rowids.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub assessment_id: String,
    pub submission_id: String,
}

pub mod fake;
pub mod http;
pub mod key;
pub mod session;
