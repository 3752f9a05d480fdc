use super::{Coordinator, SubmitReceipt, SubmitRequest};
use crate::errors::ClientError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub struct HttpCoordinator {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl HttpCoordinator {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn classify(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let message = match resp.json::<Value>().await {
            Ok(body) => body
                .get("error")
                .or_else(|| body.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("request failed")
                .to_string(),
            Err(_) => "request failed".to_string(),
        };
        if status.is_client_error() {
            ClientError::Rejected {
                status: status.as_u16(),
                message,
            }
        } else {
            // 5xx: the store-side transaction aborted wholly, retry is safe
            ClientError::Transport(format!("server error {}: {}", status.as_u16(), message))
        }
    }
}

#[async_trait]
impl Coordinator for HttpCoordinator {
    async fn submit_form(&self, req: &SubmitRequest) -> Result<SubmitReceipt, ClientError> {
        // Field data rides at the top level of the body next to the metadata,
        // matching the schema-free intake shape.
        let mut body = serde_json::Map::new();
        if let Some(id) = &req.assessment_id {
            body.insert("assessment_id".into(), json!(id));
        }
        body.insert("form_type".into(), json!(req.form_type.as_str()));
        body.insert("action_type".into(), json!(req.action_type));
        for (k, v) in &req.data {
            body.entry(k.clone()).or_insert_with(|| v.clone());
        }

        let url = format!("{}/api/forms", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::classify(resp).await);
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let assessment_id = body
            .get("assessment_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ClientError::Transport("response missing assessment_id".into()))?
            .to_string();
        let submission_id = body
            .get("submission_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ClientError::Transport("response missing submission_id".into()))?
            .to_string();

        Ok(SubmitReceipt {
            assessment_id,
            submission_id,
        })
    }

    async fn finalize(&self, assessment_id: &str) -> Result<(), ClientError> {
        let url = format!(
            "{}/api/assessments/{}/finalize",
            self.base_url, assessment_id
        );
        let resp = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::classify(resp).await);
        }
        Ok(())
    }

    fn coordinator_name(&self) -> &'static str {
        "http"
    }
}
