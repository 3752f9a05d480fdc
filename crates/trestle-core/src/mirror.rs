use crate::model::{FormData, FormType};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;

/// Best-effort secondary sink for submitted pages. Invoked after the primary
/// store has accepted the write; its outcome never feeds back into the
/// primary verdict.
#[async_trait]
pub trait SecondarySink: Send + Sync {
    async fn record(
        &self,
        assessment_id: &str,
        form_type: FormType,
        action_type: &str,
        data: &FormData,
    ) -> anyhow::Result<()>;
    fn sink_name(&self) -> &'static str;
}

/// Appends each accepted submission as one JSON line. Stands in for the
/// spreadsheet mirror of the original deployment.
pub struct JsonlSink {
    pub path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SecondarySink for JsonlSink {
    async fn record(
        &self,
        assessment_id: &str,
        form_type: FormType,
        action_type: &str,
        data: &FormData,
    ) -> anyhow::Result<()> {
        let line = serde_json::json!({
            "assessment_id": assessment_id,
            "form_type": form_type.as_str(),
            "action_type": action_type,
            "recorded_at": chrono::Utc::now().to_rfc3339(),
            "data": data,
        });
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "{}", serde_json::to_string(&line)?)?;
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "jsonl"
    }
}
