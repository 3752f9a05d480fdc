use serde::{Deserialize, Serialize};

/// Schema-free field mapping for one form page. Values are whatever the page
/// sends: strings for most inputs, numbers/arrays/sub-objects for the rest.
pub type FormData = serde_json::Map<String, serde_json::Value>;

/// Tag identifying which of the three fixed pages a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    Form1,
    Form2,
    Form3,
}

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Form1 => "form1",
            FormType::Form2 => "form2",
            FormType::Form3 => "form3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "form1" => Some(FormType::Form1),
            "form2" => Some(FormType::Form2),
            "form3" => Some(FormType::Form3),
            _ => None,
        }
    }

    pub fn all() -> [FormType; 3] {
        [FormType::Form1, FormType::Form2, FormType::Form3]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    InProgress,
    Complete,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::InProgress => "in_progress",
            AssessmentStatus::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "complete" => AssessmentStatus::Complete,
            _ => AssessmentStatus::InProgress,
        }
    }
}

/// One inspection, spanning up to three form pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRow {
    pub assessment_id: String,
    pub status: AssessmentStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Latest saved data for one page of one assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub submission_id: i64,
    pub assessment_id: String,
    pub form_type: FormType,
    pub action_type: String,
    pub data: FormData,
    pub created_at: String,
    pub updated_at: String,
}

/// Result of a successful upsert: the resolved assessment id (always defined,
/// even when the caller supplied none) and the affected submission row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub assessment_id: String,
    pub submission_id: i64,
}
