use crate::errors::StoreError;
use crate::model::{
    AssessmentRow, AssessmentStatus, FormData, FormType, SubmissionRow, SubmitOutcome,
};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Store {
    pub conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    /// Insert-or-replace one page's data for an assessment, creating the
    /// parent assessment on first contact. Runs as a single transaction:
    /// either the assessment, the submission row and the parent touch all
    /// land, or none of them do.
    ///
    /// Accepts a caller-supplied id that storage has never seen — a retry can
    /// race a creation that never committed, and failing it would strand the
    /// client.
    pub fn upsert_submission(
        &self,
        assessment_id: Option<&str>,
        form_type: FormType,
        action_type: &str,
        data: &FormData,
    ) -> Result<SubmitOutcome, StoreError> {
        if action_type.trim().is_empty() {
            return Err(StoreError::Invalid("action_type is required".into()));
        }

        let data_json = serde_json::to_string(data)?;
        let now = now_rfc3339();

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let resolved_id = match assessment_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };

        // Parent first: no-op if the assessment already exists, otherwise
        // created in_progress with whichever id we resolved above.
        tx.execute(
            "INSERT INTO assessments(assessment_id, status, created_at, updated_at)
             VALUES (?1, 'in_progress', ?2, ?2)
             ON CONFLICT(assessment_id) DO NOTHING",
            params![resolved_id, now],
        )?;

        // Last write wins at page granularity: the whole payload is replaced,
        // created_at is preserved from the first save.
        tx.execute(
            "INSERT INTO submissions(assessment_id, form_type, action_type, data_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(assessment_id, form_type) DO UPDATE SET
                action_type=excluded.action_type,
                data_json=excluded.data_json,
                updated_at=excluded.updated_at",
            params![resolved_id, form_type.as_str(), action_type, data_json, now],
        )?;

        let submission_id: i64 = tx.query_row(
            "SELECT id FROM submissions WHERE assessment_id=?1 AND form_type=?2",
            params![resolved_id, form_type.as_str()],
            |r| r.get(0),
        )?;

        tx.execute(
            "UPDATE assessments SET updated_at=?1 WHERE assessment_id=?2",
            params![now, resolved_id],
        )?;

        tx.commit()?;

        Ok(SubmitOutcome {
            assessment_id: resolved_id,
            submission_id,
        })
    }

    /// Mark an assessment complete. Idempotent; never creates a row. Does not
    /// require all three pages to have been saved first, so a client whose
    /// retries gave up on one page can still close out the flow.
    pub fn finalize(&self, assessment_id: &str) -> Result<(), StoreError> {
        let now = now_rfc3339();
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE assessments SET status='complete', updated_at=?1 WHERE assessment_id=?2",
            params![now, assessment_id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Assessment plus its per-page submissions, pages in form-type order.
    pub fn fetch_assessment(
        &self,
        assessment_id: &str,
    ) -> Result<Option<(AssessmentRow, Vec<SubmissionRow>)>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let assessment = conn
            .query_row(
                "SELECT assessment_id, status, created_at, updated_at
                 FROM assessments WHERE assessment_id=?1",
                params![assessment_id],
                |row| {
                    Ok(AssessmentRow {
                        assessment_id: row.get(0)?,
                        status: AssessmentStatus::parse(&row.get::<_, String>(1)?),
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()?;

        let Some(assessment) = assessment else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT id, assessment_id, form_type, action_type, data_json, created_at, updated_at
             FROM submissions WHERE assessment_id=?1 ORDER BY form_type ASC",
        )?;
        let rows = stmt.query_map(params![assessment_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut submissions = Vec::new();
        for row in rows {
            let (id, aid, ft, action, data_json, created, updated) = row?;
            let form_type = FormType::parse(&ft)
                .ok_or_else(|| StoreError::Invalid(format!("unknown form_type in db: {ft}")))?;
            let data: FormData = serde_json::from_str(&data_json)?;
            submissions.push(SubmissionRow {
                submission_id: id,
                assessment_id: aid,
                form_type,
                action_type: action,
                data,
                created_at: created,
                updated_at: updated,
            });
        }

        Ok(Some((assessment, submissions)))
    }

    pub fn count_rows(&self, table: &str) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        // Allowlist to keep table interpolation injection-safe
        if !["assessments", "submissions"].contains(&table) {
            anyhow::bail!("invalid table name for count_rows: {}", table);
        }
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let n: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n)
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
