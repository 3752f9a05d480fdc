use serde_json::json;
use tempfile::tempdir;
use trestle_core::errors::StoreError;
use trestle_core::model::{AssessmentStatus, FormData, FormType};
use trestle_core::storage::store::Store;

fn data(pairs: &[(&str, &str)]) -> FormData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect()
}

#[test]
fn upsert_is_idempotent_per_page() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let first = data(&[("riverName", "Ganges")]);
    let out1 = store.upsert_submission(None, FormType::Form1, "save", &first)?;

    let second = data(&[("riverName", "Yamuna")]);
    let out2 = store.upsert_submission(
        Some(&out1.assessment_id),
        FormType::Form1,
        "save",
        &second,
    )?;

    assert_eq!(out1.assessment_id, out2.assessment_id);
    assert_eq!(out1.submission_id, out2.submission_id);
    assert_eq!(store.count_rows("assessments")?, 1);
    assert_eq!(store.count_rows("submissions")?, 1);

    // Second call's data wins wholesale
    let (_, subs) = store.fetch_assessment(&out1.assessment_id)?.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].data.get("riverName"), Some(&json!("Yamuna")));
    Ok(())
}

#[test]
fn minted_ids_are_fresh_and_reusable() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let a = store.upsert_submission(None, FormType::Form1, "next", &data(&[("x", "1")]))?;
    let b = store.upsert_submission(None, FormType::Form1, "next", &data(&[("x", "1")]))?;
    assert_ne!(a.assessment_id, b.assessment_id);
    assert_eq!(store.count_rows("assessments")?, 2);

    // Reusing a returned id does not create another assessment
    store.upsert_submission(
        Some(&a.assessment_id),
        FormType::Form2,
        "next",
        &data(&[("y", "2")]),
    )?;
    assert_eq!(store.count_rows("assessments")?, 2);
    Ok(())
}

#[test]
fn unknown_supplied_id_creates_the_assessment() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    // A retry can carry an id whose original creation never committed
    let out = store.upsert_submission(
        Some("client-made-id-001"),
        FormType::Form2,
        "save",
        &data(&[("structural_condition", "Fair")]),
    )?;
    assert_eq!(out.assessment_id, "client-made-id-001");

    let (assessment, _) = store.fetch_assessment("client-made-id-001")?.unwrap();
    assert_eq!(assessment.status, AssessmentStatus::InProgress);
    Ok(())
}

#[test]
fn pages_are_disjoint_rows_under_one_assessment() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let out = store.upsert_submission(None, FormType::Form1, "next", &data(&[("a", "1")]))?;
    let id = out.assessment_id;
    store.upsert_submission(Some(&id), FormType::Form2, "next", &data(&[("b", "2")]))?;
    store.upsert_submission(Some(&id), FormType::Form1, "save", &data(&[("a", "3")]))?;

    assert_eq!(store.count_rows("assessments")?, 1);
    assert_eq!(store.count_rows("submissions")?, 2);

    let (_, subs) = store.fetch_assessment(&id)?.unwrap();
    let form1: Vec<_> = subs
        .iter()
        .filter(|s| s.form_type == FormType::Form1)
        .collect();
    assert_eq!(form1.len(), 1);
    assert_eq!(form1[0].action_type, "save");
    Ok(())
}

#[test]
fn finalize_is_terminal_and_idempotent() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let out = store.upsert_submission(None, FormType::Form1, "next", &data(&[("a", "1")]))?;
    store.finalize(&out.assessment_id)?;
    store.finalize(&out.assessment_id)?;

    let (assessment, _) = store.fetch_assessment(&out.assessment_id)?.unwrap();
    assert_eq!(assessment.status, AssessmentStatus::Complete);
    Ok(())
}

#[test]
fn finalize_unknown_id_is_not_found_and_creates_nothing() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let err = store.finalize("no-such-assessment").unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
    assert_eq!(store.count_rows("assessments")?, 0);
    Ok(())
}

#[test]
fn empty_action_type_is_rejected_before_storage() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let err = store
        .upsert_submission(None, FormType::Form1, "  ", &data(&[("a", "1")]))
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
    assert_eq!(store.count_rows("assessments")?, 0);
    Ok(())
}

#[test]
fn deleting_an_assessment_cascades_to_submissions() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let out = store.upsert_submission(None, FormType::Form1, "next", &data(&[("a", "1")]))?;
    store.upsert_submission(
        Some(&out.assessment_id),
        FormType::Form2,
        "next",
        &data(&[("b", "2")]),
    )?;

    {
        let conn = store.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM assessments WHERE assessment_id=?1",
            rusqlite::params![out.assessment_id],
        )?;
    }
    assert_eq!(store.count_rows("submissions")?, 0);
    Ok(())
}

#[test]
fn full_inspection_flow_on_disk() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let store = Store::open(&dir.path().join("intake.db"))?;
    store.init_schema()?;

    let page1 = data(&[
        ("riverName", "Ganges"),
        ("roadName", "NH19"),
        ("chainage", "12+300"),
    ]);
    let out = store.upsert_submission(None, FormType::Form1, "next", &page1)?;
    let id = out.assessment_id.clone();

    let page2 = data(&[("structural_condition", "Fair")]);
    let out2 = store.upsert_submission(Some(&id), FormType::Form2, "next", &page2)?;
    assert_eq!(out2.assessment_id, id);

    store.finalize(&id)?;

    let (assessment, subs) = store.fetch_assessment(&id)?.unwrap();
    assert_eq!(assessment.status, AssessmentStatus::Complete);
    assert_eq!(subs.len(), 2);

    let by_type = |ft: FormType| subs.iter().find(|s| s.form_type == ft).unwrap();
    assert_eq!(
        by_type(FormType::Form1).data.get("riverName"),
        Some(&json!("Ganges"))
    );
    assert_eq!(
        by_type(FormType::Form2).data.get("structural_condition"),
        Some(&json!("Fair"))
    );
    Ok(())
}

#[test]
fn concurrent_same_page_upserts_keep_one_row() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let store = Store::open(&dir.path().join("race.db"))?;
    store.init_schema()?;

    let seed = store.upsert_submission(None, FormType::Form1, "next", &data(&[("v", "seed")]))?;
    let id = seed.assessment_id;

    let mut handles = Vec::new();
    for payload in ["left", "right"] {
        let store = store.clone();
        let id = id.clone();
        handles.push(std::thread::spawn(move || {
            store.upsert_submission(Some(&id), FormType::Form1, "save", &data(&[("v", payload)]))
        }));
    }
    for h in handles {
        h.join().unwrap()?;
    }

    assert_eq!(store.count_rows("submissions")?, 1);
    let (_, subs) = store.fetch_assessment(&id)?.unwrap();
    let v = subs[0].data.get("v").and_then(|v| v.as_str()).unwrap();
    assert!(v == "left" || v == "right", "unexpected payload: {v}");
    Ok(())
}
