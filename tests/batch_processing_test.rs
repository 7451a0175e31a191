//! Integration tests for directory batches
//!
//! These tests drive de-identification and re-identification through the
//! batch runner against a temporary directory tree and a shared mapping store.

use phimask::core::pipeline::{collect_inputs, run_batch, Deidentifier, DocumentJob, Reidentifier};
use phimask::document::Document;
use phimask::tokenization::{CollisionPolicy, MappingStore, MaskingEngine, RuleSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

const RULES: &str = r#"{"N1": {"1035": "PATIENT_NAME", "1036": "MEMBER_ID"}}"#;

fn claim(name: &str, member: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<x12>
  <loop id="N1">
    <ele id="1035">{name}</ele>
    <ele id="1036">{member}</ele>
    <ele id="1037">PAYER</ele>
  </loop>
</x12>
"#
    )
}

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("claims")).unwrap();
        Self { root }
    }

    fn claims(&self) -> PathBuf {
        self.root.path().join("claims")
    }

    fn add_claim(&self, file: &str, content: &str) -> PathBuf {
        let path = self.claims().join(file);
        fs::write(&path, content).unwrap();
        path
    }

    fn store(&self) -> MappingStore {
        MappingStore::new(self.root.path().join("mapping.json"))
    }

    fn deidentifier(&self, policy: CollisionPolicy) -> Deidentifier {
        let engine = MaskingEngine::new(RuleSet::from_json(RULES).unwrap()).with_policy(policy);
        Deidentifier::new(engine, self.store(), self.root.path().join("deid"))
            .with_folder(Some("claims".to_string()))
    }

    fn reidentifier(&self) -> Reidentifier {
        Reidentifier::new(self.store(), self.root.path().join("reid"))
            .with_folder(Some("claims".to_string()))
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_directory_round_trip() {
    let ws = Workspace::new();
    let originals = [
        ("a.xml", claim("Alice", "M-1")),
        ("b.xml", claim("Bob", "M-2")),
        ("c.xml", claim("Carol", "M-3")),
    ];
    for (file, content) in &originals {
        ws.add_claim(file, content);
    }

    let inputs = collect_inputs(&ws.claims(), "xml").unwrap();
    assert_eq!(inputs.folder.as_deref(), Some("claims"));

    let deid = Arc::new(ws.deidentifier(CollisionPolicy::Disambiguate));
    let summary = run_batch(deid, inputs.documents, 3).await;
    assert!(summary.is_successful());
    assert_eq!(summary.total_fields, 6);

    let deid_dir = ws.root.path().join("deid").join("claims");
    for (file, content) in &originals {
        let stem = file.trim_end_matches(".xml");
        let masked = read(&deid_dir.join(format!("{stem}_deidentified.xml")));
        assert_ne!(&masked, content);
        assert!(masked.contains(">PAYER<"));
    }

    // Every document's tokens share one store, so none may clash
    let mapping = ws.store().load().unwrap();
    assert_eq!(mapping.len(), 6);

    let masked_inputs = collect_inputs(&deid_dir, "xml").unwrap();
    let reid = Arc::new(ws.reidentifier());
    let summary = run_batch(reid, masked_inputs.documents, 2).await;
    assert!(summary.is_successful());

    let reid_dir = ws.root.path().join("reid").join("claims");
    for (file, content) in &originals {
        let stem = file.trim_end_matches(".xml");
        let restored = read(&reid_dir.join(format!("{stem}_reidentified.xml")));
        assert_eq!(&restored, content);
    }
}

#[tokio::test]
async fn test_later_documents_continue_numbering() {
    let ws = Workspace::new();
    ws.add_claim("a.xml", &claim("Alice", "M-1"));
    ws.add_claim("b.xml", &claim("Bob", "M-2"));

    let inputs = collect_inputs(&ws.claims(), "xml").unwrap();
    let summary = run_batch(
        Arc::new(ws.deidentifier(CollisionPolicy::Disambiguate)),
        inputs.documents,
        1,
    )
    .await;
    assert!(summary.is_successful());

    let mapping = ws.store().load().unwrap();
    assert_eq!(mapping.get("PATIENT_NAME"), Some("Alice"));
    assert_eq!(mapping.get("PATIENT_NAME_2"), Some("Bob"));
    assert_eq!(mapping.get("MEMBER_ID_2"), Some("M-2"));

    let masked = read(
        &ws.root
            .path()
            .join("deid")
            .join("claims")
            .join("b_deidentified.xml"),
    );
    assert!(masked.contains(">PATIENT_NAME_2<"));
}

#[tokio::test]
async fn test_reject_policy_fails_only_the_clashing_document() {
    let ws = Workspace::new();
    ws.add_claim("a.xml", &claim("Alice", "M-1"));
    ws.add_claim("b.xml", &claim("Bob", "M-2"));

    let inputs = collect_inputs(&ws.claims(), "xml").unwrap();
    let summary = run_batch(
        Arc::new(ws.deidentifier(CollisionPolicy::Reject)),
        inputs.documents,
        1,
    )
    .await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    let failures: Vec<_> = summary.failures().collect();
    assert!(failures[0].0.ends_with("b.xml"));
    assert_eq!(failures[0].1.kind, "token_collision");

    // The rejected document leaves no trace
    assert_eq!(ws.store().load().unwrap().len(), 2);
    assert!(!ws
        .root
        .path()
        .join("deid")
        .join("claims")
        .join("b_deidentified.xml")
        .exists());
}

#[tokio::test]
async fn test_malformed_document_is_skipped() {
    let ws = Workspace::new();
    ws.add_claim("a.xml", &claim("Alice", "M-1"));
    ws.add_claim("broken.xml", "<x12><loop id=\"N1\"><ele id=\"1035\">Bob</loop>");
    ws.add_claim("c.xml", &claim("Carol", "M-3"));
    ws.add_claim("notes.txt", "not a claim");

    let inputs = collect_inputs(&ws.claims(), "xml").unwrap();
    assert_eq!(inputs.documents.len(), 3);

    let summary = run_batch(
        Arc::new(ws.deidentifier(CollisionPolicy::Disambiguate)),
        inputs.documents,
        2,
    )
    .await;

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(summary.outcomes[1].input.ends_with("broken.xml"));
    assert_eq!(
        summary.outcomes[1].result.as_ref().unwrap_err().kind,
        "document_parse"
    );
    assert!(!ws.store().load().unwrap().iter().any(|(_, v)| v == "Bob"));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let ws = Workspace::new();
    let input = ws.add_claim("a.xml", &claim("Alice", "M-1"));

    let job = ws
        .deidentifier(CollisionPolicy::Disambiguate)
        .with_dry_run(true);
    let summary = run_batch(Arc::new(job), vec![input.clone()], 1).await;

    assert!(summary.is_successful());
    assert_eq!(summary.total_fields, 2);
    let processed = summary.outcomes[0].result.as_ref().unwrap();
    assert!(!processed.written);
    assert!(!processed.output.exists());
    assert!(!ws.store().path().exists());
    assert_eq!(read(&input), claim("Alice", "M-1"));
}

#[tokio::test]
async fn test_reidentify_without_store_fails_each_document() {
    let ws = Workspace::new();
    let input = ws.add_claim("a_deidentified.xml", &claim("PATIENT_NAME", "MEMBER_ID"));

    let summary = run_batch(Arc::new(ws.reidentifier()), vec![input], 1).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures().next().unwrap().1.kind, "mapping_load");
}

#[test]
fn test_markup_in_values_round_trips() {
    let ws = Workspace::new();
    let original = claim("O'Brien &lt;Jr&gt;", "M&amp;1");
    let input = ws.add_claim("a.xml", &original);

    let processed = ws
        .deidentifier(CollisionPolicy::Disambiguate)
        .process_one_document(&input)
        .unwrap();
    assert!(Document::read_from(&processed.output).is_ok());

    let mapping = ws.store().load().unwrap();
    assert_eq!(mapping.get("PATIENT_NAME"), Some("O'Brien <Jr>"));
    assert_eq!(mapping.get("MEMBER_ID"), Some("M&1"));

    let restored = ws
        .reidentifier()
        .process_one_document(&processed.output)
        .unwrap();
    assert_eq!(restored.fields, 2);
    assert!(Document::read_from(&restored.output).is_ok());
    assert!(read(&restored.output).contains(">O'Brien &lt;Jr&gt;<"));
}
