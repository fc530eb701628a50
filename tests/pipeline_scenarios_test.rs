//! Integration tests for end-to-end pipeline runs
//!
//! Each test drives records through the orchestrator and checks the
//! terminal state, the gate's audit trail and the batch counts.

use async_trait::async_trait;
use ferpa_feedback::adapters::{HeuristicAnalyzer, SemanticAnalyzer};
use ferpa_feedback::anonymization::audit::{AuditOutcome, MemoryAuditSink};
use ferpa_feedback::anonymization::detector::RegexDetector;
use ferpa_feedback::anonymization::{
    AnonymizationGate, Anonymizer, DetectionMethod, EntityDetector, EntitySpan, EntityType,
    SafeText,
};
use ferpa_feedback::config::{FerpaFeedbackConfig, RetryConfig};
use ferpa_feedback::core::pipeline::{Orchestrator, OrchestratorBuilder, REASON_GATE_BLOCKED};
use ferpa_feedback::domain::{
    ClassRoster, ConfidenceTier, Record, RecordId, RecordState, RosterEntry, RouteDecision,
    SemanticAnalysis, StudentId,
};
use ferpa_feedback::names::{CapitalizedNameExtractor, NameMatcher, NicknameTable};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

/// Analyzer that counts calls and returns a neutral analysis
struct CountingAnalyzer {
    inner: HeuristicAnalyzer,
    calls: AtomicU32,
}

impl CountingAnalyzer {
    fn new() -> Self {
        Self {
            inner: HeuristicAnalyzer::new(),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SemanticAnalyzer for CountingAnalyzer {
    fn name(&self) -> &str {
        "counting"
    }

    async fn analyze(&self, text: &SafeText, grade: &str) -> anyhow::Result<SemanticAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.analyze(text, grade).await
    }
}

/// Verifier that flags the first word of every text
struct AlwaysFlags;

impl EntityDetector for AlwaysFlags {
    fn name(&self) -> &str {
        "always_flags"
    }

    fn detect(&self, text: &str) -> anyhow::Result<Vec<EntitySpan>> {
        let end = text.find(' ').unwrap_or(text.len());
        Ok(vec![EntitySpan::new(
            0,
            end,
            EntityType::Person,
            0.9,
            DetectionMethod::Ner,
        )])
    }
}

/// Regex detection that errors on one marker word
struct FlakyDetector {
    inner: RegexDetector,
}

impl EntityDetector for FlakyDetector {
    fn name(&self) -> &str {
        "flaky"
    }

    fn detect(&self, text: &str) -> anyhow::Result<Vec<EntitySpan>> {
        if text.contains("unparseable") {
            anyhow::bail!("backend rejected input");
        }
        self.inner.detect(text)
    }
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 1,
        initial_delay_ms: 1,
        max_delay_ms: 2,
        backoff_multiplier: 2.0,
        timeout_ms: 200,
    }
}

fn config_in(dir: &TempDir) -> FerpaFeedbackConfig {
    let mut config = FerpaFeedbackConfig::default();
    config.ferpa.audit_log_path = dir.path().join("audit").join("gate.jsonl");
    config.logging.local_enabled = false;
    config.retry = fast_retry();
    config
}

fn roster() -> ClassRoster {
    ClassRoster::new(
        "period-3",
        vec![
            RosterEntry::new(StudentId::new("S100").unwrap(), "Jonathan", "Smith")
                .with_preferred_name("John"),
            RosterEntry::new(StudentId::new("S200").unwrap(), "Mary", "O'Brien"),
        ],
    )
}

fn regex_builder(
    detector: Arc<dyn EntityDetector>,
    audit: Arc<MemoryAuditSink>,
) -> (OrchestratorBuilder, Arc<Anonymizer>) {
    let anonymizer = Arc::new(Anonymizer::new(detector));
    let gate = AnonymizationGate::new(Arc::clone(&anonymizer), audit);
    let builder = Orchestrator::builder(
        Arc::new(CapitalizedNameExtractor::new()),
        NameMatcher::new(Arc::new(NicknameTable::default_table().unwrap())),
        Arc::clone(&anonymizer),
        gate,
    )
    .retry(fast_retry());
    (builder, anonymizer)
}

fn record(id: &str, expected: &str, text: &str) -> Record {
    Record::builder()
        .id(RecordId::new(id).unwrap())
        .expected_name(expected)
        .text(text)
        .grade("B")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_roster_name_is_replaced_and_authorized() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let roster = roster();
    let orchestrator = Orchestrator::from_config(&config, Some(&roster)).unwrap();

    let student = roster.find_by_id(&StudentId::new("S100").unwrap()).unwrap();
    let input = Record::builder()
        .id(RecordId::new("rec-a").unwrap())
        .student(student)
        .text("John Smith did well this term.")
        .grade("A")
        .build()
        .unwrap();

    let result = orchestrator.process_record(input).await;

    assert!(matches!(result.state(), RecordState::Routed(_)));
    assert_eq!(
        result.anonymized_text(),
        Some("[STUDENT_NAME_1] did well this term.")
    );
    let name = result.name_match().unwrap();
    assert_eq!(name.tier, ConfidenceTier::High);
    assert!(name.is_match);
    assert!(!result.external_analysis_skipped());
    assert!(result
        .history()
        .iter()
        .any(|t| t.state == RecordState::GateAuthorized));

    let audit = std::fs::read_to_string(&config.ferpa.audit_log_path).unwrap();
    assert_eq!(audit.lines().count(), 1);
    assert!(audit.contains("\"authorized\""));
    assert!(!audit.contains("John"));
}

#[tokio::test]
async fn test_bare_student_number_is_replaced() {
    let audit = Arc::new(MemoryAuditSink::new());
    let (builder, _) = regex_builder(Arc::new(RegexDetector::new().unwrap()), audit.clone());
    let orchestrator = builder.build().unwrap();

    let result = orchestrator
        .process_record(record(
            "rec-b",
            "Ana Lopez",
            "Ana Lopez should resend the file for 48213377 today.",
        ))
        .await;

    let anonymized = result.anonymized_text().unwrap();
    assert!(anonymized.contains("[STUDENT_ID_1]"));
    assert!(!anonymized.contains("48213377"));
    assert!(!result.external_analysis_skipped());

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, AuditOutcome::Authorized);
    assert_eq!(entries[0].placeholder_count, 1);
}

#[tokio::test]
async fn test_gate_block_skips_external_call() {
    let audit = Arc::new(MemoryAuditSink::new());
    let anonymizer = Arc::new(Anonymizer::new(Arc::new(RegexDetector::new().unwrap())));
    let gate = AnonymizationGate::new(Arc::clone(&anonymizer), audit.clone())
        .with_verifier(Arc::new(AlwaysFlags));
    let analyzer = Arc::new(CountingAnalyzer::new());
    let orchestrator = Orchestrator::builder(
        Arc::new(CapitalizedNameExtractor::new()),
        NameMatcher::new(Arc::new(NicknameTable::empty())),
        anonymizer,
        gate,
    )
    .analyzer(analyzer.clone())
    .build()
    .unwrap();

    let run = orchestrator
        .run_batch(vec![record("rec-c", "Maria Garcia", "Maria Garcia did well.")])
        .await;
    let result = &run.records[0];

    assert_eq!(result.route(), Some(RouteDecision::NeedsReview));
    assert!(result.external_analysis_skipped());
    assert!(result.semantic().is_none());
    assert!(result
        .review_reasons()
        .iter()
        .any(|r| r == REASON_GATE_BLOCKED));
    assert_eq!(analyzer.calls(), 0);

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, AuditOutcome::Blocked);
    assert_eq!(entries[0].residual_types, vec![EntityType::Person]);

    assert_eq!(run.outcome.blocked_by_gate, 1);
    assert_eq!(run.outcome.needs_review, 1);
    assert!(!run.outcome.is_successful());
}

#[tokio::test]
async fn test_apostrophe_variant_still_matches() {
    let audit = Arc::new(MemoryAuditSink::new());
    let (builder, _) = regex_builder(Arc::new(RegexDetector::new().unwrap()), audit);
    let orchestrator = builder.build().unwrap();

    let result = orchestrator
        .process_record(record(
            "rec-d",
            "Mary O'Brien",
            "Mary Obrien asked thoughtful questions in class.",
        ))
        .await;

    let name = result.name_match().unwrap();
    assert!(name.tier >= ConfidenceTier::Medium);
    assert!(name.is_match);
}

#[tokio::test]
async fn test_one_failing_record_does_not_stop_the_batch() {
    let audit = Arc::new(MemoryAuditSink::new());
    let detector = Arc::new(FlakyDetector {
        inner: RegexDetector::new().unwrap(),
    });
    let (builder, _) = regex_builder(detector, audit);
    let orchestrator = builder.concurrency(3).build().unwrap();

    let records = vec![
        record("r0", "Ana Lopez", "Ana Lopez improved her reading."),
        record("r1", "Ana Lopez", "Ana Lopez wrote something unparseable."),
        record("r2", "Ana Lopez", "Ana Lopez led her group well."),
        record("r3", "Ana Lopez", "Ana Lopez asked for extra practice."),
    ];

    let run = orchestrator.run_batch(records).await;

    assert_eq!(run.outcome.processed, 4);
    assert_eq!(run.outcome.failed, 1);
    assert_eq!(run.outcome.succeeded, 3);
    assert_eq!(run.outcome.errors.len(), 1);
    assert_eq!(run.outcome.errors[0].record_id, "r1");
    assert_eq!(run.outcome.errors[0].kind, "detection_backend_failure");
    assert!(!run.outcome.errors[0].message.contains("unparseable"));

    for (i, r) in run.records.iter().enumerate() {
        if i == 1 {
            assert_eq!(r.state(), RecordState::Failed);
        } else {
            assert!(matches!(r.state(), RecordState::Routed(_)));
        }
    }
}

#[tokio::test]
async fn test_cancelled_before_start_leaves_batch_untouched() {
    let audit = Arc::new(MemoryAuditSink::new());
    let (builder, _) = regex_builder(Arc::new(RegexDetector::new().unwrap()), audit.clone());
    let (tx, rx) = watch::channel(false);
    let orchestrator = builder.cancellation(rx).concurrency(2).build().unwrap();
    tx.send(true).unwrap();

    let records: Vec<Record> = (0..5)
        .map(|i| record(&format!("r{i}"), "Ana Lopez", "Ana Lopez did well."))
        .collect();
    let run = orchestrator.run_batch(records).await;

    assert!(run.outcome.was_cancelled());
    assert_eq!(run.outcome.cancelled, 5);
    assert_eq!(run.outcome.processed, 0);
    assert!(run.records.iter().all(|r| r.state() == RecordState::Ingested));
    assert!(audit.is_empty());
}

#[tokio::test]
async fn test_batch_counts_add_up() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let orchestrator = Orchestrator::from_config(&config, Some(&roster())).unwrap();

    let records = vec![
        record("r0", "Jonathan Smith", "John Smith did well this term."),
        record("r1", "Mary O'Brien", "Great effort on the lab report."),
        record("r2", "Mary O'Brien", "Mary O'Brien: email mary@example.com for notes."),
    ];
    let outcome = orchestrator.process_batch(records).await;

    assert_eq!(outcome.processed, 3);
    assert_eq!(
        outcome.auto_accepted + outcome.needs_review + outcome.auto_rejected,
        outcome.succeeded
    );
    assert_eq!(outcome.succeeded + outcome.failed, outcome.processed);
    assert_eq!(outcome.total(), 3);
}
