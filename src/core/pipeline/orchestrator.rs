//! Pipeline orchestrator
//!
//! Drives each record through the stages in a fixed order:
//!
//! ```text
//! INGESTED -> GRAMMAR_CHECKED -> NAME_VERIFIED -> ANONYMIZED
//!          -> GATE_AUTHORIZED -> EXTERNALLY_ANALYZED -> ROUTED
//! ```
//!
//! Grammar and name checks see raw text and stay local. Only gate-authorized
//! text reaches the semantic analyzer. A gate refusal skips external
//! analysis and the record is routed to review. Any other stage failure
//! moves that record to `FAILED`; the rest of the batch continues.

use super::outcome::BatchOutcome;
use super::routing::{route, ConfidenceThresholds};
use crate::adapters::grammar::{GrammarChecker, RuleGrammarChecker};
use crate::adapters::semantic::{HeuristicAnalyzer, SemanticAnalyzer};
use crate::anonymization::{AnonymizationGate, Anonymizer};
use crate::config::{FerpaFeedbackConfig, RetryConfig};
use crate::core::retry::retry_with_backoff;
use crate::domain::{ClassRoster, FerpaError, Record, RecordError, RecordState, Result};
use crate::names::{NameExtractor, NameMatcher};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Semaphore};

const STAGE_GRAMMAR: &str = "grammar_check";
const STAGE_NAME: &str = "name_verification";
const STAGE_ANONYMIZE: &str = "anonymization";
const STAGE_GATE: &str = "gate";
const STAGE_SEMANTIC: &str = "semantic_analysis";
const STAGE_ROUTE: &str = "routing";

/// Records and counts from one batch run
///
/// `records` keeps input order. Records the run never started because of
/// cancellation are returned unchanged in `INGESTED`.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub records: Vec<Record>,
    pub outcome: BatchOutcome,
}

struct Inner {
    grammar: Option<Arc<dyn GrammarChecker>>,
    extractor: Arc<dyn NameExtractor>,
    matcher: NameMatcher,
    anonymizer: Arc<Anonymizer>,
    gate: AnonymizationGate,
    analyzer: Option<Arc<dyn SemanticAnalyzer>>,
    thresholds: ConfidenceThresholds,
    retry: RetryConfig,
    concurrency: usize,
    cancel: Option<watch::Receiver<bool>>,
}

/// Per-record stage driver with bounded batch concurrency
///
/// Cloning is cheap; clones share the same backends.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("extractor", &self.inner.extractor.name())
            .field("grammar", &self.inner.grammar.as_ref().map(|g| g.name().to_string()))
            .field("analyzer", &self.inner.analyzer.as_ref().map(|a| a.name().to_string()))
            .field("concurrency", &self.inner.concurrency)
            .finish()
    }
}

impl Orchestrator {
    pub fn builder(
        extractor: Arc<dyn NameExtractor>,
        matcher: NameMatcher,
        anonymizer: Arc<Anonymizer>,
        gate: AnonymizationGate,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            grammar: None,
            extractor,
            matcher,
            anonymizer,
            gate,
            analyzer: None,
            thresholds: ConfidenceThresholds::default(),
            retry: RetryConfig::default(),
            concurrency: 5,
            cancel: None,
        }
    }

    /// Wire every backend from a validated configuration
    ///
    /// The roster, when given, feeds both roster-based detection and
    /// roster-based name extraction.
    ///
    /// # Errors
    ///
    /// [`FerpaError::Configuration`] when a pattern library, nickname table
    /// or audit log cannot be opened, or a setting is out of range.
    pub fn from_config(config: &FerpaFeedbackConfig, roster: Option<&ClassRoster>) -> Result<Self> {
        OrchestratorBuilder::from_config(config, roster)?.build()
    }

    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.inner.thresholds
    }

    pub fn concurrency(&self) -> usize {
        self.inner.concurrency
    }

    fn is_cancelled(&self) -> bool {
        self.inner
            .cancel
            .as_ref()
            .is_some_and(|rx| *rx.borrow())
    }

    /// Run one record through every stage
    ///
    /// Always returns the record in a terminal state: `ROUTED` or `FAILED`.
    /// A record that is already terminal is returned unchanged.
    pub async fn process_record(&self, record: Record) -> Record {
        if record.is_terminal() {
            return record;
        }
        if record.state() != RecordState::Ingested {
            let error = RecordError::new(
                record.id().as_str(),
                format!("cannot start processing from state {}", record.state()),
            )
            .with_kind("validation");
            return record.failed(error);
        }

        let started = Instant::now();
        let record = self.check_grammar(record);
        let record = self.verify_name(record);

        let record = match self.anonymize(record) {
            Ok(record) if record.is_terminal() => return record,
            Ok(record) => record,
            Err(record) => return record,
        };

        let record = match self.authorize_and_analyze(record).await {
            Ok(record) => record,
            Err(record) => return record,
        };

        let record = self.route(record);
        tracing::debug!(
            record_id = %record.id(),
            state = %record.state(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Record processed"
        );
        record
    }

    fn check_grammar(&self, record: Record) -> Record {
        let Some(ref checker) = self.inner.grammar else {
            return record.with_grammar_issues(Vec::new());
        };

        let started = Instant::now();
        crate::log_stage_start!(record.id(), STAGE_GRAMMAR);
        let issues = match checker.check(record.text()) {
            Ok(issues) => issues,
            Err(e) => {
                tracing::warn!(
                    record_id = %record.id(),
                    backend = checker.name(),
                    error = %e,
                    "Grammar check failed; continuing without issues"
                );
                Vec::new()
            }
        };
        crate::log_stage_complete!(record.id(), STAGE_GRAMMAR, started.elapsed());
        record.with_grammar_issues(issues)
    }

    fn verify_name(&self, record: Record) -> Record {
        let started = Instant::now();
        crate::log_stage_start!(record.id(), STAGE_NAME);
        let extractor = &self.inner.extractor;

        let extracted = match extractor.extract_names(record.text()) {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(
                    record_id = %record.id(),
                    extractor = extractor.name(),
                    error = %e,
                    "Name extraction failed; treating as no name found"
                );
                Vec::new()
            }
        };

        let result = self.inner.matcher.match_best(
            &extracted,
            record.expected_name(),
            record.known_variants(),
            extractor.name(),
        );
        tracing::debug!(
            record_id = %record.id(),
            candidates = extracted.len(),
            tier = %result.tier,
            is_match = result.is_match,
            "Name verified"
        );
        crate::log_stage_complete!(record.id(), STAGE_NAME, started.elapsed());
        record.with_name_match(result)
    }

    fn anonymize(&self, record: Record) -> std::result::Result<Record, Record> {
        let started = Instant::now();
        crate::log_stage_start!(record.id(), STAGE_ANONYMIZE);

        match self.inner.anonymizer.anonymize(&record) {
            Ok(anonymized) => {
                tracing::debug!(
                    record_id = %record.id(),
                    entities = anonymized.spans.len(),
                    placeholders = anonymized.mapping.len(),
                    "Record anonymized"
                );
                crate::log_stage_complete!(record.id(), STAGE_ANONYMIZE, started.elapsed());
                Ok(record.with_anonymization(anonymized.text, anonymized.mapping))
            }
            Err(e) => {
                let err = FerpaError::DetectionBackend {
                    record_id: record.id().to_string(),
                    message: format!("{e:#}"),
                };
                tracing::error!(record_id = %record.id(), error = %e, "Anonymization failed");
                let error = RecordError::from_error(record.id().as_str(), &err)
                    .with_stage(STAGE_ANONYMIZE);
                Err(record.failed(error))
            }
        }
    }

    async fn authorize_and_analyze(&self, record: Record) -> std::result::Result<Record, Record> {
        crate::log_stage_start!(record.id(), STAGE_GATE);
        let safe = match self.inner.gate.authorize_for_external_call(&record) {
            Ok(safe) => safe,
            Err(FerpaError::GateViolation { .. }) => return Ok(record.gate_blocked()),
            Err(e) => {
                tracing::error!(record_id = %record.id(), error = %e, "Gate could not decide");
                let error = RecordError::from_error(record.id().as_str(), &e).with_stage(STAGE_GATE);
                return Err(record.failed(error));
            }
        };
        let record = record.gate_authorized();

        let Some(ref analyzer) = self.inner.analyzer else {
            return Ok(record);
        };

        let started = Instant::now();
        crate::log_stage_start!(record.id(), STAGE_SEMANTIC);
        let analyzer: &dyn SemanticAnalyzer = analyzer.as_ref();
        let safe_ref = &safe;
        let grade = record.grade();

        let result = retry_with_backoff(&self.inner.retry, STAGE_SEMANTIC, move || {
            analyzer.analyze(safe_ref, grade)
        })
        .await;

        match result {
            Ok(analysis) => {
                crate::log_stage_complete!(record.id(), STAGE_SEMANTIC, started.elapsed());
                Ok(record.with_semantic(analysis))
            }
            Err(e) => {
                let err = FerpaError::ExternalCall {
                    record_id: record.id().to_string(),
                    message: format!("{} failed: {e:#}", analyzer.name()),
                };
                tracing::error!(record_id = %record.id(), error = %e, "Semantic analysis failed");
                let error = RecordError::from_error(record.id().as_str(), &err)
                    .with_stage(STAGE_SEMANTIC)
                    .retryable();
                Err(record.failed(error))
            }
        }
    }

    fn route(&self, record: Record) -> Record {
        let routing = route(&record, &self.inner.thresholds);
        tracing::info!(
            record_id = %record.id(),
            stage = STAGE_ROUTE,
            decision = routing.decision.label(),
            reasons = routing.reasons.len(),
            min_score = routing.min_score,
            "Record routed"
        );
        record.routed(routing.decision, routing.reasons)
    }

    /// Process a batch with bounded concurrency
    ///
    /// At most `concurrency` records are in flight. A record's failure never
    /// affects another record. When the cancellation signal fires, records
    /// already started run to completion and the rest are left untouched.
    pub async fn run_batch(&self, records: Vec<Record>) -> BatchRun {
        let started = Instant::now();
        let total = records.len();
        tracing::info!(
            records = total,
            concurrency = self.inner.concurrency,
            "Starting batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.inner.concurrency));
        let mut slots: Vec<Slot> = Vec::with_capacity(total);

        for record in records {
            if self.is_cancelled() {
                slots.push(Slot::Skipped(record));
                continue;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    slots.push(Slot::Skipped(record));
                    continue;
                }
            };
            if self.is_cancelled() {
                drop(permit);
                slots.push(Slot::Skipped(record));
                continue;
            }

            let fallback = record.clone();
            let worker = self.clone();
            let handle = tokio::spawn(async move {
                let processed = worker.process_record(record).await;
                drop(permit);
                processed
            });
            slots.push(Slot::Running(fallback, handle));
        }

        let mut outcome = BatchOutcome::new();
        let mut results = Vec::with_capacity(total);
        for slot in slots {
            match slot {
                Slot::Skipped(record) => {
                    outcome.record_cancelled(record.id());
                    results.push(record);
                }
                Slot::Running(fallback, handle) => {
                    let record = match handle.await {
                        Ok(record) => record,
                        Err(e) => {
                            tracing::error!(
                                record_id = %fallback.id(),
                                error = %e,
                                "Record worker terminated abnormally"
                            );
                            let error = RecordError::new(
                                fallback.id().as_str(),
                                "record worker terminated abnormally",
                            )
                            .with_kind("worker");
                            fallback.failed(error)
                        }
                    };
                    outcome.record(&record);
                    results.push(record);
                }
            }
        }

        if outcome.was_cancelled() {
            tracing::warn!(
                cancelled = outcome.cancelled,
                processed = outcome.processed,
                "Batch interrupted; remaining records were not started"
            );
        }

        let outcome = outcome.with_duration(started.elapsed());
        outcome.log_summary();
        BatchRun {
            records: results,
            outcome,
        }
    }

    /// Process a batch and return only the outcome
    pub async fn process_batch(&self, records: Vec<Record>) -> BatchOutcome {
        self.run_batch(records).await.outcome
    }
}

enum Slot {
    Skipped(Record),
    Running(Record, tokio::task::JoinHandle<Record>),
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    grammar: Option<Arc<dyn GrammarChecker>>,
    extractor: Arc<dyn NameExtractor>,
    matcher: NameMatcher,
    anonymizer: Arc<Anonymizer>,
    gate: AnonymizationGate,
    analyzer: Option<Arc<dyn SemanticAnalyzer>>,
    thresholds: ConfidenceThresholds,
    retry: RetryConfig,
    concurrency: usize,
    cancel: Option<watch::Receiver<bool>>,
}

impl OrchestratorBuilder {
    /// Builder with every backend wired from configuration
    pub fn from_config(config: &FerpaFeedbackConfig, roster: Option<&ClassRoster>) -> Result<Self> {
        let configuration = |e: anyhow::Error| FerpaError::Configuration(format!("{e:#}"));

        let nicknames = Arc::new(config.names.load_nicknames().map_err(configuration)?);
        let detector = config
            .detection
            .build_detector(roster, &nicknames)
            .map_err(configuration)?;
        let anonymizer = Arc::new(Anonymizer::new(Arc::new(detector)));
        let audit = config.ferpa.audit_sink().map_err(configuration)?;
        let gate = AnonymizationGate::new(Arc::clone(&anonymizer), audit);

        let extractor = config
            .names
            .build_extractor(roster, &nicknames, &config.detection.common_word_exclusions)
            .map_err(configuration)?;
        let matcher = config
            .names
            .build_matcher(Arc::clone(&nicknames), config.thresholds);

        let mut builder = Orchestrator::builder(extractor, matcher, anonymizer, gate)
            .thresholds(config.thresholds)
            .retry(config.retry.clone())
            .concurrency(config.pipeline.concurrency);
        if config.pipeline.grammar_enabled {
            builder = builder.grammar(Arc::new(RuleGrammarChecker::new()));
        }
        if config.pipeline.semantic_enabled {
            builder = builder.analyzer(Arc::new(HeuristicAnalyzer::new()));
        }

        tracing::info!(
            extractor = builder.extractor.name(),
            roster = roster.is_some(),
            concurrency = config.pipeline.concurrency,
            grammar = config.pipeline.grammar_enabled,
            semantic = config.pipeline.semantic_enabled,
            "Pipeline configured"
        );
        Ok(builder)
    }

    pub fn grammar(mut self, checker: Arc<dyn GrammarChecker>) -> Self {
        self.grammar = Some(checker);
        self
    }

    pub fn analyzer(mut self, analyzer: Arc<dyn SemanticAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Stop starting new records once the receiver reads `true`
    pub fn cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        self.thresholds
            .validate()
            .map_err(FerpaError::Configuration)?;
        if self.concurrency == 0 {
            return Err(FerpaError::Configuration(
                "pipeline.concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Orchestrator {
            inner: Arc::new(Inner {
                grammar: self.grammar,
                extractor: self.extractor,
                matcher: self.matcher,
                anonymizer: self.anonymizer,
                gate: self.gate,
                analyzer: self.analyzer,
                thresholds: self.thresholds,
                retry: self.retry,
                concurrency: self.concurrency,
                cancel: self.cancel,
            }),
        })
    }
}
