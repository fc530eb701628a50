//! Grammar-check collaborator
//!
//! Grammar checking runs on raw text and stays local. A failing checker
//! degrades to zero issues; it never fails a record.

use crate::domain::GrammarIssue;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

/// Grammar/spell-check backend
pub trait GrammarChecker: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Issues found in `text`, with byte offsets into it
    fn check(&self, text: &str) -> Result<Vec<GrammarIssue>>;
}

/// Checker that reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGrammarChecker;

impl GrammarChecker for NoopGrammarChecker {
    fn name(&self) -> &str {
        "noop"
    }

    fn check(&self, _text: &str) -> Result<Vec<GrammarIssue>> {
        Ok(Vec::new())
    }
}

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z']+").expect("word pattern is a valid regex"));

static SENTENCE_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\A\s*|[.!?]\s+)([a-z])").expect("sentence-start pattern is a valid regex")
});

pub const RULE_DOUBLED_WORD: &str = "DOUBLED_WORD";
pub const RULE_TERMINAL_PUNCTUATION: &str = "MISSING_TERMINAL_PUNCTUATION";
pub const RULE_SENTENCE_CASE: &str = "LOWERCASE_SENTENCE_START";

/// Small local rule set
///
/// Flags doubled words, a missing final punctuation mark and sentences that
/// start in lowercase.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleGrammarChecker;

impl RuleGrammarChecker {
    pub fn new() -> Self {
        Self
    }

    fn doubled_words(text: &str, issues: &mut Vec<GrammarIssue>) {
        let mut previous: Option<regex::Match<'_>> = None;
        for word in WORD.find_iter(text) {
            if let Some(prev) = previous {
                let between = &text[prev.end()..word.start()];
                if between.chars().all(char::is_whitespace)
                    && prev.as_str().eq_ignore_ascii_case(word.as_str())
                {
                    issues.push(GrammarIssue {
                        rule_id: RULE_DOUBLED_WORD.to_string(),
                        message: "Repeated word".to_string(),
                        offset: prev.start(),
                        length: word.end() - prev.start(),
                        suggestions: vec![prev.as_str().to_string()],
                        confidence: 0.9,
                    });
                }
            }
            previous = Some(word);
        }
    }

    fn terminal_punctuation(text: &str, issues: &mut Vec<GrammarIssue>) {
        let trimmed = text.trim_end();
        let Some(last) = trimmed.chars().last() else {
            return;
        };
        if !matches!(last, '.' | '!' | '?' | '"' | '\'' | ')' | '\u{201D}') {
            issues.push(GrammarIssue {
                rule_id: RULE_TERMINAL_PUNCTUATION.to_string(),
                message: "Comment does not end with punctuation".to_string(),
                offset: trimmed.len(),
                length: 0,
                suggestions: vec![".".to_string()],
                confidence: 0.7,
            });
        }
    }

    fn sentence_case(text: &str, issues: &mut Vec<GrammarIssue>) {
        for caps in SENTENCE_START.captures_iter(text) {
            let Some(letter) = caps.get(1) else {
                continue;
            };
            issues.push(GrammarIssue {
                rule_id: RULE_SENTENCE_CASE.to_string(),
                message: "Sentence starts with a lowercase letter".to_string(),
                offset: letter.start(),
                length: letter.len(),
                suggestions: vec![letter.as_str().to_uppercase()],
                confidence: 0.6,
            });
        }
    }
}

impl GrammarChecker for RuleGrammarChecker {
    fn name(&self) -> &str {
        "rules"
    }

    fn check(&self, text: &str) -> Result<Vec<GrammarIssue>> {
        let mut issues = Vec::new();
        Self::doubled_words(text, &mut issues);
        Self::terminal_punctuation(text, &mut issues);
        Self::sentence_case(text, &mut issues);
        issues.sort_by_key(|i| i.offset);
        Ok(issues)
    }
}
