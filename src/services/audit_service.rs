use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::question::OptionKey;

/// One auto-corrected answer. Kept for audit, never shown to students.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRecord {
    pub generation_id: Uuid,
    pub question_id: u32,
    pub question: String,
    pub original: String,
    pub corrected: OptionKey,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

/// Per-request side channel of answer corrections.
#[derive(Debug, Clone)]
pub struct CorrectionLog {
    generation_id: Uuid,
    records: Vec<CorrectionRecord>,
}

impl CorrectionLog {
    pub fn new(generation_id: Uuid) -> Self {
        Self {
            generation_id,
            records: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        question_id: u32,
        question: &str,
        original: &str,
        corrected: OptionKey,
        reason: &str,
    ) {
        let entry = CorrectionRecord {
            generation_id: self.generation_id,
            question_id,
            question: question.to_string(),
            original: original.to_string(),
            corrected,
            reason: reason.to_string(),
            recorded_at: Utc::now(),
        };
        tracing::info!(
            target: "quiz_audit",
            generation_id = %entry.generation_id,
            question_id = entry.question_id,
            original = %entry.original,
            corrected = %entry.corrected,
            reason = %entry.reason,
            "Answer corrected"
        );
        self.records.push(entry);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<CorrectionRecord> {
        self.records
    }
}
