use serde::{Deserialize, Serialize};

use crate::intent::{Encoding, NormalizedIntent, TokenId};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0} encoding is not supported by this transport")]
    UnsupportedEncoding(Encoding),
    #[error("refusing to submit an empty intent")]
    EmptyIntent,
    #[error("journal I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt journal record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// One `(token, amount)` pair as it is handed to the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentItem {
    pub token: TokenId,
    pub amount: u128,
}

/// A submitted intent as written to the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub sequence: u64,
    pub submitted_at_ms: u64,
    pub encoding: Encoding,
    pub items: Vec<IntentItem>,
}

impl SubmissionRecord {
    pub fn new(sequence: u64, submitted_at_ms: u64, encoding: Encoding, intent: &NormalizedIntent) -> Self {
        let items = intent
            .iter()
            .map(|(token, amount)| IntentItem { token: token.clone(), amount })
            .collect();
        Self { sequence, submitted_at_ms, encoding, items }
    }

    pub fn intent(&self) -> NormalizedIntent {
        self.items.iter().map(|i| (i.token.clone(), i.amount)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub sequence: u64,
    pub encoding: Encoding,
    pub items: usize,
    pub total: u128,
}

impl From<&SubmissionRecord> for SubmissionReceipt {
    fn from(record: &SubmissionRecord) -> Self {
        Self {
            sequence: record.sequence,
            encoding: record.encoding,
            items: record.items.len(),
            total: record.items.iter().map(|i| i.amount).sum(),
        }
    }
}
