use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::SubmissionTransport;
use crate::intent::{Encoding, NormalizedIntent};
use crate::submit::types::{SubmissionReceipt, SubmissionRecord, SubmitError, SubmitResult};

/// Encode a record as a single journal line (no trailing newline).
pub fn record_to_json(record: &SubmissionRecord) -> SubmitResult<String> {
    Ok(serde_json::to_string(record)?)
}

/// Parse one journal line; `line` is 1-based and only used for the error.
pub fn record_from_json(s: &str, line: usize) -> SubmitResult<SubmissionRecord> {
    serde_json::from_str(s).map_err(|e| SubmitError::Corrupt { line, reason: e.to_string() })
}

/// All records in a journal file, oldest first. A missing file is an empty journal.
pub async fn read_journal(path: &Path) -> SubmitResult<Vec<SubmissionRecord>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    raw.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| record_from_json(l, i + 1))
        .collect()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn check_submittable(intent: &NormalizedIntent, encoding: Encoding) -> SubmitResult<()> {
    // Encrypted amounts need the FHE scheme, which no transport here carries
    if encoding == Encoding::Encrypted {
        return Err(SubmitError::UnsupportedEncoding(encoding));
    }
    if intent.is_empty() {
        return Err(SubmitError::EmptyIntent);
    }
    Ok(())
}

/// Append-only JSON-lines journal of submitted intents.
#[derive(Debug)]
pub struct JournalTransport {
    path: PathBuf,
    // Guards both the sequence counter and the file append
    next_sequence: Mutex<u64>,
}

impl JournalTransport {
    /// Open (or lazily create) the journal, continuing its sequence numbers.
    pub async fn open(path: impl Into<PathBuf>) -> SubmitResult<Self> {
        let path = path.into();
        let existing = read_journal(&path).await?;
        let next = existing.last().map(|r| r.sequence + 1).unwrap_or(1);
        debug!(path = %path.display(), records = existing.len(), next, "Opened submission journal");
        Ok(Self { path, next_sequence: Mutex::new(next) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SubmissionTransport for JournalTransport {
    #[instrument(skip(self, intent), fields(path = %self.path.display()))]
    async fn submit(&self, intent: &NormalizedIntent, encoding: Encoding) -> SubmitResult<SubmissionReceipt> {
        check_submittable(intent, encoding)?;

        let mut next = self.next_sequence.lock().await;
        let record = SubmissionRecord::new(*next, now_ms(), encoding, intent);
        let mut line = record_to_json(&record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        *next += 1;

        metrics::counter!("orion_submissions_total").increment(1);
        info!(sequence = record.sequence, items = record.items.len(), %encoding, "Journaled order intent");
        Ok(SubmissionReceipt::from(&record))
    }
}

/// Validates and logs submissions without recording them anywhere.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    next_sequence: AtomicU64,
}

#[async_trait]
impl SubmissionTransport for DryRunTransport {
    async fn submit(&self, intent: &NormalizedIntent, encoding: Encoding) -> SubmitResult<SubmissionReceipt> {
        check_submittable(intent, encoding)?;
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let record = SubmissionRecord::new(sequence, now_ms(), encoding, intent);
        info!(sequence, items = record.items.len(), %encoding, "Dry run: intent not submitted");
        Ok(SubmissionReceipt::from(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        std::env::temp_dir()
            .join(format!("orion-journal-{}-{}-{}", name, std::process::id(), nanos))
            .join("journal.jsonl")
    }

    fn sample() -> NormalizedIntent {
        [("0xaaa", 40u128), ("0xbbb", 60u128)].into_iter().collect()
    }

    #[tokio::test]
    async fn journal_appends_and_reads_back() {
        let path = scratch_path("roundtrip");
        let transport = JournalTransport::open(&path).await.unwrap();

        let first = transport.submit(&sample(), Encoding::Plaintext).await.unwrap();
        let second = transport.submit(&sample(), Encoding::Plaintext).await.unwrap();
        assert_eq!((first.sequence, second.sequence), (1, 2));
        assert_eq!(first.total, 100);

        let records = read_journal(&path).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].intent(), sample());

        // Reopening continues the sequence
        let reopened = JournalTransport::open(&path).await.unwrap();
        let third = reopened.submit(&sample(), Encoding::Plaintext).await.unwrap();
        assert_eq!(third.sequence, 3);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn encrypted_encoding_is_rejected() {
        let path = scratch_path("encrypted");
        let transport = JournalTransport::open(&path).await.unwrap();
        let err = transport.submit(&sample(), Encoding::Encrypted).await.unwrap_err();

        assert!(matches!(err, SubmitError::UnsupportedEncoding(Encoding::Encrypted)));
        assert!(read_journal(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_journal_reads_empty() {
        let records = read_journal(&scratch_path("missing")).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn corrupt_line_is_reported_with_line_number() {
        let path = scratch_path("corrupt");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        let good = record_to_json(&SubmissionRecord::new(1, 0, Encoding::Plaintext, &sample())).unwrap();
        tokio::fs::write(&path, format!("{}\nnot json\n", good)).await.unwrap();

        let err = read_journal(&path).await.unwrap_err();
        assert!(matches!(err, SubmitError::Corrupt { line: 2, .. }));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn dry_run_counts_without_writing() {
        let transport = DryRunTransport::default();
        let receipt = transport.submit(&sample(), Encoding::Plaintext).await.unwrap();
        assert_eq!(receipt.sequence, 1);
        assert_eq!(receipt.items, 2);

        let empty = NormalizedIntent::default();
        let err = transport.submit(&empty, Encoding::Plaintext).await.unwrap_err();
        assert!(matches!(err, SubmitError::EmptyIntent));
    }
}
