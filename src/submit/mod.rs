pub mod types;
pub use types::*;
pub mod journal;

pub use journal::{read_journal, DryRunTransport, JournalTransport};

use async_trait::async_trait;

use crate::intent::{Encoding, NormalizedIntent};

/// Delivers a normalized intent to wherever the vault picks it up.
///
/// Transports own retries, timeouts and cancellation; normalization never
/// waits on them.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit(&self, intent: &NormalizedIntent, encoding: Encoding) -> SubmitResult<SubmissionReceipt>;
}
