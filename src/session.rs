use tracing::{info, instrument};

use crate::authority::{DecimalsAuthority, WhitelistAuthority};
use crate::intent::{
    DustGenerator, Encoding, IntentError, NormalizedIntent, Normalizer, OrderIntent,
};
use crate::submit::{SubmissionReceipt, SubmissionTransport, SubmitError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Intent(#[from] IntentError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// A curator's working scope: one authority, one dust stream.
///
/// Successive fuzzed intents in the same session draw successive dust values,
/// so a session replays identically for the same seed and inputs.
#[derive(Debug)]
pub struct CuratorSession<A> {
    normalizer: Normalizer<A>,
    dust: DustGenerator,
    fuzz: bool,
}

impl<A> CuratorSession<A>
where
    A: WhitelistAuthority + DecimalsAuthority,
{
    pub fn new(authority: A, dust_seed: u64, fuzz: bool) -> Self {
        Self {
            normalizer: Normalizer::new(authority),
            dust: DustGenerator::seeded(dust_seed),
            fuzz,
        }
    }

    pub fn normalizer(&self) -> &Normalizer<A> {
        &self.normalizer
    }

    pub fn fuzz(&self) -> bool {
        self.fuzz
    }

    pub fn prepare(&mut self, intent: &OrderIntent) -> SessionResult<NormalizedIntent> {
        let dust = if self.fuzz { Some(&mut self.dust) } else { None };
        Ok(self.normalizer.normalize(intent, dust)?)
    }

    /// Normalize, then hand the result to `transport`.
    #[instrument(skip_all, fields(%encoding, fuzz = self.fuzz))]
    pub async fn submit<T>(
        &mut self,
        intent: &OrderIntent,
        encoding: Encoding,
        transport: &T,
    ) -> SessionResult<SubmissionReceipt>
    where
        T: SubmissionTransport + ?Sized,
    {
        let normalized = self.prepare(intent)?;
        let receipt = transport.submit(&normalized, encoding).await?;
        info!(sequence = receipt.sequence, total = %receipt.total, "Submitted order intent");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::ConfigAuthority;
    use crate::submit::DryRunTransport;

    fn authority() -> ConfigAuthority {
        ConfigAuthority::new(["0xaaa", "0xbbb", "0xccc"], 6)
    }

    fn half_and_half() -> OrderIntent {
        [("0xaaa", 0.5), ("0xbbb", 0.5)].into_iter().collect()
    }

    #[test]
    fn prepare_without_fuzz_keeps_tokens() {
        let mut session = CuratorSession::new(authority(), 42, false);
        let normalized = session.prepare(&half_and_half()).unwrap();

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized.total(), 1_000_000);
    }

    #[test]
    fn fuzzed_sessions_replay_for_the_same_seed() {
        let mut a = CuratorSession::new(authority(), 7, true);
        let mut b = CuratorSession::new(authority(), 7, true);

        for _ in 0..3 {
            let x = a.prepare(&half_and_half()).unwrap();
            let y = b.prepare(&half_and_half()).unwrap();
            assert_eq!(x, y);
            assert_eq!(x.len(), 3);
            assert_eq!(x.total(), 1_000_000);
        }
    }

    #[tokio::test]
    async fn submit_goes_through_transport() {
        let mut session = CuratorSession::new(authority(), 42, false);
        let transport = DryRunTransport::default();

        let receipt = session
            .submit(&half_and_half(), Encoding::Plaintext, &transport)
            .await
            .unwrap();
        assert_eq!(receipt.items, 2);
        assert_eq!(receipt.total, 1_000_000);
    }

    #[tokio::test]
    async fn invalid_intent_never_reaches_transport() {
        let mut session = CuratorSession::new(authority(), 42, false);
        let transport = DryRunTransport::default();
        let intent: OrderIntent = [("0xdead", 1.0)].into_iter().collect();

        let err = session.submit(&intent, Encoding::Plaintext, &transport).await.unwrap_err();
        assert!(matches!(err, SessionError::Intent(IntentError::InvalidToken(_))));

        // sequence was never consumed
        let receipt = session
            .submit(&half_and_half(), Encoding::Plaintext, &transport)
            .await
            .unwrap();
        assert_eq!(receipt.sequence, 1);
    }

    #[tokio::test]
    async fn encrypted_submission_is_refused() {
        let mut session = CuratorSession::new(authority(), 42, false);
        let err = session
            .submit(&half_and_half(), Encoding::Encrypted, &DryRunTransport::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Submit(SubmitError::UnsupportedEncoding(_))));
    }
}
