use tracing::{debug, info, instrument, warn};

use crate::authority::{DecimalsAuthority, WhitelistAuthority};
use crate::intent::dust::DustGenerator;
use crate::intent::rounding::round_with_fixed_sum;
use crate::intent::types::{
    IntentError, IntentResult, NormalizedIntent, OrderIntent, TokenId, MAX_DECIMALS,
    WEIGHT_SUM_TOLERANCE,
};

/// Turns curator weights into fixed-point amounts the vault accepts.
///
/// Pipeline: validate, optionally add dust for every missing whitelisted
/// token, re-normalize to unit weight, scale by `10^decimals`, then
/// largest-remainder round so the amounts sum to exactly `10^decimals`.
#[derive(Debug, Clone)]
pub struct Normalizer<A> {
    authority: A,
}

impl<A> Normalizer<A>
where
    A: WhitelistAuthority + DecimalsAuthority,
{
    pub fn new(authority: A) -> Self {
        Self { authority }
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// Check tokens, weights and weight sum, in that order.
    pub fn validate(&self, intent: &OrderIntent) -> IntentResult<()> {
        let mut rejected: Vec<TokenId> = Vec::new();
        for token in intent.tokens() {
            if !self.authority.is_whitelisted(token)? {
                rejected.push(token.clone());
            }
        }
        if !rejected.is_empty() {
            return Err(IntentError::InvalidToken(rejected));
        }

        // Written as !(w > 0) so NaN is rejected too
        if let Some((token, weight)) = intent.iter().find(|(_, w)| !(*w > 0.0)) {
            return Err(IntentError::InvalidWeight { token: token.clone(), weight });
        }

        let sum = intent.total_weight();
        if !((sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE) {
            return Err(IntentError::InvalidSum { sum, tolerance: WEIGHT_SUM_TOLERANCE });
        }

        Ok(())
    }

    #[instrument(skip_all, fields(tokens = intent.len(), fuzz = dust.is_some()))]
    pub fn normalize(
        &self,
        intent: &OrderIntent,
        dust: Option<&mut DustGenerator>,
    ) -> IntentResult<NormalizedIntent> {
        match self.run(intent, dust) {
            Ok(normalized) => {
                metrics::counter!("orion_intents_normalized_total").increment(1);
                info!(tokens = normalized.len(), total = %normalized.total(), "Normalized order intent");
                Ok(normalized)
            }
            Err(e) => {
                metrics::counter!("orion_intents_rejected_total").increment(1);
                warn!(error = %e, "Rejected order intent");
                Err(e)
            }
        }
    }

    fn run(
        &self,
        intent: &OrderIntent,
        dust: Option<&mut DustGenerator>,
    ) -> IntentResult<NormalizedIntent> {
        self.validate(intent)?;

        let decimals = self.authority.decimals()?;
        if decimals > MAX_DECIMALS {
            return Err(IntentError::UnsupportedDecimals(decimals));
        }

        let mut intent = intent.clone();
        if let Some(dust) = dust {
            self.add_dust(&mut intent, decimals, dust)?;
        }
        // Validated sums sit anywhere in 1 ± tolerance
        intent.rescale_to_unit();

        let scale = 10f64.powi(decimals as i32);
        let (tokens, scaled): (Vec<TokenId>, Vec<f64>) = intent
            .into_entries()
            .into_iter()
            .map(|(token, weight)| (token, weight * scale))
            .unzip();

        let amounts = round_with_fixed_sum(&scaled, Some(10u128.pow(decimals)))?;
        Ok(NormalizedIntent::from_parts(tokens, amounts))
    }

    fn add_dust(
        &self,
        intent: &mut OrderIntent,
        decimals: u32,
        dust: &mut DustGenerator,
    ) -> IntentResult<()> {
        let mut added = 0usize;
        for token in self.authority.list_whitelisted()? {
            if !intent.contains(&token) {
                let weight = dust.next_weight(decimals);
                debug!(token = %token, weight, "Adding dust allocation");
                intent.insert(token, weight);
                added += 1;
            }
        }
        debug!(added, seed = dust.seed(), "Added dust allocations");
        Ok(())
    }
}

/// One-shot normalization against `authority`.
pub fn validate_order<A>(
    authority: A,
    intent: &OrderIntent,
    dust: Option<&mut DustGenerator>,
) -> IntentResult<NormalizedIntent>
where
    A: WhitelistAuthority + DecimalsAuthority,
{
    Normalizer::new(authority).normalize(intent, dust)
}
