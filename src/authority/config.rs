use std::collections::HashSet;

use tracing::debug;

use super::{AuthorityError, AuthorityResult, DecimalsAuthority, WhitelistAuthority};
use crate::intent::TokenId;
use crate::settings::Settings;

/// Whitelist and decimals answered from local configuration.
#[derive(Debug, Clone)]
pub struct ConfigAuthority {
    whitelist: Vec<TokenId>,
    index: HashSet<TokenId>,
    decimals: Option<u32>,
}

impl ConfigAuthority {
    pub fn new<I, T>(whitelist: I, decimals: u32) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TokenId>,
    {
        Self::build(whitelist, Some(decimals))
    }

    /// Missing `intent_decimals` only fails once something asks for decimals.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::build(settings.whitelist.iter().map(String::as_str), settings.intent_decimals)
    }

    fn build<I, T>(whitelist: I, decimals: Option<u32>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TokenId>,
    {
        let mut index = HashSet::new();
        // Duplicates collapse onto their first position
        let whitelist: Vec<TokenId> = whitelist
            .into_iter()
            .map(Into::into)
            .filter(|t: &TokenId| index.insert(t.clone()))
            .collect();

        debug!(tokens = whitelist.len(), decimals = ?decimals, "Built config authority");
        Self { whitelist, index, decimals }
    }
}

impl WhitelistAuthority for ConfigAuthority {
    fn is_whitelisted(&self, token: &TokenId) -> AuthorityResult<bool> {
        Ok(self.index.contains(token))
    }

    fn list_whitelisted(&self) -> AuthorityResult<Vec<TokenId>> {
        Ok(self.whitelist.clone())
    }
}

impl DecimalsAuthority for ConfigAuthority {
    fn decimals(&self) -> AuthorityResult<u32> {
        self.decimals
            .ok_or_else(|| AuthorityError::Unavailable("intent_decimals is not configured".into()))
    }
}
