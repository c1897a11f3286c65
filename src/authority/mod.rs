//! Collaborators the normalizer reads from: which tokens are whitelisted and
//! how many decimals an intent carries.
//!
//! On a live deployment these answer from the protocol config contract. The
//! normalizer only sees the traits, so tests and offline tooling plug in
//! [`ConfigAuthority`] instead.

pub mod config;

pub use config::ConfigAuthority;

use crate::intent::TokenId;

#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
    #[error("authority unavailable: {0}")]
    Unavailable(String),
    #[error("authority returned an invalid answer: {0}")]
    InvalidResponse(String),
}

pub type AuthorityResult<T> = Result<T, AuthorityError>;

pub trait WhitelistAuthority {
    fn is_whitelisted(&self, token: &TokenId) -> AuthorityResult<bool>;

    /// Whitelisted tokens in the authority's canonical order.
    fn list_whitelisted(&self) -> AuthorityResult<Vec<TokenId>>;
}

pub trait DecimalsAuthority {
    fn decimals(&self) -> AuthorityResult<u32>;
}

impl<T: WhitelistAuthority + ?Sized> WhitelistAuthority for &T {
    fn is_whitelisted(&self, token: &TokenId) -> AuthorityResult<bool> {
        (**self).is_whitelisted(token)
    }

    fn list_whitelisted(&self) -> AuthorityResult<Vec<TokenId>> {
        (**self).list_whitelisted()
    }
}

impl<T: DecimalsAuthority + ?Sized> DecimalsAuthority for &T {
    fn decimals(&self) -> AuthorityResult<u32> {
        (**self).decimals()
    }
}
