use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::authority::AuthorityError;

/// Absolute tolerance on the sum of intent weights.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-10;

/// Largest fixed-point precision the normalizer accepts.
pub const MAX_DECIMALS: u32 = 18;

// Token (vault) identifier, kept lowercase so hex addresses compare case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TokenId(String);

impl TokenId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TokenId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for TokenId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<TokenId> for String {
    fn from(token: TokenId) -> Self {
        token.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Desired allocation as `token -> weight`, in insertion order.
///
/// Behaves like a map: inserting a token that is already present replaces its
/// weight and keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderIntent {
    entries: Vec<(TokenId, f64)>,
}

impl OrderIntent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<TokenId>, weight: f64) -> Option<f64> {
        let token = token.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some((_, existing)) => Some(std::mem::replace(existing, weight)),
            None => {
                self.entries.push((token, weight));
                None
            }
        }
    }

    pub fn get(&self, token: &TokenId) -> Option<f64> {
        self.entries.iter().find(|(t, _)| t == token).map(|(_, w)| *w)
    }

    pub fn contains(&self, token: &TokenId) -> bool {
        self.entries.iter().any(|(t, _)| t == token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TokenId, f64)> + '_ {
        self.entries.iter().map(|(t, w)| (t, *w))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenId> + '_ {
        self.entries.iter().map(|(t, _)| t)
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Divide every weight by the current total.
    pub(crate) fn rescale_to_unit(&mut self) {
        let total = self.total_weight();
        for (_, w) in &mut self.entries {
            *w /= total;
        }
    }

    pub(crate) fn into_entries(self) -> Vec<(TokenId, f64)> {
        self.entries
    }
}

impl<K: Into<TokenId>> FromIterator<(K, f64)> for OrderIntent {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut intent = OrderIntent::new();
        for (token, weight) in iter {
            intent.insert(token, weight);
        }
        intent
    }
}

impl Serialize for OrderIntent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (token, weight) in &self.entries {
            map.serialize_entry(token.as_str(), weight)?;
        }
        map.end()
    }
}

// Hand-written so the JSON object order survives deserialization
impl<'de> Deserialize<'de> for OrderIntent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IntentVisitor;

        impl<'de> Visitor<'de> for IntentVisitor {
            type Value = OrderIntent;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of token identifiers to weights")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut intent = OrderIntent::new();
                while let Some((token, weight)) = access.next_entry::<String, f64>()? {
                    intent.insert(token, weight);
                }
                Ok(intent)
            }
        }

        deserializer.deserialize_map(IntentVisitor)
    }
}

/// Fixed-point allocation whose amounts sum to `10^decimals`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedIntent {
    entries: Vec<(TokenId, u128)>,
}

impl NormalizedIntent {
    pub(crate) fn from_parts(tokens: Vec<TokenId>, amounts: Vec<u128>) -> Self {
        Self { entries: tokens.into_iter().zip(amounts).collect() }
    }

    pub fn get(&self, token: &TokenId) -> Option<u128> {
        self.entries.iter().find(|(t, _)| t == token).map(|(_, a)| *a)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TokenId, u128)> + '_ {
        self.entries.iter().map(|(t, a)| (t, *a))
    }

    pub fn total(&self) -> u128 {
        self.entries.iter().map(|(_, a)| a).sum()
    }
}

impl<K: Into<TokenId>> FromIterator<(K, u128)> for NormalizedIntent {
    fn from_iter<I: IntoIterator<Item = (K, u128)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(t, a)| (t.into(), a)).collect() }
    }
}

impl Serialize for NormalizedIntent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (token, amount) in &self.entries {
            map.serialize_entry(token.as_str(), amount)?;
        }
        map.end()
    }
}

/// How the amounts are encoded on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Plaintext,
    Encrypted,
}

impl Encoding {
    /// Numeric tag used by the vault contract.
    pub fn tag(self) -> u8 {
        match self {
            Encoding::Plaintext => 0,
            Encoding::Encrypted => 1,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Encoding::Plaintext => "plaintext",
            Encoding::Encrypted => "encrypted",
        })
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "plaintext" => Ok(Encoding::Plaintext),
            "1" | "encrypted" => Ok(Encoding::Encrypted),
            other => Err(format!(
                "invalid encoding '{}': use plaintext (0) or encrypted (1)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoundingError {
    #[error("value at index {index} is not finite: {value}")]
    NonFinite { index: usize, value: f64 },
    #[error("value at index {index} is negative: {value}")]
    Negative { index: usize, value: f64 },
    #[error("cannot distribute a target of {target} over zero values")]
    NoValues { target: u128 },
}

#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("tokens not whitelisted: {}", .0.iter().join(", "))]
    InvalidToken(Vec<TokenId>),
    #[error("weight for {token} must be strictly positive, got {weight}")]
    InvalidWeight { token: TokenId, weight: f64 },
    #[error("weights sum to {sum}, expected 1 within {tolerance}")]
    InvalidSum { sum: f64, tolerance: f64 },
    #[error("unsupported intent decimals {0} (max {max})", max = MAX_DECIMALS)]
    UnsupportedDecimals(u32),
    #[error("rounding failed: {0}")]
    Rounding(#[from] RoundingError),
    #[error(transparent)]
    Authority(#[from] AuthorityError),
}

pub type IntentResult<T> = Result<T, IntentError>;
