pub mod types;
pub use types::*;
pub mod dust;
pub mod normalizer;
pub mod portfolio;
pub mod rounding;

pub use dust::{DustGenerator, DEFAULT_DUST_SEED};
pub use normalizer::{validate_order, Normalizer};
pub use rounding::round_with_fixed_sum;
