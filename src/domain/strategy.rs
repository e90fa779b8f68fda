//! Strategy identifiers.
//!
//! The set is fixed at compile time. The supervisor only stores and
//! forwards the identifier; what a strategy actually trades is decided
//! by the worker it launches.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PmError;

/// Trading behaviour a supervised worker runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Single resting quote around the mid.
    Simple,
    /// Ladder of buy/sell orders across a price band.
    Grid,
    /// Time-weighted execution of a target size.
    Twap,
    /// Periodic fixed-size buys.
    Dca,
    /// Two-sided market making.
    #[serde(rename = "mm")]
    MarketMaker,
}

impl Strategy {
    /// Every known strategy, in display order.
    pub const ALL: [Self; 5] = [
        Self::Simple,
        Self::Grid,
        Self::Twap,
        Self::Dca,
        Self::MarketMaker,
    ];

    /// Identifier used on the command line and in the store file.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Grid => "grid",
            Self::Twap => "twap",
            Self::Dca => "dca",
            Self::MarketMaker => "mm",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = PmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|st| st.as_str()).collect();
                PmError::validation(
                    "strategy",
                    format!("unknown strategy '{s}' (expected one of: {})", known.join(", ")),
                )
            })
    }
}
