use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CatalogError;

const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Purchasable package. Prices are fixed per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageTier {
    Basic,
    Pro,
    Premium,
}

impl PackageTier {
    pub const ALL: [PackageTier; 3] = [PackageTier::Basic, PackageTier::Pro, PackageTier::Premium];

    /// Identifier sent to the backend as `package_id`.
    pub fn id(&self) -> &'static str {
        match self {
            PackageTier::Basic => "basic",
            PackageTier::Pro => "pro",
            PackageTier::Premium => "premium",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PackageTier::Basic => "Basic Tokenomics",
            PackageTier::Pro => "Pro Tokenomics",
            PackageTier::Premium => "Premium Package",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PackageTier::Basic => "Standard tokenomics design with PDF and charts",
            PackageTier::Pro => "Advanced tokenomics with multiple iterations and comparisons",
            PackageTier::Premium => "Complete tokenomics suite with investor deck",
        }
    }

    /// Card checkout price in USD.
    pub fn usd_price(&self) -> f64 {
        match self {
            PackageTier::Basic => 79.0,
            PackageTier::Pro => 199.0,
            PackageTier::Premium => 499.0,
        }
    }

    /// Wallet payment price in lamports.
    pub fn lamports(&self) -> u64 {
        match self {
            PackageTier::Basic => LAMPORTS_PER_SOL / 2,
            PackageTier::Pro => LAMPORTS_PER_SOL + LAMPORTS_PER_SOL / 4,
            PackageTier::Premium => 3 * LAMPORTS_PER_SOL,
        }
    }

    /// Wallet payment price in SOL.
    pub fn sol_price(&self) -> f64 {
        self.lamports() as f64 / LAMPORTS_PER_SOL as f64
    }
}

impl fmt::Display for PackageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PackageTier {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageTier::ALL
            .iter()
            .copied()
            .find(|tier| tier.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::new("package", s.trim()))
    }
}
