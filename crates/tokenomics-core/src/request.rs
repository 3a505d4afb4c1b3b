use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CatalogError;

/// Declares a closed catalog of form values that travel to the backend as
/// their display strings.
macro_rules! catalog {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| CatalogError::new($kind, wanted))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

catalog! {
    /// Project category offered by the form.
    ProjectType, "project type" {
        Nft => "NFT",
        DeFi => "DeFi",
        L2Infrastructure => "L2 Infrastructure",
        GameFi => "GameFi",
        Dao => "DAO",
        Web3Social => "Web3 Social",
        AiMlProtocol => "AI/ML Protocol",
        Rwa => "RWA",
    }
}

catalog! {
    TargetAudience, "target audience" {
        Retail => "retail",
        Institutional => "institutional",
        Both => "both",
    }
}

catalog! {
    /// Fixed catalog of token utilities a project can select.
    UtilityTag, "utility" {
        Staking => "staking",
        Governance => "governance",
        MarketplaceCurrency => "marketplace currency",
        FeeDiscounts => "fee discounts",
        AccessRights => "access rights",
        Rewards => "rewards",
        Payments => "payments",
        Collateral => "collateral",
        BurnMechanism => "burn mechanism",
        LiquidityMining => "liquidity mining",
    }
}

catalog! {
    DistributionFocus, "distribution focus" {
        Balanced => "balanced",
        CommunityHeavy => "community-heavy",
        InvestorFriendly => "investor-friendly",
        TeamFocused => "team-focused",
    }
}

catalog! {
    LaunchStrategy, "launch strategy" {
        Gradual => "gradual",
        FairLaunch => "fair-launch",
        Ido => "ido",
        PrivateSale => "private-sale",
    }
}

catalog! {
    EconomicModel, "economic model" {
        Standard => "standard",
        Deflationary => "deflationary",
        Inflationary => "inflationary",
        DualToken => "dual-token",
    }
}

/// Initial token supply: one of the preset sizes or a free-form value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InitialSupply {
    OneMillion,
    TenMillion,
    HundredMillion,
    OneBillion,
    TenBillion,
    Custom(String),
}

impl InitialSupply {
    pub const PRESETS: &'static [InitialSupply] = &[
        InitialSupply::OneMillion,
        InitialSupply::TenMillion,
        InitialSupply::HundredMillion,
        InitialSupply::OneBillion,
        InitialSupply::TenBillion,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            InitialSupply::OneMillion => "1M",
            InitialSupply::TenMillion => "10M",
            InitialSupply::HundredMillion => "100M",
            InitialSupply::OneBillion => "1B",
            InitialSupply::TenBillion => "10B",
            InitialSupply::Custom(value) => value,
        }
    }

    /// Token count for preset sizes; custom values are left to the backend.
    pub fn token_count(&self) -> Option<u64> {
        match self {
            InitialSupply::OneMillion => Some(1_000_000),
            InitialSupply::TenMillion => Some(10_000_000),
            InitialSupply::HundredMillion => Some(100_000_000),
            InitialSupply::OneBillion => Some(1_000_000_000),
            InitialSupply::TenBillion => Some(10_000_000_000),
            InitialSupply::Custom(_) => None,
        }
    }
}

impl Default for InitialSupply {
    fn default() -> Self {
        InitialSupply::HundredMillion
    }
}

impl fmt::Display for InitialSupply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for InitialSupply {
    fn from(value: &str) -> Self {
        let value = value.trim();
        InitialSupply::PRESETS
            .iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(value))
            .cloned()
            .unwrap_or_else(|| InitialSupply::Custom(value.to_string()))
    }
}

impl Serialize for InitialSupply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InitialSupply {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(InitialSupply::from(raw.as_str()))
    }
}

/// A submitted project description. Built once from form state and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub project_name: Option<String>,
    pub project_type: ProjectType,
    pub target_audience: TargetAudience,
    pub funding_goals: String,
    pub planned_raise_size: Option<String>,
    pub desired_utility: BTreeSet<UtilityTag>,
    #[serde(default)]
    pub initial_supply: InitialSupply,
    #[serde(default = "default_distribution_focus")]
    pub distribution_focus: DistributionFocus,
    #[serde(default = "default_launch_strategy")]
    pub launch_strategy: LaunchStrategy,
    #[serde(default = "default_economic_model")]
    pub economic_model: EconomicModel,
    pub additional_info: Option<String>,
}

fn default_distribution_focus() -> DistributionFocus {
    DistributionFocus::Balanced
}

fn default_launch_strategy() -> LaunchStrategy {
    LaunchStrategy::Gradual
}

fn default_economic_model() -> EconomicModel {
    EconomicModel::Standard
}

impl ProjectRequest {
    /// Name shown on reports; falls back to "<type> Project" like the backend.
    pub fn display_name(&self) -> String {
        match &self.project_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("{} Project", self.project_type),
        }
    }
}
