//! Preset project profiles used to pre-fill the form.

use tokenomics_core::{
    DistributionFocus, EconomicModel, InitialSupply, LaunchStrategy, ProjectType,
    TargetAudience, UtilityTag,
};

/// Fixed values a template writes into the form.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: &'static str,
    pub project_type: ProjectType,
    pub target_audience: TargetAudience,
    pub funding_goals: &'static str,
    pub planned_raise_size: &'static str,
    pub desired_utility: &'static [UtilityTag],
    pub initial_supply: InitialSupply,
    pub distribution_focus: DistributionFocus,
    pub launch_strategy: LaunchStrategy,
    pub economic_model: EconomicModel,
    pub additional_info: &'static str,
}

pub fn all() -> Vec<Template> {
    vec![
        Template {
            name: "DeFi Protocol",
            project_type: ProjectType::DeFi,
            target_audience: TargetAudience::Both,
            funding_goals: "Seed round to audit and launch the lending protocol",
            planned_raise_size: "$3M",
            desired_utility: &[
                UtilityTag::Staking,
                UtilityTag::Governance,
                UtilityTag::FeeDiscounts,
                UtilityTag::LiquidityMining,
            ],
            initial_supply: InitialSupply::HundredMillion,
            distribution_focus: DistributionFocus::Balanced,
            launch_strategy: LaunchStrategy::Gradual,
            economic_model: EconomicModel::Deflationary,
            additional_info: "Protocol fees fund buybacks; liquidity incentives taper over two years",
        },
        Template {
            name: "NFT Marketplace",
            project_type: ProjectType::Nft,
            target_audience: TargetAudience::Retail,
            funding_goals: "Build creator tooling and bootstrap marketplace liquidity",
            planned_raise_size: "$1.5M",
            desired_utility: &[
                UtilityTag::MarketplaceCurrency,
                UtilityTag::Rewards,
                UtilityTag::FeeDiscounts,
                UtilityTag::AccessRights,
            ],
            initial_supply: InitialSupply::OneBillion,
            distribution_focus: DistributionFocus::CommunityHeavy,
            launch_strategy: LaunchStrategy::FairLaunch,
            economic_model: EconomicModel::Standard,
            additional_info: "Creator royalties are partially paid in the native token",
        },
        Template {
            name: "GameFi Economy",
            project_type: ProjectType::GameFi,
            target_audience: TargetAudience::Retail,
            funding_goals: "Fund game development and a play-to-earn reward pool",
            planned_raise_size: "$5M",
            desired_utility: &[
                UtilityTag::Rewards,
                UtilityTag::MarketplaceCurrency,
                UtilityTag::Staking,
                UtilityTag::Governance,
            ],
            initial_supply: InitialSupply::OneBillion,
            distribution_focus: DistributionFocus::CommunityHeavy,
            launch_strategy: LaunchStrategy::Ido,
            economic_model: EconomicModel::DualToken,
            additional_info: "Separate soft currency for in-game rewards, governance token for ownership",
        },
        Template {
            name: "DAO Governance",
            project_type: ProjectType::Dao,
            target_audience: TargetAudience::Both,
            funding_goals: "Capitalize the treasury and fund community grants",
            planned_raise_size: "$2M",
            desired_utility: &[
                UtilityTag::Governance,
                UtilityTag::Staking,
                UtilityTag::FeeDiscounts,
                UtilityTag::AccessRights,
            ],
            initial_supply: InitialSupply::HundredMillion,
            distribution_focus: DistributionFocus::CommunityHeavy,
            launch_strategy: LaunchStrategy::FairLaunch,
            economic_model: EconomicModel::Standard,
            additional_info: "Voting power scales with staking duration",
        },
        Template {
            name: "AI Infrastructure",
            project_type: ProjectType::AiMlProtocol,
            target_audience: TargetAudience::Institutional,
            funding_goals: "Scale the compute network and onboard node operators",
            planned_raise_size: "$10M",
            desired_utility: &[
                UtilityTag::Payments,
                UtilityTag::Staking,
                UtilityTag::Collateral,
                UtilityTag::Governance,
            ],
            initial_supply: InitialSupply::OneBillion,
            distribution_focus: DistributionFocus::InvestorFriendly,
            launch_strategy: LaunchStrategy::PrivateSale,
            economic_model: EconomicModel::Inflationary,
            additional_info: "Node operators stake collateral and earn emissions for served inference",
        },
    ]
}

/// Case-insensitive lookup by template name.
pub fn find(name: &str) -> Option<Template> {
    all()
        .into_iter()
        .find(|template| template.name.eq_ignore_ascii_case(name.trim()))
}
