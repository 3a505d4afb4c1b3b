use serde::{Deserialize, Serialize};

use crate::ProjectRequest;

/// Colours assigned to allocation slices, cycled by index.
pub const CHART_PALETTE: [&str; 7] = [
    "#DC1FFF", "#00FFA3", "#FF6B35", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAllocation {
    pub category: String,
    pub percentage: f64,
    pub tokens: u64,
    pub description: String,
    pub vesting_schedule: String,
    #[serde(default)]
    pub cliff_months: u32,
    #[serde(default)]
    pub linear_unlock_months: u32,
}

impl TokenAllocation {
    /// Months until the allocation is fully unlocked.
    pub fn full_unlock_months(&self) -> u32 {
        self.cliff_months + self.linear_unlock_months
    }
}

/// A generated tokenomics design as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenomicsProject {
    pub id: String,
    pub project_name: String,
    pub request_data: ProjectRequest,
    pub allocations: Vec<TokenAllocation>,
    pub total_supply: u64,
    pub narrative: String,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub comparable_projects: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub pdf_generated: bool,
    #[serde(default = "default_payment_status")]
    pub payment_status: String,
}

fn default_payment_status() -> String {
    "pending".to_string()
}

impl TokenomicsProject {
    pub fn allocated_percentage(&self) -> f64 {
        self.allocations.iter().map(|a| a.percentage).sum()
    }

    pub fn allocated_tokens(&self) -> u64 {
        self.allocations.iter().map(|a| a.tokens).sum()
    }

    /// File name the backend uses for the exported document.
    pub fn document_file_name(&self) -> String {
        format!("{}_Tokenomics.pdf", self.project_name)
    }
}

/// One slice of the allocation chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub name: String,
    pub value: f64,
    pub tokens: u64,
    pub color: String,
}

impl ChartEntry {
    /// Derives chart slices from allocations, cycling through [`CHART_PALETTE`].
    pub fn from_allocations(allocations: &[TokenAllocation]) -> Vec<ChartEntry> {
        allocations
            .iter()
            .enumerate()
            .map(|(i, alloc)| ChartEntry {
                name: alloc.category.clone(),
                value: alloc.percentage,
                tokens: alloc.tokens,
                color: CHART_PALETTE[i % CHART_PALETTE.len()].to_string(),
            })
            .collect()
    }
}

/// Response of a generation request. Regeneration yields a new value; there
/// is no update path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenomicsResult {
    pub project: TokenomicsProject,
    #[serde(default)]
    pub chart_data: Vec<ChartEntry>,
}

impl TokenomicsResult {
    /// Chart series as sent by the backend, or derived from the allocations
    /// when the backend omitted it.
    pub fn chart_series(&self) -> Vec<ChartEntry> {
        if self.chart_data.is_empty() {
            ChartEntry::from_allocations(&self.project.allocations)
        } else {
            self.chart_data.clone()
        }
    }
}
