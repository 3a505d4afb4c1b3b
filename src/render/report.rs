//! Tokenomics report rendering and document export

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use tokenomics_core::{PackageTier, TokenomicsProject, TokenomicsResult};

use super::chart::{format_tokens, render_bar_chart, DEFAULT_BAR_WIDTH};
use crate::wallet::WalletState;

pub const NARRATIVE_WIDTH: usize = 90;

/// Greedy word wrap; lines stay shorter than `max_width` unless a single
/// word is longer.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() < max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Consistency problems in a generated design worth flagging to the reader.
pub fn sanity_warnings(project: &TokenomicsProject) -> Vec<String> {
    let mut warnings = Vec::new();

    if project.allocations.is_empty() {
        warnings.push("No allocations returned".to_string());
        return warnings;
    }

    let percentage = project.allocated_percentage();
    if (percentage - 100.0).abs() > 0.5 {
        warnings.push(format!("Allocations sum to {:.1}% instead of 100%", percentage));
    }

    let tokens = project.allocated_tokens();
    if tokens != project.total_supply {
        warnings.push(format!(
            "Allocated tokens ({}) differ from total supply ({})",
            format_tokens(tokens),
            format_tokens(project.total_supply)
        ));
    }

    warnings
}

/// Full terminal report for a project.
pub fn render_project(project: &TokenomicsProject, chart_lines: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let rule = "═".repeat(70);

    out.push(format!("{}", project.project_name.bold()));
    out.push("Tokenomics Design".to_string());
    out.push(rule.clone());

    out.push(format!("{}", "Project Overview".bold()));
    out.push(format!("  Type: {}", project.request_data.project_type));
    out.push(format!("  Target Audience: {}", project.request_data.target_audience));
    out.push(format!("  Total Supply: {} tokens", format_tokens(project.total_supply)));
    out.push(format!("  Project ID: {}", project.id));
    out.push(String::new());

    out.push(format!("{}", "Token Allocations".bold()));
    out.extend(chart_lines.iter().map(|line| format!("  {}", line)));
    out.push(String::new());
    for allocation in &project.allocations {
        out.push(format!("  {}: {}%", allocation.category.bold(), allocation.percentage));
        out.push(format!(
            "    {} tokens - {}",
            format_tokens(allocation.tokens),
            allocation.description
        ));
        out.push(format!(
            "    Vesting: {} (cliff {}m, linear {}m)",
            allocation.vesting_schedule, allocation.cliff_months, allocation.linear_unlock_months
        ));
    }
    out.push(String::new());

    out.push(format!("{}", "Economic Model & Narrative".bold()));
    out.extend(wrap_text(&project.narrative, NARRATIVE_WIDTH).into_iter().map(|l| format!("  {}", l)));
    out.push(String::new());

    out.push(format!("{}", "Key Risks".bold()));
    for (i, risk) in project.risks.iter().enumerate() {
        out.push(format!("  {}. {}", i + 1, risk));
    }
    out.push(String::new());

    out.push(format!("{}", "Comparable Projects".bold()));
    out.push(format!("  {}", project.comparable_projects.join(", ")));

    let warnings = sanity_warnings(project);
    if !warnings.is_empty() {
        out.push(String::new());
        for warning in warnings {
            out.push(format!("⚠️  {}", warning.bright_yellow()));
        }
    }

    out
}

/// Report for a generation result including the chart and the payment
/// entry points.
pub fn render_result(result: &TokenomicsResult, wallet: Option<&WalletState>) -> Vec<String> {
    let chart = render_bar_chart(&result.chart_series(), DEFAULT_BAR_WIDTH);
    let mut out = render_project(&result.project, &chart);

    out.push(String::new());
    out.push(format!("{}", "Next Steps".bold()));
    out.push(format!("  Export document:  tokenomics pdf {} <dir>", result.project.id));
    for tier in PackageTier::ALL {
        out.push(format!(
            "  {:<17} ${:>6.2} card (tokenomics checkout {})  |  {} SOL wallet (tokenomics pay {})",
            tier.name(),
            tier.usd_price(),
            tier.id(),
            tier.sol_price(),
            tier.id(),
        ));
    }

    match wallet {
        Some(state) if state.connected => {
            let balance = state
                .balance_sol()
                .map(|sol| format!("{:.4} SOL", sol))
                .unwrap_or_else(|| "unknown balance".to_string());
            out.push(format!(
                "  Wallet: {} on {} ({})",
                state.address.as_deref().unwrap_or("?"),
                state.network,
                balance
            ));
        }
        _ => out.push("  Wallet: not connected".to_string()),
    }

    out
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// File name for an exported document with path separators and control
/// characters replaced.
pub fn document_path(dir: &Path, project: &TokenomicsProject) -> PathBuf {
    let name: String = project
        .document_file_name()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    dir.join(name)
}

/// Writes a downloaded document next to other exports.
pub fn export_document(bytes: &[u8], dir: &Path, project: &TokenomicsProject) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    let path = document_path(dir, project);
    fs::write(&path, bytes)
        .with_context(|| format!("Failed to write document: {}", path.display()))?;

    info!(path = %path.display(), size = bytes.len(), "Document exported");
    Ok(path)
}
