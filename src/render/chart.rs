//! Terminal allocation chart

use colored::Colorize;

use tokenomics_core::ChartEntry;

pub const DEFAULT_BAR_WIDTH: usize = 40;

/// Parses `#RRGGBB`.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Thousands-separated token count, e.g. `15,000,000`.
pub fn format_tokens(tokens: u64) -> String {
    let digits = tokens.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Bar length for a percentage, clamped to the chart width.
pub fn bar_length(percentage: f64, width: usize) -> usize {
    if !percentage.is_finite() || percentage <= 0.0 {
        return 0;
    }
    let length = (percentage / 100.0 * width as f64).round() as usize;
    length.min(width)
}

/// One line per slice: label, coloured bar, percentage and token count.
pub fn render_bar_chart(entries: &[ChartEntry], width: usize) -> Vec<String> {
    let label_width = entries
        .iter()
        .map(|entry| entry.name.chars().count())
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|entry| {
            let bar = "█".repeat(bar_length(entry.value, width));
            let bar = match parse_hex_color(&entry.color) {
                Some((r, g, b)) => bar.truecolor(r, g, b).to_string(),
                None => bar,
            };
            let padding = " ".repeat(width - bar_length(entry.value, width));
            format!(
                "{:<label_width$}  {}{}  {:>5.1}%  {} tokens",
                entry.name,
                bar,
                padding,
                entry.value,
                format_tokens(entry.tokens),
                label_width = label_width,
            )
        })
        .collect()
}
