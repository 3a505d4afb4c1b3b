//! Results rendering: allocation chart, report text and document export.

pub mod chart;
pub mod report;

pub use chart::{format_tokens, render_bar_chart};
pub use report::{export_document, print_lines, render_project, render_result, wrap_text};
