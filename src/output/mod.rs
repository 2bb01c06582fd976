pub mod csv;
pub mod json;
pub mod table;

use crate::scoring::MAX_SCORE;

/// Dollar amount rounded to cents, sign in front of the symbol.
pub fn format_usd(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded < 0.0 {
        format!("-${:.2}", -rounded)
    } else {
        format!("${:.2}", rounded.abs())
    }
}

pub fn format_pct(value: f64) -> String {
    format!("{value:.1}%")
}

/// Filled and empty dots for a 1..=5 score, e.g. `●●●○○`.
pub fn score_bar(value: u8) -> String {
    let filled = usize::from(value.min(MAX_SCORE));
    let empty = usize::from(MAX_SCORE) - filled;
    format!("{}{}", "●".repeat(filled), "○".repeat(empty))
}
