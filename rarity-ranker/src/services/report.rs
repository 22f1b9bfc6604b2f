//! Text rendering of ranked results

use crate::models::RankedEntry;
use std::fmt::Write;

/// Render the ranked report
///
/// ```text
/// Top 5 most rare tokens:
/// Top 1: Token id 2, Rarity 0.5
/// ```
pub fn format_report(top: &[RankedEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Top {} most rare tokens:", top.len());
    for entry in top {
        let _ = writeln!(
            out,
            "Top {}: Token id {}, Rarity {}",
            entry.rank,
            entry.id,
            format_rarity(entry.rarity)
        );
    }
    out
}

/// Shortest round-trip rendering, switching to exponent form below 1e-4
/// and from 1e21 upward with a signed, two-digit exponent (`2.5e-05`)
pub fn format_rarity(rarity: f64) -> String {
    if rarity == 0.0 || !rarity.is_finite() {
        return rarity.to_string();
    }

    let scientific = format!("{:e}", rarity);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return rarity.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return rarity.to_string();
    };

    if (-4..21).contains(&exponent) {
        rarity.to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}
