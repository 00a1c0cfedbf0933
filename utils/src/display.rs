//! Operator-facing formatting.

use franchise_types::Lamports;
use std::time::Duration;

/// `12.5 SOL`, `0.0001 SOL`.
pub fn format_sol(amount: Lamports) -> String {
    format!("{amount} SOL")
}

/// Format an elapsed duration compactly.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    let secs = elapsed.as_secs();
    if millis < 1_000 {
        format!("{millis}ms")
    } else if secs < 60 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
