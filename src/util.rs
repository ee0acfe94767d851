use std::time::Duration;

/// Format an elapsed reaction as milliseconds with two decimal places,
/// e.g. `250.00`.
pub fn format_reaction_ms(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64() * 1000.0)
}
