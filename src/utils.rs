//! Small runtime helpers shared by the CLI commands.

use rust_decimal::Decimal;
use tracing::{info, warn};

/// Resolve when the process receives Ctrl+C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received (Ctrl+C)"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

/// Format an amount with a fixed number of decimal places.
pub fn format_amount(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp(dp);
    format!("{:.*}", dp as usize, rounded)
}

/// Format a percentage with two decimal places.
pub fn format_pct(value: Decimal) -> String {
    format!("{}%", format_amount(value, 2))
}
