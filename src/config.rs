//! Application configuration loaded from environment variables.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Scan Parameters ===
    /// Amount distributed across the legs of each opportunity.
    #[serde(default = "default_total_investment")]
    pub total_investment: Decimal,

    /// Opportunities below this profit percentage are not reported.
    #[serde(default)]
    pub min_profit_pct: Decimal,

    /// Decimal places used when displaying stakes.
    #[serde(default = "default_stake_decimals")]
    pub stake_decimals: u32,

    /// Evaluate events on the rayon pool.
    #[serde(default)]
    pub parallel_scan: bool,

    // === Data Source ===
    /// JSON snapshot to scan instead of the simulated feed.
    #[serde(default)]
    pub snapshot_path: Option<String>,

    /// Seed for the simulated feed (random when unset).
    #[serde(default)]
    pub simulator_seed: Option<u64>,

    /// Seconds between cycles in watch mode.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_total_investment() -> Decimal {
    Decimal::new(100, 0)
}

fn default_stake_decimals() -> u32 {
    2
}

fn default_scan_interval() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            total_investment: default_total_investment(),
            min_profit_pct: Decimal::ZERO,
            stake_decimals: default_stake_decimals(),
            parallel_scan: false,
            snapshot_path: None,
            simulator_seed: None,
            scan_interval_secs: default_scan_interval(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.total_investment <= Decimal::ZERO {
            return Err("TOTAL_INVESTMENT must be greater than 0".to_string());
        }

        if self.min_profit_pct < Decimal::ZERO {
            return Err("MIN_PROFIT_PCT must not be negative".to_string());
        }

        if self.scan_interval_secs == 0 {
            return Err("SCAN_INTERVAL_SECS must be at least 1".to_string());
        }

        if self.stake_decimals > 8 {
            return Err("STAKE_DECIMALS must be at most 8".to_string());
        }

        Ok(())
    }

    /// Log filter directive. Verbose (from `VERBOSE` or the CLI flag)
    /// turns on debug output for this crate.
    pub fn log_directive(&self, cli_verbose: bool) -> String {
        if self.verbose || cli_verbose {
            "surebet_scan=debug,info".to_string()
        } else {
            self.rust_log.clone()
        }
    }

    /// Human-readable name of the odds source.
    pub fn source_label(&self) -> String {
        match (&self.snapshot_path, self.simulator_seed) {
            (Some(path), _) => format!("file {}", path),
            (None, Some(seed)) => format!("simulator (seed {})", seed),
            (None, None) => "simulator".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_values_are_sensible() {
        let config = Config::default();
        assert_eq!(config.total_investment, dec!(100));
        assert_eq!(config.min_profit_pct, Decimal::ZERO);
        assert_eq!(config.stake_decimals, 2);
        assert_eq!(config.scan_interval_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_investment() {
        let config = Config {
            total_investment: Decimal::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            total_investment: dec!(-10),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_threshold_and_zero_interval() {
        let config = Config {
            min_profit_pct: dec!(-0.5),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            scan_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn verbose_from_env_or_cli_enables_debug() {
        let quiet = Config {
            rust_log: "warn".to_string(),
            ..Config::default()
        };
        assert_eq!(quiet.log_directive(false), "warn");
        assert_eq!(quiet.log_directive(true), "surebet_scan=debug,info");

        let loud = Config {
            verbose: true,
            ..quiet
        };
        assert_eq!(loud.log_directive(false), "surebet_scan=debug,info");
    }

    #[test]
    fn source_label_prefers_snapshot_file() {
        let config = Config {
            snapshot_path: Some("odds.json".to_string()),
            simulator_seed: Some(7),
            ..Config::default()
        };
        assert_eq!(config.source_label(), "file odds.json");

        let config = Config {
            simulator_seed: Some(7),
            ..Config::default()
        };
        assert_eq!(config.source_label(), "simulator (seed 7)");
    }
}
