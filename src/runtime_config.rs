// =============================================================================
// Runtime Configuration: engine thresholds and scan settings
// =============================================================================
//
// `EngineConfig` is the explicit parameter struct handed to the pure engine
// (classifier + recommendation builder).  `RuntimeConfig` wraps it with the
// scan-loop and service settings.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::ScanPolicy;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_window() -> usize {
    14
}

fn default_rsi_oversold() -> f64 {
    30.0
}

fn default_rsi_overbought() -> f64 {
    70.0
}

fn default_take_profit_pct() -> f64 {
    10.0
}

fn default_stop_loss_pct() -> f64 {
    10.0
}

fn default_entry_buffer_fallback() -> f64 {
    0.1
}

fn default_tickers() -> Vec<String> {
    ["AMC", "BB", "NOK", "SNDL", "PLTR", "AAL", "CCL", "F", "UAL", "GME"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_concurrency() -> usize {
    4
}

fn default_lookback_days() -> u32 {
    30
}

fn default_scan_interval_secs() -> u64 {
    300
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Parameters of the indicator / classifier / eligibility engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Look-back window for SMA, EMA, ATR and RSI.
    #[serde(default = "default_window")]
    pub window: usize,

    /// Reject quotes priced above this ceiling (e.g. 5.0 for penny scans).
    #[serde(default)]
    pub price_ceiling: Option<f64>,

    /// Reject quotes whose volume is below this floor.  A quote with no
    /// volume fails the check.
    #[serde(default)]
    pub min_volume: Option<u64>,

    /// Minimum `(target - price) / price` for a `BuyUptrend` signal.
    #[serde(default)]
    pub min_profit_fraction: f64,

    /// RSI strictly below this is oversold.
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,

    /// RSI strictly above this is overbought.
    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: f64,

    /// Exit-plan take-profit distance, percent of the quote price.
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,

    /// Exit-plan stop-loss distance, percent of the quote price.
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,

    /// Buy-below buffer used when ATR is undefined.
    #[serde(default = "default_entry_buffer_fallback")]
    pub entry_buffer_fallback: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            price_ceiling: None,
            min_volume: None,
            min_profit_fraction: 0.0,
            rsi_oversold: default_rsi_oversold(),
            rsi_overbought: default_rsi_overbought(),
            take_profit_pct: default_take_profit_pct(),
            stop_loss_pct: default_stop_loss_pct(),
            entry_buffer_fallback: default_entry_buffer_fallback(),
        }
    }
}

impl EngineConfig {
    /// Filters used by the penny-stock scans: price <= 5.00 and at least one
    /// million shares traded.
    pub fn penny_stock() -> Self {
        Self {
            price_ceiling: Some(5.0),
            min_volume: Some(1_000_000),
            ..Self::default()
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the scanner service.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Engine thresholds and filters.
    #[serde(default)]
    pub engine: EngineConfig,

    // --- Ticker source -------------------------------------------------------

    /// Tickers to scan when no universe URL is configured.
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,

    /// CSV with a `Symbol` column; when set it replaces `tickers`.
    #[serde(default)]
    pub universe_url: Option<String>,

    /// Randomise ticker order before every scan.
    #[serde(default)]
    pub shuffle: bool,

    // --- Scan loop -----------------------------------------------------------

    #[serde(default)]
    pub policy: ScanPolicy,

    /// Maximum tickers evaluated at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Calendar days of daily history requested per ticker.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Only Buy signals count as eligible picks.
    #[serde(default)]
    pub require_buy_signal: bool,

    // --- Service -------------------------------------------------------------

    /// Seconds between background rescans.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            tickers: default_tickers(),
            universe_url: None,
            shuffle: false,
            policy: ScanPolicy::default(),
            concurrency: default_concurrency(),
            lookback_days: default_lookback_days(),
            require_buy_signal: false,
            scan_interval_secs: default_scan_interval_secs(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            tickers = config.tickers.len(),
            policy = %config.policy,
            "config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "config saved (atomic)");
        Ok(())
    }

    /// Apply `SCOUT_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(list) = std::env::var("SCOUT_TICKERS") {
            self.tickers = parse_ticker_list(&list);
        }
        if let Ok(addr) = std::env::var("SCOUT_BIND_ADDR") {
            if !addr.trim().is_empty() {
                self.bind_addr = addr.trim().to_string();
            }
        }
    }
}

/// Split a comma-separated ticker list, upper-casing and dropping blanks.
pub fn parse_ticker_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_config_has_expected_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.window, 14);
        assert_eq!(cfg.price_ceiling, None);
        assert_eq!(cfg.min_volume, None);
        assert_eq!(cfg.min_profit_fraction, 0.0);
        assert_eq!(cfg.rsi_oversold, 30.0);
        assert_eq!(cfg.rsi_overbought, 70.0);
    }

    #[test]
    fn penny_stock_preset() {
        let cfg = EngineConfig::penny_stock();
        assert_eq!(cfg.price_ceiling, Some(5.0));
        assert_eq!(cfg.min_volume, Some(1_000_000));
        assert_eq!(cfg.window, 14);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.engine, EngineConfig::default());
        assert_eq!(cfg.policy, ScanPolicy::FirstEligible);
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.lookback_days, 30);
        assert_eq!(cfg.tickers.len(), 10);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "engine": { "price_ceiling": 5.0 }, "policy": "BestOfAll" }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.engine.price_ceiling, Some(5.0));
        assert_eq!(cfg.engine.window, 14);
        assert_eq!(cfg.policy, ScanPolicy::BestOfAll);
        assert!(!cfg.shuffle);
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("scout-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scout_config.json");

        let mut cfg = RuntimeConfig::default();
        cfg.tickers = vec!["XYZ".into()];
        cfg.policy = ScanPolicy::FixedCount(2);
        cfg.save(&path).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.tickers, vec!["XYZ"]);
        assert_eq!(loaded.policy, ScanPolicy::FixedCount(2));
        assert!(!path.with_extension("json.tmp").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_missing_file_is_error() {
        assert!(RuntimeConfig::load("/definitely/not/here.json").is_err());
    }

    #[test]
    fn ticker_list_parsing() {
        assert_eq!(parse_ticker_list(" aapl, ,msft,"), vec!["AAPL", "MSFT"]);
    }
}
