//! Configuration, built once from the environment at process start.
//!
//! All options have defaults; an unparsable value falls back to its default
//! rather than aborting the run. The resulting value is immutable and passed
//! by reference into the orchestrator.

use crate::tier::{Tier, TierPolicy};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing one subdirectory per instance.
    pub source_root: PathBuf,

    /// Root of the backup destination tree.
    pub backup_root: PathBuf,

    /// Path that must be a genuine mount point before the run may touch the
    /// destination. Commonly an ancestor of `backup_root`.
    pub mount_point: PathBuf,

    /// Gzip compression level, 1 (fastest) to 9 (smallest).
    pub compression_level: u32,

    /// Retention tiers in processing order.
    pub tiers: Vec<TierPolicy>,

    /// When set, daily/weekly/monthly promotions only happen during this
    /// hour of the day (0-23). Hourly promotions are unaffected.
    pub promotion_hour: Option<u32>,

    pub log_level: String,

    /// When true, a preflight abort (destination not mounted, source root
    /// missing) exits with a non-zero status instead of the historical
    /// silent success.
    pub strict_exit: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            source_root: PathBuf::from(env_or("QBT_SOURCE_ROOT", "/var/lib/qbittorrent")),
            backup_root: PathBuf::from(env_or(
                "QBT_BACKUP_ROOT",
                "/mnt/hdd-pool/main/Backups/qBittorrent",
            )),
            mount_point: PathBuf::from(env_or("QBT_MOUNT_POINT", "/mnt/hdd-pool")),
            compression_level: env_parse("QBT_COMPRESSION_LEVEL", 6u32).clamp(1, 9),
            tiers: Tier::ALL
                .iter()
                .map(|&tier| TierPolicy {
                    tier,
                    enabled: env_bool(&format!("QBT_ENABLE_{}", tier.env_suffix()), true),
                    keep: env_parse(&format!("QBT_KEEP_{}", tier.env_suffix()), tier.default_keep()),
                })
                .collect(),
            promotion_hour: promotion_hour_from_env(),
            log_level: env_or("LOG_LEVEL", "info"),
            strict_exit: env_bool("QBT_STRICT_EXIT", false),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => parse_bool(&v).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `QBT_PROMOTION_HOUR` enables the restriction only for values 0-23; any
/// other value (including the historical `-1` sentinel) leaves it disabled.
fn promotion_hour_from_env() -> Option<u32> {
    std::env::var("QBT_PROMOTION_HOUR")
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|h| (0..=23).contains(h))
        .map(|h| h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_mixed_case() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("definitely"), None);
    }

    #[test]
    fn tier_policies_cover_all_tiers_in_order() {
        let config = Config::from_env();
        let tiers: Vec<Tier> = config.tiers.iter().map(|p| p.tier).collect();
        assert_eq!(tiers, Tier::ALL);
    }
}
