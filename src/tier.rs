//! Retention tiers and per-tier policy.

use std::fmt;

/// One retention bucket. Tiers are a fixed, ordered set; each owns a
/// subdirectory of the instance's backup directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Tier {
    /// All tiers in the order they are processed during a run.
    pub const ALL: [Tier; 4] = [Tier::Hourly, Tier::Daily, Tier::Weekly, Tier::Monthly];

    /// Name of the tier's directory under the instance backup directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            Tier::Hourly => "hourly",
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
        }
    }

    /// Suffix used in the `QBT_ENABLE_*` / `QBT_KEEP_*` environment keys.
    pub fn env_suffix(self) -> &'static str {
        match self {
            Tier::Hourly => "HOURLY",
            Tier::Daily => "DAILY",
            Tier::Weekly => "WEEKLY",
            Tier::Monthly => "MONTHLY",
        }
    }

    /// Default number of archives retained in this tier.
    pub fn default_keep(self) -> usize {
        match self {
            Tier::Hourly => 24,
            Tier::Daily => 7,
            Tier::Weekly => 4,
            Tier::Monthly => 6,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Retention settings for a single tier.
#[derive(Debug, Clone, Copy)]
pub struct TierPolicy {
    pub tier: Tier,

    /// Whether this tier receives promotions at all.
    pub enabled: bool,

    /// Maximum number of archives retained after pruning.
    pub keep: usize,
}
