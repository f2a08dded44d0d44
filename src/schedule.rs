//! Promotion scheduling on calendar boundaries.
//!
//! Pure decision logic: no I/O happens here. The caller derives the last
//! promotion time from the tier directory (see [`crate::rotate`]) and passes
//! the current wall-clock time in.

use crate::tier::Tier;
use chrono::{Datelike, NaiveDateTime, Timelike};

/// Decides whether a freshly built archive should be promoted into `tier`.
///
/// A tier with no prior archive always promotes (bootstrap). The hourly tier
/// promotes whenever the hour slot changed, ignoring `promotion_hour`. The
/// daily/weekly/monthly tiers promote when their calendar period changed, but
/// only during `promotion_hour` when one is configured, so long-lived tiers
/// land in a stable wall-clock window instead of at an arbitrary moment after
/// the rollover.
pub fn should_promote(
    tier: Tier,
    last_promoted: Option<NaiveDateTime>,
    now: NaiveDateTime,
    promotion_hour: Option<u32>,
) -> bool {
    let Some(last) = last_promoted else {
        return true;
    };

    if tier != Tier::Hourly {
        if let Some(hour) = promotion_hour {
            if now.hour() != hour {
                return false;
            }
        }
    }

    !same_period(tier, last, now)
}

/// True when both timestamps fall into the same retention period of `tier`.
///
/// Hour slots compare with minutes and seconds zeroed, so minute drift between
/// runs never suppresses an hourly promotion. Weeks compare as ISO-8601
/// (year, week) pairs, which keeps year-boundary weeks intact.
fn same_period(tier: Tier, a: NaiveDateTime, b: NaiveDateTime) -> bool {
    match tier {
        Tier::Hourly => (a.date(), a.hour()) == (b.date(), b.hour()),
        Tier::Daily => a.date() == b.date(),
        Tier::Weekly => {
            let (wa, wb) = (a.iso_week(), b.iso_week());
            (wa.year(), wa.week()) == (wb.year(), wb.week())
        }
        Tier::Monthly => (a.year(), a.month()) == (b.year(), b.month()),
    }
}
