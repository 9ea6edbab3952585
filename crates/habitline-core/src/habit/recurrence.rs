//! Recurrence rule definition and interval legality.
//!
//! A rule is a tagged union -- exactly one variant is ever active, so
//! invalid field combinations cannot be constructed. The interval legality
//! sets exist so one picker UI can offer both fine-grained cadences
//! (divisors of an hour) and coarse ones (whole hours) without ever
//! producing a rule the generator cannot expand cleanly.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Sentinel interval for once-daily rules: one whole day in minutes.
pub const FULL_DAY_MINUTES: u32 = 1440;

/// Largest accepted interval (12 hours). Multiples of 60 above this are
/// rejected rather than snapped.
pub const INTERVAL_CEILING_MINUTES: u32 = 720;

/// Divisors of 60 accepted by `Interval` rules, ascending.
const HOUR_DIVISORS: [u32; 11] = [1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30];

/// Which variant of [`RecurrenceRule`] an interval is being checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    OnceDaily,
    Hourly,
    Interval,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::OnceDaily => write!(f, "once-daily"),
            RuleKind::Hourly => write!(f, "hourly"),
            RuleKind::Interval => write!(f, "interval"),
        }
    }
}

/// When a habit fires within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrenceRule {
    /// Fires once at each listed time, every day.
    OnceDaily { times: Vec<NaiveTime> },
    /// Fires every N hours starting at `anchor`, until `end` (or end of day).
    Hourly {
        anchor: NaiveTime,
        interval_minutes: u32,
        end: Option<NaiveTime>,
    },
    /// Fires every N minutes starting at `anchor`, until `end` (or end of day).
    Interval {
        anchor: NaiveTime,
        interval_minutes: u32,
        end: Option<NaiveTime>,
    },
}

impl RecurrenceRule {
    /// Build a once-daily rule; times are sorted and deduplicated.
    pub fn once_daily(mut times: Vec<NaiveTime>) -> Self {
        times.sort();
        times.dedup();
        RecurrenceRule::OnceDaily { times }
    }

    /// Build an hourly rule, validating the interval.
    pub fn hourly(
        anchor: NaiveTime,
        interval_minutes: u32,
        end: Option<NaiveTime>,
    ) -> Result<Self, ValidationError> {
        let rule = RecurrenceRule::Hourly {
            anchor,
            interval_minutes,
            end,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Build a minute-interval rule, validating the interval.
    pub fn interval(
        anchor: NaiveTime,
        interval_minutes: u32,
        end: Option<NaiveTime>,
    ) -> Result<Self, ValidationError> {
        let rule = RecurrenceRule::Interval {
            anchor,
            interval_minutes,
            end,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            RecurrenceRule::OnceDaily { .. } => RuleKind::OnceDaily,
            RecurrenceRule::Hourly { .. } => RuleKind::Hourly,
            RecurrenceRule::Interval { .. } => RuleKind::Interval,
        }
    }

    /// The effective interval for legality checks. Once-daily rules use the
    /// whole-day sentinel.
    pub fn interval_minutes(&self) -> u32 {
        match self {
            RecurrenceRule::OnceDaily { .. } => FULL_DAY_MINUTES,
            RecurrenceRule::Hourly {
                interval_minutes, ..
            }
            | RecurrenceRule::Interval {
                interval_minutes, ..
            } => *interval_minutes,
        }
    }

    /// Check this rule against the legality rules for its own variant.
    ///
    /// Never corrects: an illegal interval is an error, and the caller can
    /// offer [`nearest_legal`] as a suggestion.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let RecurrenceRule::OnceDaily { times } = self {
            if times.is_empty() {
                return Err(ValidationError::NoScheduledTimes);
            }
        }
        let kind = self.kind();
        let interval = self.interval_minutes();
        if !is_legal(kind, interval) {
            return Err(ValidationError::IllegalInterval {
                kind,
                interval,
                legal: legal_set_description(kind),
            });
        }
        Ok(())
    }
}

/// Whether `interval` belongs to the legal set for `kind`.
pub fn is_legal(kind: RuleKind, interval: u32) -> bool {
    match kind {
        RuleKind::OnceDaily => interval == FULL_DAY_MINUTES,
        RuleKind::Hourly => interval > 0 && interval % 60 == 0,
        RuleKind::Interval => {
            HOUR_DIVISORS.contains(&interval)
                || (interval % 60 == 0 && interval >= 60 && interval <= INTERVAL_CEILING_MINUTES)
        }
    }
}

/// The full legal set for `kind`, ascending. Hourly multiples are reported
/// up to the same ceiling as interval rules.
pub fn legal_set(kind: RuleKind) -> Vec<u32> {
    match kind {
        RuleKind::OnceDaily => vec![FULL_DAY_MINUTES],
        RuleKind::Hourly => (1..=INTERVAL_CEILING_MINUTES / 60).map(|n| n * 60).collect(),
        RuleKind::Interval => {
            let mut set: Vec<u32> = HOUR_DIVISORS.to_vec();
            set.extend((1..=INTERVAL_CEILING_MINUTES / 60).map(|n| n * 60));
            set
        }
    }
}

/// Map an out-of-range interval to the closest legal value for `kind`.
///
/// Ties break toward the smaller candidate (first encountered scanning the
/// legal set in ascending order). This is a suggestion helper for UI
/// correction; construction itself never clamps.
pub fn nearest_legal(kind: RuleKind, interval: u32) -> u32 {
    match kind {
        RuleKind::OnceDaily => FULL_DAY_MINUTES,
        RuleKind::Hourly => {
            if interval <= 60 {
                return 60;
            }
            let lower = interval / 60 * 60;
            let upper = lower + 60;
            if interval - lower <= upper - interval {
                lower
            } else {
                upper
            }
        }
        RuleKind::Interval => {
            let mut best = 0u32;
            let mut best_diff = u32::MAX;
            for candidate in legal_set(RuleKind::Interval) {
                let diff = candidate.abs_diff(interval);
                if diff < best_diff {
                    best = candidate;
                    best_diff = diff;
                }
            }
            best
        }
    }
}

fn legal_set_description(kind: RuleKind) -> String {
    match kind {
        RuleKind::OnceDaily => "1440 (whole day)".to_string(),
        RuleKind::Hourly => "any positive multiple of 60".to_string(),
        RuleKind::Interval => format!(
            "divisors of 60 or multiples of 60 up to {INTERVAL_CEILING_MINUTES}"
        ),
    }
}
