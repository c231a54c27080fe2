//! Retention policies over a restore point sequence
//!
//! Every policy answers one question: how many of the oldest restore points
//! may be discarded right now. That count is the "bad prefix" of the sequence.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::rule::CombinationRule;
use crate::error::{BackupError, BackupResult};
use crate::models::RestorePoint;

/// A retention policy attached to a backup chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep the newest points whose sizes add up to at most `limit` bytes
    BySize { limit: u64 },

    /// Keep at most `limit` points
    ByNumber { limit: usize },

    /// Keep points no older than `period` relative to the newest point
    ByTime {
        #[serde(rename = "period_secs", with = "period_secs")]
        period: Duration,
    },

    /// Combine several policies under a rule
    Hybrid {
        rule: CombinationRule,
        policies: Vec<RetentionPolicy>,
    },
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl RetentionPolicy {
    /// A policy that never discards anything
    pub fn unlimited() -> Self {
        Self::BySize { limit: u64::MAX }
    }

    /// Limit the cumulative size of the retained points
    pub fn by_size(limit: u64) -> Self {
        Self::BySize { limit }
    }

    /// Limit the number of retained points
    pub fn by_number(limit: usize) -> Self {
        Self::ByNumber { limit }
    }

    /// Limit the age of retained points
    pub fn by_time(period: Duration) -> Self {
        Self::ByTime { period }
    }

    /// Combine sub-policies under `rule`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `policies` is empty.
    pub fn hybrid(rule: CombinationRule, policies: Vec<RetentionPolicy>) -> BackupResult<Self> {
        let policy = Self::Hybrid { rule, policies };
        policy.validate()?;
        Ok(policy)
    }

    /// Check the structural constraints that the type system cannot express
    pub fn validate(&self) -> BackupResult<()> {
        match self {
            Self::BySize { .. } | Self::ByNumber { .. } => Ok(()),
            Self::ByTime { period } => {
                if *period < Duration::zero() {
                    return Err(BackupError::InvalidArgument(
                        "Retention period cannot be negative".into(),
                    ));
                }
                Ok(())
            }
            Self::Hybrid { policies, .. } => {
                if policies.is_empty() {
                    return Err(BackupError::InvalidArgument(
                        "Hybrid retention policy needs at least one sub-policy".into(),
                    ));
                }
                policies.iter().try_for_each(|policy| policy.validate())
            }
        }
    }

    /// Number of oldest restore points this policy considers removable
    ///
    /// `points` must be ordered oldest first. The result never exceeds
    /// `points.len()`; callers that must keep a point cap it further.
    pub fn bad_prefix_size(&self, points: &[RestorePoint]) -> usize {
        match self {
            Self::BySize { limit } => bad_prefix_by_size(points, *limit),
            Self::ByNumber { limit } => points.len().saturating_sub(*limit),
            Self::ByTime { period } => bad_prefix_by_time(points, *period),
            Self::Hybrid { rule, policies } => rule
                .combine(policies.iter().map(|policy| policy.bad_prefix_size(points)))
                .unwrap_or(0),
        }
    }
}

/// Everything older than the longest newest-first suffix that fits in `limit`
///
/// The newest point is always retained, even when it alone exceeds the limit.
fn bad_prefix_by_size(points: &[RestorePoint], limit: u64) -> usize {
    let mut suffix_size: u64 = 0;
    for (index, point) in points.iter().enumerate().rev() {
        suffix_size = suffix_size.saturating_add(point.size);
        if suffix_size > limit {
            return (index + 1).min(points.len() - 1);
        }
    }
    0
}

/// Points strictly older than the newest point's creation time minus `period`
fn bad_prefix_by_time(points: &[RestorePoint], period: Duration) -> usize {
    let Some(newest) = points.last() else {
        return 0;
    };
    let Some(cutoff) = newest.created_at.checked_sub_signed(period) else {
        return 0;
    };

    points
        .iter()
        .rposition(|point| point.created_at < cutoff)
        .map_or(0, |index| index + 1)
}

fn fmt_limit<T: fmt::Display + PartialEq>(value: &T, unbounded: T) -> String {
    if *value == unbounded {
        "unlimited".to_string()
    } else {
        value.to_string()
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BySize { limit } => write!(f, "[by size: {}]", fmt_limit(limit, u64::MAX)),
            Self::ByNumber { limit } => {
                write!(f, "[by number: {}]", fmt_limit(limit, usize::MAX))
            }
            Self::ByTime { period } => write!(f, "[by time: {}s]", period.num_seconds()),
            Self::Hybrid { rule, policies } => {
                write!(f, "[{} of: ", rule)?;
                for (i, policy) in policies.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", policy)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Serialize a `chrono::Duration` as whole seconds
mod period_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(period: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(period.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("period out of range: {}s", secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RestorePointId;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    /// Build a sequence from (minutes after base, size) pairs, oldest first
    fn points(layout: &[(i64, u64)]) -> Vec<RestorePoint> {
        layout.iter()
            .enumerate()
            .map(|(i, &(minutes, size))| {
                RestorePoint::new(
                    RestorePointId::new(i as u64),
                    base_time() + Duration::minutes(minutes),
                    PathBuf::from(format!("/store/{}", i)),
                    i > 0,
                    BTreeSet::new(),
                    size,
                )
            })
            .collect()
    }

    #[test]
    fn test_default_is_unlimited() {
        let policy = RetentionPolicy::default();
        let seq = points(&[(0, u64::MAX / 2), (1, u64::MAX / 2), (2, 10)]);
        assert_eq!(policy.bad_prefix_size(&seq), 0);
        assert_eq!(policy.to_string(), "[by size: unlimited]");
    }

    #[test]
    fn test_empty_sequence() {
        let seq = points(&[]);
        assert_eq!(RetentionPolicy::by_size(0).bad_prefix_size(&seq), 0);
        assert_eq!(RetentionPolicy::by_number(0).bad_prefix_size(&seq), 0);
        assert_eq!(
            RetentionPolicy::by_time(Duration::zero()).bad_prefix_size(&seq),
            0
        );
    }

    #[test]
    fn test_by_size() {
        let seq = points(&[(0, 100), (1, 100), (2, 100), (3, 100)]);

        // Newest three fit exactly, the oldest does not
        assert_eq!(RetentionPolicy::by_size(300).bad_prefix_size(&seq), 1);
        assert_eq!(RetentionPolicy::by_size(299).bad_prefix_size(&seq), 2);
        assert_eq!(RetentionPolicy::by_size(400).bad_prefix_size(&seq), 0);
    }

    #[test]
    fn test_by_size_keeps_oversized_newest_point() {
        let seq = points(&[(0, 10), (1, 10), (2, 500)]);
        assert_eq!(RetentionPolicy::by_size(100).bad_prefix_size(&seq), 2);

        let single = points(&[(0, 500)]);
        assert_eq!(RetentionPolicy::by_size(100).bad_prefix_size(&single), 0);
    }

    #[test]
    fn test_by_number() {
        for len in 0..8usize {
            let layout: Vec<(i64, u64)> = (0..len as i64).map(|i| (i, 1)).collect();
            let seq = points(&layout);
            for limit in 0..8usize {
                assert_eq!(
                    RetentionPolicy::by_number(limit).bad_prefix_size(&seq),
                    len.saturating_sub(limit),
                    "len {} limit {}",
                    len,
                    limit
                );
            }
        }
    }

    #[test]
    fn test_by_time() {
        let seq = points(&[(0, 1), (30, 1), (60, 1), (90, 1), (120, 1)]);

        // Cutoff is minute 60; only strictly older points are bad
        let policy = RetentionPolicy::by_time(Duration::minutes(60));
        assert_eq!(policy.bad_prefix_size(&seq), 2);

        let policy = RetentionPolicy::by_time(Duration::minutes(61));
        assert_eq!(policy.bad_prefix_size(&seq), 2);

        let policy = RetentionPolicy::by_time(Duration::minutes(59));
        assert_eq!(policy.bad_prefix_size(&seq), 3);
    }

    #[test]
    fn test_by_time_all_but_newest_expired() {
        let seq = points(&[(0, 1), (1, 1), (2, 1), (180, 1)]);
        let policy = RetentionPolicy::by_time(Duration::hours(1));
        assert_eq!(policy.bad_prefix_size(&seq), seq.len() - 1);
    }

    #[test]
    fn test_hybrid_any_and_all() {
        let seq = points(&[(0, 100), (1, 100), (2, 100), (3, 100), (4, 100)]);
        let size = RetentionPolicy::by_size(250); // bad prefix 3
        let number = RetentionPolicy::by_number(4); // bad prefix 1
        assert_eq!(size.bad_prefix_size(&seq), 3);
        assert_eq!(number.bad_prefix_size(&seq), 1);

        let any = RetentionPolicy::hybrid(CombinationRule::Any, vec![size.clone(), number.clone()])
            .unwrap();
        assert_eq!(any.bad_prefix_size(&seq), 3);

        let all = RetentionPolicy::hybrid(CombinationRule::All, vec![size, number]).unwrap();
        assert_eq!(all.bad_prefix_size(&seq), 1);
    }

    #[test]
    fn test_hybrid_requires_sub_policies() {
        let err = RetentionPolicy::hybrid(CombinationRule::Any, Vec::new()).unwrap_err();
        assert!(err.is_invalid_argument());

        // Nested empty hybrids are caught too
        let nested = RetentionPolicy::Hybrid {
            rule: CombinationRule::All,
            policies: vec![RetentionPolicy::Hybrid {
                rule: CombinationRule::Any,
                policies: Vec::new(),
            }],
        };
        assert!(nested.validate().is_err());
    }

    #[test]
    fn test_negative_period_rejected() {
        let policy = RetentionPolicy::by_time(Duration::seconds(-5));
        assert!(policy.validate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(RetentionPolicy::by_size(1024).to_string(), "[by size: 1024]");
        assert_eq!(RetentionPolicy::by_number(3).to_string(), "[by number: 3]");
        assert_eq!(
            RetentionPolicy::by_time(Duration::hours(1)).to_string(),
            "[by time: 3600s]"
        );

        let hybrid = RetentionPolicy::hybrid(
            CombinationRule::All,
            vec![RetentionPolicy::by_size(10), RetentionPolicy::by_number(2)],
        )
        .unwrap();
        assert_eq!(hybrid.to_string(), "[all of: [by size: 10], [by number: 2]]");
    }

    #[test]
    fn test_serde_shape() {
        let policy = RetentionPolicy::hybrid(
            CombinationRule::Any,
            vec![
                RetentionPolicy::by_number(5),
                RetentionPolicy::by_time(Duration::hours(2)),
            ],
        )
        .unwrap();

        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["kind"], "hybrid");
        assert_eq!(json["rule"], "any");
        assert_eq!(json["policies"][0]["kind"], "by_number");
        assert_eq!(json["policies"][1]["period_secs"], 7200);

        let back: RetentionPolicy = serde_json::from_value(json).unwrap();
        assert_eq!(back, policy);
    }
}
