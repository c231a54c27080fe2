//! Combination rules for hybrid retention policies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BackupError;

/// How a hybrid policy folds the verdicts of its sub-policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationRule {
    /// Delete as much as the most eager sub-policy asks for (maximum)
    Any,
    /// Delete only what every sub-policy agrees on (minimum)
    All,
}

impl CombinationRule {
    /// Fold a set of bad-prefix sizes according to this rule
    ///
    /// Returns `None` for an empty input.
    pub fn combine(&self, sizes: impl IntoIterator<Item = usize>) -> Option<usize> {
        let sizes = sizes.into_iter();
        match self {
            Self::Any => sizes.max(),
            Self::All => sizes.min(),
        }
    }
}

impl fmt::Display for CombinationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::All => write!(f, "all"),
        }
    }
}

impl FromStr for CombinationRule {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            other => Err(BackupError::InvalidArgument(format!(
                "Unsupported combination rule '{}', expected 'any' or 'all'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine() {
        assert_eq!(CombinationRule::Any.combine([1, 4, 2]), Some(4));
        assert_eq!(CombinationRule::All.combine([1, 4, 2]), Some(1));
        assert_eq!(CombinationRule::All.combine(Vec::new()), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("ANY".parse::<CombinationRule>().unwrap(), CombinationRule::Any);
        assert_eq!("all".parse::<CombinationRule>().unwrap(), CombinationRule::All);

        let err = "some".parse::<CombinationRule>().unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
