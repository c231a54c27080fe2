//! Retention policy engine
//!
//! Policies are pure functions over a chain's restore points, oldest first.
//! They decide how many of the oldest points may go; the chain decides how to
//! remove them safely.
//!
//! # Policies
//!
//! - `BySize`: keep the newest points that fit in a byte budget
//! - `ByNumber`: keep at most N points
//! - `ByTime`: keep points within a period of the newest one
//! - `Hybrid`: combine sub-policies with `any` (maximum) or `all` (minimum)
//!
//! # Example
//!
//! ```rust,ignore
//! use backups::retention::{CombinationRule, RetentionPolicy};
//!
//! let policy = RetentionPolicy::hybrid(
//!     CombinationRule::All,
//!     vec![RetentionPolicy::by_size(10 * 1024 * 1024), RetentionPolicy::by_number(5)],
//! )?;
//! let removable = policy.bad_prefix_size(backup.restore_points());
//! ```

mod policy;
mod rule;

pub use policy::RetentionPolicy;
pub use rule::CombinationRule;
