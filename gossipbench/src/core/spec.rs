//! Rate specifications for dispatch runs

use super::{ConfigError, Rate};
use std::time::Duration;

/// How fast and for how long a dispatch run issues requests
///
/// # Example
///
/// ```
/// use gossipbench::RateSpec;
/// use std::time::Duration;
///
/// let window = RateSpec::Window { duration: Duration::from_secs(60), budget: 150 };
/// assert_eq!(window.gap(), Some(Duration::from_millis(400)));
/// assert_eq!(window.limit(), Some(150));
///
/// let fixed = RateSpec::Count { count: 1_000 };
/// assert_eq!(fixed.gap(), None);
/// assert_eq!(fixed.limit(), Some(1_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSpec {
    /// Spread `budget` requests evenly over `duration`, then stop
    Window { duration: Duration, budget: u64 },
    /// Issue exactly `count` requests with no delay between them
    Count { count: u64 },
    /// Repeat a `budget`-over-`window` schedule until cancelled
    Unbounded { window: Duration, budget: u64 },
}

impl RateSpec {
    /// Check that the spec describes a run that can make progress
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            RateSpec::Window { duration, budget }
            | RateSpec::Unbounded {
                window: duration,
                budget,
            } => {
                if duration.is_zero() {
                    return Err(ConfigError::ZeroDuration);
                }
                if budget == 0 {
                    return Err(ConfigError::ZeroBudget);
                }
                Ok(())
            }
            RateSpec::Count { count } => {
                if count == 0 {
                    return Err(ConfigError::ZeroCount);
                }
                Ok(())
            }
        }
    }

    /// Pacing rate, if the spec is paced at all
    pub fn rate(&self) -> Option<Rate> {
        match *self {
            RateSpec::Window { duration, budget }
            | RateSpec::Unbounded {
                window: duration,
                budget,
            } => Some(Rate::from_budget(budget, duration)),
            RateSpec::Count { .. } => None,
        }
    }

    /// Target gap between consecutive requests in aggregate
    pub fn gap(&self) -> Option<Duration> {
        self.rate().map(|rate| rate.period())
    }

    /// Total number of requests the run may issue, if bounded
    pub fn limit(&self) -> Option<u64> {
        match *self {
            RateSpec::Window { budget, .. } => Some(budget),
            RateSpec::Count { count } => Some(count),
            RateSpec::Unbounded { .. } => None,
        }
    }

    /// Wall-clock bound of the run, if any
    pub fn deadline(&self) -> Option<Duration> {
        match *self {
            RateSpec::Window { duration, .. } => Some(duration),
            _ => None,
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            RateSpec::Window { .. } => "window",
            RateSpec::Count { .. } => "count",
            RateSpec::Unbounded { .. } => "unbounded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero_values() {
        assert_eq!(
            RateSpec::Window {
                duration: Duration::ZERO,
                budget: 10
            }
            .validate(),
            Err(ConfigError::ZeroDuration)
        );
        assert_eq!(
            RateSpec::Unbounded {
                window: Duration::from_secs(1),
                budget: 0
            }
            .validate(),
            Err(ConfigError::ZeroBudget)
        );
        assert_eq!(
            RateSpec::Count { count: 0 }.validate(),
            Err(ConfigError::ZeroCount)
        );
        assert!(RateSpec::Count { count: 1 }.validate().is_ok());
    }

    #[test]
    fn test_bounds() {
        let unbounded = RateSpec::Unbounded {
            window: Duration::from_secs(60),
            budget: 600,
        };
        assert_eq!(unbounded.limit(), None);
        assert_eq!(unbounded.deadline(), None);
        assert_eq!(unbounded.gap(), Some(Duration::from_millis(100)));

        let window = RateSpec::Window {
            duration: Duration::from_secs(2),
            budget: 4,
        };
        assert_eq!(window.deadline(), Some(Duration::from_secs(2)));
        assert_eq!(window.gap(), Some(Duration::from_millis(500)));
        assert_eq!(window.kind(), "window");
    }
}
