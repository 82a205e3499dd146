use std::{ops::RangeInclusive, time::Duration};

use crate::error::ClientIdError;

pub const DEFAULT_INDEX_SIZE: usize = 17;
pub const DEFAULT_EXPIRATION_SECS: u64 = 3600;

const INDEX_SIZE_RANGE: RangeInclusive<usize> = 1..=51;
const EXPIRATION_RANGE: RangeInclusive<u64> = 1..=86_400;

/// Resolved address cache parameters, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Number of store partitions; must be prime
    pub index_size: usize,
    /// Age after which an entry is treated as absent
    pub expiration_time: Duration,
    /// Period of the optional background sweep; `None` keeps expiration lazy
    pub reap_interval: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            index_size: DEFAULT_INDEX_SIZE,
            expiration_time: Duration::from_secs(DEFAULT_EXPIRATION_SECS),
            reap_interval: None,
        }
    }
}

impl CacheSettings {
    /// Check every value against its allowed range
    pub fn validate(&self) -> Result<(), ClientIdError> {
        if !INDEX_SIZE_RANGE.contains(&self.index_size) {
            return Err(ClientIdError::InvalidConfig {
                key: "index_size",
                reason: format!(
                    "{} is outside {}..={}",
                    self.index_size,
                    INDEX_SIZE_RANGE.start(),
                    INDEX_SIZE_RANGE.end()
                ),
            });
        }
        if !is_prime(self.index_size) {
            return Err(ClientIdError::InvalidConfig {
                key: "index_size",
                reason: format!("{} is not a prime", self.index_size),
            });
        }

        let secs = self.expiration_time.as_secs();
        if !EXPIRATION_RANGE.contains(&secs) || self.expiration_time.subsec_nanos() != 0 {
            return Err(ClientIdError::InvalidConfig {
                key: "expiration_time",
                reason: format!(
                    "{:?} is not a whole number of seconds in {}..={}",
                    self.expiration_time,
                    EXPIRATION_RANGE.start(),
                    EXPIRATION_RANGE.end()
                ),
            });
        }

        if self.reap_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(ClientIdError::InvalidConfig {
                key: "reap_interval",
                reason: "must be at least one second".to_string(),
            });
        }

        Ok(())
    }
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        let settings = CacheSettings::default();
        assert_eq!(settings.index_size, 17);
        assert_eq!(settings.expiration_time, Duration::from_secs(3600));
        assert!(settings.validate().is_ok());
    }

    #[rstest]
    #[case(2, true)]
    #[case(3, true)]
    #[case(17, true)]
    #[case(47, true)]
    #[case(1, false)]
    #[case(0, false)]
    #[case(9, false)]
    #[case(49, false)]
    #[case(51, false)]
    fn primality(#[case] n: usize, #[case] expected: bool) {
        assert_eq!(is_prime(n), expected);
    }

    #[rstest]
    #[case(1, "index_size")]
    #[case(16, "index_size")]
    #[case(53, "index_size")]
    fn rejects_bad_index_size(#[case] index_size: usize, #[case] key: &str) {
        let settings = CacheSettings {
            index_size,
            ..Default::default()
        };
        match settings.validate() {
            Err(ClientIdError::InvalidConfig { key: k, .. }) => assert_eq!(k, key),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[rstest]
    #[case(Duration::ZERO)]
    #[case(Duration::from_secs(86_401))]
    #[case(Duration::from_millis(1500))]
    fn rejects_bad_expiration(#[case] expiration_time: Duration) {
        let settings = CacheSettings {
            expiration_time,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClientIdError::InvalidConfig {
                key: "expiration_time",
                ..
            })
        ));
    }

    #[test]
    fn accepts_range_edges() {
        for secs in [1, 86_400] {
            let settings = CacheSettings {
                index_size: 47,
                expiration_time: Duration::from_secs(secs),
                reap_interval: Some(Duration::from_secs(60)),
            };
            assert!(settings.validate().is_ok());
        }
    }

    #[test]
    fn rejects_zero_reap_interval() {
        let settings = CacheSettings {
            reap_interval: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClientIdError::InvalidConfig {
                key: "reap_interval",
                ..
            })
        ));
    }
}
