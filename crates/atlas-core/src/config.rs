//! Registry sizing.

use crate::error::ConfigError;
use crate::pool::MAX_SLOTS;

/// Slot count used by `RegistryConfig::default`.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Sizing of a registry's slot pool and index.
///
/// `initial_capacity` slots are allocated up front. With `max_capacity`
/// unset the pool grows by doubling whenever every slot is live; with it
/// set, `add` fails with `CapacityExhausted` once that many orders are live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegistryConfig {
    pub initial_capacity: usize,
    pub max_capacity: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: None,
        }
    }
}

impl RegistryConfig {
    /// Fixed-size pool: every slot allocated up front, no growth.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            initial_capacity: capacity,
            max_capacity: Some(capacity),
        }
    }

    /// Growable pool starting at `initial_capacity` slots.
    pub fn growable(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            max_capacity: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity > MAX_SLOTS {
            return Err(ConfigError::CapacityTooLarge {
                requested: self.initial_capacity,
                limit: MAX_SLOTS,
            });
        }

        if let Some(max) = self.max_capacity {
            if max == 0 {
                return Err(ConfigError::ZeroMaxCapacity);
            }
            if max > MAX_SLOTS {
                return Err(ConfigError::CapacityTooLarge { requested: max, limit: MAX_SLOTS });
            }
            if self.initial_capacity > max {
                return Err(ConfigError::InitialExceedsMax {
                    initial: self.initial_capacity,
                    max,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RegistryConfig::default().validate().is_ok());
        assert!(RegistryConfig::bounded(16).validate().is_ok());
        assert!(RegistryConfig::growable(0).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert_eq!(
            RegistryConfig::bounded(0).validate(),
            Err(ConfigError::ZeroMaxCapacity)
        );

        let config = RegistryConfig { initial_capacity: 32, max_capacity: Some(8) };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InitialExceedsMax { initial: 32, max: 8 })
        );

        let config = RegistryConfig::growable(MAX_SLOTS + 1);
        assert!(matches!(config.validate(), Err(ConfigError::CapacityTooLarge { .. })));
    }
}
