use crate::{Error, Result};
use core::time::Duration;

/// Default capacity of the producer-facing intake buffer.
pub const DEFAULT_INTAKE_CAPACITY: usize = 256;
/// Default capacity of the worker-facing dispatch queue.
pub const DEFAULT_DISPATCH_CAPACITY: usize = 2048;
/// Default number of concurrent announce workers.
pub const DEFAULT_NUM_WORKERS: usize = 512;
/// Default upper bound on a single announce call.
pub const DEFAULT_ANNOUNCE_TIMEOUT: Duration = Duration::from_secs(15);

pub const LOW_RESOURCE_INTAKE_CAPACITY: usize = 64;
pub const LOW_RESOURCE_DISPATCH_CAPACITY: usize = 512;
pub const LOW_RESOURCE_NUM_WORKERS: usize = 16;

/// Named sizing presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Preset {
    /// Sized for a regular node.
    #[default]
    Standard,
    /// Smaller buffers and far fewer workers, for memory-constrained hosts.
    LowResource,
}

/// Sizing of an [`Announcer`](crate::Announcer).
///
/// Every value is fixed once the announcer is constructed. Start from a
/// preset and override individual values with the `with_*` setters:
///
/// ```
/// use announce::AnnounceConfig;
/// use core::time::Duration;
///
/// let config = AnnounceConfig::low_resource()
///     .with_num_workers(4)
///     .with_announce_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.intake_capacity, 64);
/// assert_eq!(config.num_workers, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnounceConfig {
    /// Capacity of the intake buffer that [`provide`](crate::Announcer::provide)
    /// writes into.
    pub intake_capacity: usize,
    /// Capacity of the dispatch queue that workers claim from.
    pub dispatch_capacity: usize,
    /// Number of workers, which is also the cap on concurrent announce calls.
    pub num_workers: usize,
    /// Timeout applied to each announce call.
    pub announce_timeout: Duration,
}

impl AnnounceConfig {
    pub const fn standard() -> Self {
        Self {
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
            num_workers: DEFAULT_NUM_WORKERS,
            announce_timeout: DEFAULT_ANNOUNCE_TIMEOUT,
        }
    }

    pub const fn low_resource() -> Self {
        Self {
            intake_capacity: LOW_RESOURCE_INTAKE_CAPACITY,
            dispatch_capacity: LOW_RESOURCE_DISPATCH_CAPACITY,
            num_workers: LOW_RESOURCE_NUM_WORKERS,
            announce_timeout: DEFAULT_ANNOUNCE_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_intake_capacity(mut self, capacity: usize) -> Self {
        self.intake_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_dispatch_capacity(mut self, capacity: usize) -> Self {
        self.dispatch_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    #[must_use]
    pub const fn with_announce_timeout(mut self, timeout: Duration) -> Self {
        self.announce_timeout = timeout;
        self
    }

    /// Checks that the configuration can produce a working pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a capacity, the worker count or the
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.intake_capacity == 0 {
            return Err(invalid("intake capacity must be greater than 0"));
        }
        if self.dispatch_capacity == 0 {
            return Err(invalid("dispatch capacity must be greater than 0"));
        }
        if self.num_workers == 0 {
            return Err(invalid("worker count must be greater than 0"));
        }
        if self.announce_timeout.is_zero() {
            return Err(invalid("announce timeout must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Preset> for AnnounceConfig {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Standard => Self::standard(),
            Preset::LowResource => Self::low_resource(),
        }
    }
}

fn invalid(reason: &str) -> Error {
    Error::InvalidConfig {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_documented_sizes() {
        let standard = AnnounceConfig::from(Preset::Standard);
        assert_eq!(standard, AnnounceConfig::default());
        assert_eq!(standard.intake_capacity, 256);
        assert_eq!(standard.dispatch_capacity, 2048);
        assert_eq!(standard.num_workers, 512);
        assert_eq!(standard.announce_timeout, Duration::from_secs(15));

        let low = AnnounceConfig::from(Preset::LowResource);
        assert_eq!(low.intake_capacity, 64);
        assert_eq!(low.dispatch_capacity, 512);
        assert_eq!(low.num_workers, 16);
        assert_eq!(low.announce_timeout, Duration::from_secs(15));
    }

    #[test]
    fn rejects_zero_values() {
        let base = AnnounceConfig::standard();
        for config in [
            base.clone().with_intake_capacity(0),
            base.clone().with_dispatch_capacity(0),
            base.clone().with_num_workers(0),
            base.clone().with_announce_timeout(Duration::ZERO),
        ] {
            assert!(matches!(
                config.validate(),
                Err(Error::InvalidConfig { .. })
            ));
        }
        assert!(base.validate().is_ok());
    }
}
