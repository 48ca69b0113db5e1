//! Connection registry configuration

use std::time::Duration;

/// Configuration for the connection registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Interval between cleanup passes that drop users with no connections
    pub cleanup_interval: Duration,

    /// Maximum live connections per user (0 = unlimited)
    pub max_connections_per_user: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60),
            max_connections_per_user: 0, // Unlimited
        }
    }
}

impl RegistryConfig {
    /// Set the cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Set the per-user connection limit
    pub fn max_connections_per_user(mut self, max: usize) -> Self {
        self.max_connections_per_user = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert_eq!(config.max_connections_per_user, 0);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .cleanup_interval(Duration::from_millis(250))
            .max_connections_per_user(4);

        assert_eq!(config.cleanup_interval, Duration::from_millis(250));
        assert_eq!(config.max_connections_per_user, 4);
    }
}
