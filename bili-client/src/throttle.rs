use insight_core::CrawlSettings;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// Courtesy delays inserted between outbound requests.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub search_delay_min: Duration,
    pub search_delay_max: Duration,
    pub video_delay: Duration,
    pub warmup_delay: Duration,
}

impl ThrottleConfig {
    pub fn bilibili() -> Self {
        Self::from(&CrawlSettings::default())
    }

    /// No waiting at all; for tests and replaying fixtures.
    pub fn disabled() -> Self {
        Self {
            search_delay_min: Duration::ZERO,
            search_delay_max: Duration::ZERO,
            video_delay: Duration::ZERO,
            warmup_delay: Duration::ZERO,
        }
    }
}

impl From<&CrawlSettings> for ThrottleConfig {
    fn from(settings: &CrawlSettings) -> Self {
        Self {
            search_delay_min: Duration::from_millis(settings.search_delay_min_ms),
            search_delay_max: Duration::from_millis(settings.search_delay_max_ms),
            video_delay: Duration::from_millis(settings.video_delay_ms),
            warmup_delay: Duration::from_millis(settings.warmup_delay_ms),
        }
    }
}

#[derive(Debug)]
pub struct Throttle {
    config: ThrottleConfig,
    waited_ms: AtomicU64,
}

impl Throttle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            waited_ms: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// A delay drawn uniformly from the configured search range.
    pub fn search_delay(&self) -> Duration {
        let min = self.config.search_delay_min.as_millis() as u64;
        let max = self.config.search_delay_max.as_millis() as u64;
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(fastrand::u64(min..=max))
    }

    pub async fn before_search_page(&self) {
        let delay = self.search_delay();
        self.pause(delay).await;
    }

    pub async fn between_videos(&self) {
        self.pause(self.config.video_delay).await;
    }

    pub async fn after_warmup(&self) {
        self.pause(self.config.warmup_delay).await;
    }

    /// Total time spent sleeping so far.
    pub fn total_wait(&self) -> Duration {
        Duration::from_millis(self.waited_ms.load(Ordering::Relaxed))
    }

    pub async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tracing::debug!("Throttling for {:?}", delay);
        self.waited_ms
            .fetch_add(delay.as_millis() as u64, Ordering::Relaxed);
        sleep(delay).await;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(ThrottleConfig::bilibili())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_delay_stays_in_range() {
        let throttle = Throttle::default();
        for _ in 0..200 {
            let delay = throttle.search_delay();
            assert!(delay >= Duration::from_millis(1500));
            assert!(delay <= Duration::from_millis(3000));
        }
    }

    #[test]
    fn test_degenerate_range_uses_minimum() {
        let throttle = Throttle::new(ThrottleConfig {
            search_delay_min: Duration::from_millis(40),
            search_delay_max: Duration::from_millis(40),
            ..ThrottleConfig::disabled()
        });
        assert_eq!(throttle.search_delay(), Duration::from_millis(40));
    }

    #[test]
    fn test_config_from_settings() {
        let settings = CrawlSettings {
            video_delay_ms: 250,
            ..CrawlSettings::default()
        };
        let config = ThrottleConfig::from(&settings);
        assert_eq!(config.video_delay, Duration::from_millis(250));
        assert_eq!(config.search_delay_min, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_disabled_throttle_never_waits() {
        let throttle = Throttle::new(ThrottleConfig::disabled());
        throttle.before_search_page().await;
        throttle.pause(Duration::ZERO).await;
        throttle.between_videos().await;
        assert_eq!(throttle.total_wait(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_waits_are_accounted() {
        let throttle = Throttle::new(ThrottleConfig {
            video_delay: Duration::from_millis(5),
            ..ThrottleConfig::disabled()
        });
        throttle.between_videos().await;
        throttle.between_videos().await;
        assert_eq!(throttle.total_wait(), Duration::from_millis(10));
    }
}
