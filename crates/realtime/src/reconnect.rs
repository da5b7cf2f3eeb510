//! Rejoin schedule for the stories change feed.
//!
//! A dropped socket, or a first join the server refused, leaves the
//! subscription without a channel. [`reconnect_loop`] dials and rejoins on a
//! growing delay until a join is acknowledged or the subscription is closed.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{RealtimeClient, RealtimeConnection};

/// Delay schedule between rejoin attempts.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Wait before the first rejoin.
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Growth factor applied after every failed attempt.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    /// 1s, doubling, capped at 30s.
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// The endless sequence of waits, starting at `initial_delay`.
    pub fn delays(&self) -> Backoff {
        Backoff {
            next: self.initial_delay.min(self.max_delay),
            max: self.max_delay,
            multiplier: self.multiplier,
        }
    }
}

/// Iterator over rejoin waits. Never ends; holds at the cap once reached.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    multiplier: f64,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = current.mul_f64(self.multiplier).min(self.max);
        Some(current)
    }
}

/// Dial and rejoin the channel until it is joined or `cancel` fires.
///
/// Every attempt waits its scheduled delay first, including the first one,
/// so a server that drops sockets right after accepting them is not
/// hammered. Returns `None` only on cancellation.
pub async fn reconnect_loop(
    client: &RealtimeClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<RealtimeConnection> {
    for (attempt, wait) in (1u32..).zip(config.delays()) {
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(wait) => {}
        }

        tracing::debug!(attempt, wait_ms = wait.as_millis() as u64, "Rejoining stories channel");

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(attempt, "Stories channel rejoin abandoned");
                return None;
            }
            result = client.connect() => result,
        };

        match result {
            Ok(conn) => {
                tracing::info!(attempt, topic = %conn.topic, "Stories channel rejoined");
                return Some(conn);
            }
            Err(e) => tracing::warn!(attempt, error = %e, "Stories channel rejoin failed"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChannelConfig;

    fn unreachable_client() -> RealtimeClient {
        RealtimeClient::new("http://127.0.0.1:9", "anon", ChannelConfig::stories())
    }

    #[test]
    fn default_schedule_reaches_thirty_second_ceiling() {
        let waits: Vec<u64> = ReconnectConfig::default()
            .delays()
            .take(8)
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(waits, vec![1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn initial_delay_above_cap_is_clamped() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(45),
            ..Default::default()
        };
        assert_eq!(config.delays().next(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn sub_second_schedule_keeps_millisecond_precision() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            multiplier: 1.5,
        };
        let waits: Vec<u128> = config.delays().take(5).map(|d| d.as_millis()).collect();
        assert_eq!(waits, vec![10, 15, 22, 33, 50]);
    }

    #[tokio::test]
    async fn closed_subscription_never_dials() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let conn = reconnect_loop(&unreachable_client(), &ReconnectConfig::default(), &cancel).await;
        assert!(conn.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn close_during_wait_ends_rejoin() {
        let cancel = CancellationToken::new();
        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                reconnect_loop(&unreachable_client(), &ReconnectConfig::default(), &cancel)
                    .await
                    .is_none()
            }
        });

        // Still inside the one-second wait before the first attempt.
        tokio::time::sleep(Duration::from_millis(400)).await;
        cancel.cancel();

        assert!(task.await.unwrap());
    }
}
