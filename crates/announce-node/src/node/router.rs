use announce::{CancellationToken, ContentKey, ContentRouter, RouterError};
use core::time::Duration;
use portable_atomic::{AtomicU64, Ordering};

/// Stand-in for a routing overlay.
///
/// Every announce takes `latency` and, when `fail_every` is non-zero, every
/// `fail_every`-th announce fails. Honours cancellation so that shutdown does
/// not wait out the latency.
pub struct SimulatedRouter {
    latency: Duration,
    fail_every: u64,
    calls: AtomicU64,
}

impl SimulatedRouter {
    pub const fn new(latency: Duration, fail_every: u64) -> Self {
        Self {
            latency,
            fail_every,
            calls: AtomicU64::new(0),
        }
    }
}

impl ContentRouter<ContentKey> for SimulatedRouter {
    #[tracing::instrument(level = "trace", skip_all, fields(key = %key))]
    async fn announce(
        &self,
        key: &ContentKey,
        cancel: CancellationToken,
    ) -> Result<(), RouterError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;

        tokio::select! {
            () = cancel.cancelled() => return Err("announce cancelled".into()),
            () = tokio::time::sleep(self.latency) => {}
        }

        if self.fail_every > 0 && call % self.fail_every == 0 {
            return Err(format!("simulated routing failure for {key}").into());
        }

        tracing::debug!("Announced {key}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fails_every_nth_call() {
        let router = SimulatedRouter::new(Duration::ZERO, 3);
        let key = ContentKey::from(&b"k"[..]);

        let mut results = Vec::new();
        for _ in 0..6 {
            results.push(router.announce(&key, CancellationToken::new()).await.is_ok());
        }
        assert_eq!(results, [true, true, false, true, true, false]);
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let router = SimulatedRouter::new(Duration::from_secs(60), 0);
        let key = ContentKey::from(&b"k"[..]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let res = tokio::time::timeout(Duration::from_secs(1), router.announce(&key, cancel))
            .await
            .expect("cancelled announce must return promptly");
        assert!(res.is_err());
    }
}
