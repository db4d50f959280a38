use announce::{Announcer, ContentKey, Error};
use core::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Feeds hex-encoded keys, one per line, into the announcer.
///
/// Blank lines and lines starting with `#` are skipped, as are lines that do
/// not decode. Stops at end of input or once the announcer starts closing.
/// Returns the number of keys accepted.
pub async fn read_keys<B>(input: B, announcer: Announcer<ContentKey>) -> anyhow::Result<u64>
where
    B: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut accepted = 0_u64;

    loop {
        let line = tokio::select! {
            biased;
            () = announcer.closing() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => {
                    tracing::info!("Reached end of input after {accepted} keys");
                    break;
                }
            },
        };

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let key: ContentKey = match line.parse() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Skipping line {line:?}: {e}");
                continue;
            }
        };

        match announcer.provide(key).await {
            Ok(()) => accepted += 1,
            Err(Error::ServiceShutdown) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(accepted)
}

/// Logs announcer statistics every `every` until the announcer closes.
pub async fn report_stats(announcer: Announcer<ContentKey>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            () = announcer.closing() => break,
            _ = ticker.tick() => {}
        }

        let stat = announcer.stat();
        let backlog = announcer.backlog();
        tracing::info!(
            completed = stat.completed,
            succeeded = stat.succeeded,
            failed = stat.failed,
            timed_out = stat.timed_out,
            in_flight = stat.in_flight,
            intake = backlog.intake,
            dispatch = backlog.dispatch,
            "Announce stats (avg {:?})",
            stat.average_duration
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use announce::{AnnounceConfig, CancellationToken};
    use crate::node::router::SimulatedRouter;

    fn announcer() -> Announcer<ContentKey> {
        Announcer::new(
            &CancellationToken::new(),
            SimulatedRouter::new(Duration::ZERO, 0),
            AnnounceConfig::low_resource().with_num_workers(2),
        )
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn accepts_valid_lines_and_skips_the_rest() {
        let input: &[u8] = b"# comment\n0a0b\n\nnot-hex\n  ff00  \nabc\n";
        let announcer = announcer();

        let accepted = read_keys(input, announcer.clone()).await.unwrap();
        assert_eq!(accepted, 2);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while announcer.stat().completed < 2 {
            assert!(tokio::time::Instant::now() < deadline);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        announcer.close().await;
    }

    #[tokio::test]
    async fn stops_once_closed() {
        let announcer = announcer();
        announcer.close().await;

        let accepted = read_keys(&b"0a0b\n"[..], announcer).await.unwrap();
        assert_eq!(accepted, 0);
    }
}
