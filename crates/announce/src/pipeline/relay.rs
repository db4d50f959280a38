use crate::{Key, telemetry::record_abandoned};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Moves keys from the intake buffer into the dispatch queue.
///
/// The intake buffer is sized to absorb producer bursts while the dispatch
/// queue bounds how much work sits unclaimed in front of the workers. Both
/// waits here (an empty intake, a full dispatch queue) race the scope, so the
/// relay stops as soon as shutdown begins.
///
/// Keys still in the intake buffer at that point, including one held while
/// waiting on a full dispatch queue, are abandoned.
pub(crate) async fn relay_loop<K: Key>(
    mut intake: mpsc::Receiver<K>,
    dispatch: mpsc::Sender<K>,
    scope: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Relay started");

    let mut abandoned = 0_usize;

    loop {
        let key = tokio::select! {
            biased;
            () = scope.cancelled() => break,
            key = intake.recv() => match key {
                Some(key) => key,
                // Every producer handle is gone.
                None => break,
            },
        };

        let sent = tokio::select! {
            biased;
            () = scope.cancelled() => false,
            res = dispatch.send(key) => res.is_ok(),
        };
        if !sent {
            abandoned += 1;
            break;
        }
    }

    // Refuse further submissions before counting what is left.
    intake.close();
    abandoned += intake.len();
    record_abandoned(abandoned as u64);

    #[cfg(feature = "tracing")]
    {
        if abandoned > 0 {
            tracing::debug!("Relay abandoned {abandoned} buffered keys");
        }
        tracing::trace!("Relay stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn forwards_every_key_in_order() {
        let (intake_tx, intake_rx) = mpsc::channel(4);
        let (dispatch_tx, mut dispatch_rx) = mpsc::channel(2);
        let scope = CancellationToken::new();
        let relay = tokio::spawn(relay_loop(intake_rx, dispatch_tx, scope.clone()));

        let producer = tokio::spawn(async move {
            for i in 0..16_u32 {
                intake_tx.send(i).await.unwrap();
            }
        });

        for expected in 0..16_u32 {
            assert_eq!(dispatch_rx.recv().await, Some(expected));
        }
        producer.await.unwrap();

        // Producer dropped its sender, so the relay ends on its own.
        timeout(Duration::from_secs(1), relay)
            .await
            .expect("relay must stop once producers are gone")
            .unwrap();
        assert_eq!(dispatch_rx.recv().await, None);
    }

    #[tokio::test]
    async fn stops_on_cancel_with_full_dispatch_queue() {
        let (intake_tx, intake_rx) = mpsc::channel(8);
        let (dispatch_tx, mut dispatch_rx) = mpsc::channel(1);
        let scope = CancellationToken::new();
        let relay = tokio::spawn(relay_loop(intake_rx, dispatch_tx, scope.clone()));

        for i in 0..4_u32 {
            intake_tx.send(i).await.unwrap();
        }
        // Let the relay fill the dispatch queue and block on the next key.
        tokio::time::sleep(Duration::from_millis(20)).await;

        scope.cancel();
        timeout(Duration::from_secs(1), relay)
            .await
            .expect("relay must observe cancellation")
            .unwrap();

        assert_eq!(dispatch_rx.recv().await, Some(0));
        assert_eq!(dispatch_rx.recv().await, None);
        assert!(intake_tx.send(99).await.is_err());
    }
}
