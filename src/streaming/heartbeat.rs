//! Per-session heartbeat task.

use crate::session::SessionId;
use crate::streaming::events::{OutboundEvent, unix_timestamp};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawn the heartbeat loop for one connection.
///
/// Emits a timestamped heartbeat every `interval` until `stop` is notified.
/// A failed tick backs off and retries; the task only ever exits through the
/// stop signal, so the manager can always join it on disconnect.
pub fn spawn_heartbeat(
    id: SessionId,
    interval: Duration,
    error_backoff: Duration,
    sender: mpsc::Sender<OutboundEvent>,
    stop: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.notified() => {
                    debug!("heartbeat for {id} stopping");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    let event = OutboundEvent::Heartbeat {
                        timestamp: unix_timestamp(),
                    };
                    if sender.send(event).await.is_err() {
                        // Receiver is gone but disconnect has not run yet.
                        warn!("heartbeat for {id} could not be delivered, backing off");
                        tokio::time::sleep(error_backoff).await;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn emits_heartbeats_at_interval() {
        let (tx, mut rx) = mpsc::channel(8);
        let stop = Arc::new(Notify::new());
        let handle = spawn_heartbeat(
            SessionId(1),
            Duration::from_secs(2),
            Duration::from_secs(5),
            tx,
            stop.clone(),
        );

        tokio::time::advance(Duration::from_secs(2)).await;
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, OutboundEvent::Heartbeat { .. }));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(
            rx.recv().await.unwrap(),
            OutboundEvent::Heartbeat { .. }
        ));

        stop.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_signal_ends_the_task() {
        let (tx, _rx) = mpsc::channel(8);
        let stop = Arc::new(Notify::new());
        let handle = spawn_heartbeat(
            SessionId(2),
            Duration::from_secs(2),
            Duration::from_secs(5),
            tx,
            stop.clone(),
        );

        stop.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_does_not_kill_the_task() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let stop = Arc::new(Notify::new());
        let handle = spawn_heartbeat(
            SessionId(3),
            Duration::from_secs(2),
            Duration::from_secs(5),
            tx,
            stop.clone(),
        );

        // One failed tick plus its backoff; the task must still be joinable.
        tokio::time::advance(Duration::from_secs(8)).await;
        stop.notify_one();
        handle.await.unwrap();
    }
}
