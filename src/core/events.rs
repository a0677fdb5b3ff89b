// ─── Observer Channel ───
// Everything the backend reports outward (download progress, play state)
// goes through a bounded channel drained by whatever UI sits on top.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

/// Progress of a single file download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadProgressEvent {
    pub tracking_id: String,
    pub bytes_downloaded: u64,
    /// 0 when the server did not advertise a length.
    pub bytes_total: u64,
    pub percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    Idle,
    Launching,
    Running,
}

impl PlayState {
    fn as_u8(self) -> u8 {
        match self {
            PlayState::Idle => 0,
            PlayState::Launching => 1,
            PlayState::Running => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum LauncherEvent {
    DownloadProgress(DownloadProgressEvent),
    PlayState(PlayState),
}

/// Write half of the observer channel.
///
/// Sending never blocks: when the observer lags behind and the buffer is
/// full, the event is dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<mpsc::Sender<LauncherEvent>>,
    play_state: Arc<AtomicU8>,
}

impl EventSink {
    /// Creates a sink and the receiver the UI layer drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LauncherEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx: Some(tx),
                play_state: Arc::new(AtomicU8::new(PlayState::Idle.as_u8())),
            },
            rx,
        )
    }

    /// A sink nobody listens to.
    pub fn disconnected() -> Self {
        Self {
            tx: None,
            play_state: Arc::new(AtomicU8::new(PlayState::Idle.as_u8())),
        }
    }

    pub fn progress(&self, event: DownloadProgressEvent) {
        self.send(LauncherEvent::DownloadProgress(event));
    }

    /// Emits `state` only if it differs from the last reported state.
    pub fn play_state(&self, state: PlayState) {
        let previous = self.play_state.swap(state.as_u8(), Ordering::SeqCst);
        if previous != state.as_u8() {
            self.send(LauncherEvent::PlayState(state));
        }
    }

    fn send(&self, event: LauncherEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => trace!("Observer lagging, dropped {:?}", event),
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn play_state_is_emitted_once_per_change() {
        let (sink, mut rx) = EventSink::channel(16);

        sink.play_state(PlayState::Launching);
        sink.play_state(PlayState::Launching);
        sink.play_state(PlayState::Running);
        sink.play_state(PlayState::Running);
        sink.play_state(PlayState::Idle);
        drop(sink);

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                LauncherEvent::PlayState(PlayState::Launching),
                LauncherEvent::PlayState(PlayState::Running),
                LauncherEvent::PlayState(PlayState::Idle),
            ]
        );
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let (sink, mut rx) = EventSink::channel(1);
        for i in 0..5 {
            sink.progress(DownloadProgressEvent {
                tracking_id: "x".into(),
                bytes_downloaded: i,
                bytes_total: 0,
                percent: 0,
            });
        }

        let first = rx.try_recv().unwrap();
        assert!(matches!(
            first,
            LauncherEvent::DownloadProgress(DownloadProgressEvent { bytes_downloaded: 0, .. })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn disconnected_sink_accepts_everything() {
        let sink = EventSink::disconnected();
        sink.play_state(PlayState::Running);
        sink.progress(DownloadProgressEvent {
            tracking_id: "x".into(),
            bytes_downloaded: 1,
            bytes_total: 1,
            percent: 100,
        });
    }
}
