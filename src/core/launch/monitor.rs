// ─── Process Monitor ───
// One reader per output stream and one exit watcher per launch.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::events::{EventSink, PlayState};

use super::task::GameProcess;

/// Handle to a running game.
pub struct LaunchHandle {
    pub pid: Option<u32>,
    exit: JoinHandle<Option<i32>>,
}

impl LaunchHandle {
    /// Waits for the game to exit. `None` when no exit code is available.
    pub async fn wait(self) -> Option<i32> {
        self.exit.await.unwrap_or_else(|e| {
            error!("Process monitor task failed: {}", e);
            None
        })
    }
}

/// Watches `process`: the first stdout output reports [`PlayState::Running`],
/// the exit reports [`PlayState::Idle`]. Game output is logged under
/// `[version_id]`.
pub fn monitor(process: GameProcess, version_id: &str, events: EventSink) -> LaunchHandle {
    let GameProcess {
        pid,
        stdout,
        stderr,
        exit,
    } = process;

    let label: Arc<str> = Arc::from(version_id);
    let stdout_task = tokio::spawn(pump_stdout(stdout, label.clone(), events.clone()));
    let stderr_task = tokio::spawn(pump_stderr(stderr, label.clone()));

    let exit = tokio::spawn(async move {
        let code = match exit.await {
            Ok(code) => code,
            Err(e) => {
                error!("[{}] failed waiting for the game process: {}", label, e);
                None
            }
        };
        // Flush the remaining output before reporting the exit.
        let _ = stdout_task.await;
        let _ = stderr_task.await;

        info!("[{}] exited with code {:?}", label, code);
        events.play_state(PlayState::Idle);
        code
    });

    LaunchHandle { pid, exit }
}

async fn pump_stdout(
    stdout: Box<dyn AsyncRead + Send + Unpin>,
    label: Arc<str>,
    events: EventSink,
) {
    let mut reader = BufReader::new(stdout);
    match reader.fill_buf().await {
        Ok(buf) if !buf.is_empty() => events.play_state(PlayState::Running),
        Ok(_) => return,
        Err(e) => {
            debug!("[{}] stdout closed: {}", label, e);
            return;
        }
    }

    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => info!("[{}] {}", label, line),
            Ok(None) => break,
            Err(e) => {
                debug!("[{}] stdout closed: {}", label, e);
                break;
            }
        }
    }
}

async fn pump_stderr(stderr: Box<dyn AsyncRead + Send + Unpin>, label: Arc<str>) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => warn!("[{}] {}", label, line),
            Ok(None) => break,
            Err(e) => {
                debug!("[{}] stderr closed: {}", label, e);
                break;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::events::LauncherEvent;
    use std::io::Cursor;

    pub(crate) fn fake_process(stdout: &str, stderr: &str, code: Option<i32>) -> GameProcess {
        GameProcess {
            pid: Some(4242),
            stdout: Box::new(Cursor::new(stdout.as_bytes().to_vec())),
            stderr: Box::new(Cursor::new(stderr.as_bytes().to_vec())),
            exit: Box::pin(async move { Ok(code) }),
        }
    }

    fn play_states(rx: &mut tokio::sync::mpsc::Receiver<LauncherEvent>) -> Vec<PlayState> {
        let mut states = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let LauncherEvent::PlayState(state) = event {
                states.push(state);
            }
        }
        states
    }

    #[tokio::test]
    async fn output_then_exit_reports_running_then_idle_once() {
        let (events, mut rx) = EventSink::channel(16);
        events.play_state(PlayState::Launching);

        let handle = monitor(
            fake_process("[Client thread/INFO]: Setting user: Notch\nLWJGL 2.9.4\n", "", Some(0)),
            "ashclient-1.8.9",
            events,
        );

        assert_eq!(handle.pid, Some(4242));
        assert_eq!(handle.wait().await, Some(0));
        assert_eq!(
            play_states(&mut rx),
            vec![PlayState::Launching, PlayState::Running, PlayState::Idle]
        );
    }

    #[tokio::test]
    async fn silent_crash_goes_straight_back_to_idle() {
        let (events, mut rx) = EventSink::channel(16);
        events.play_state(PlayState::Launching);

        let handle = monitor(
            fake_process("", "Error: could not find main class", Some(1)),
            "ashclient-1.8.9",
            events,
        );

        assert_eq!(handle.wait().await, Some(1));
        assert_eq!(
            play_states(&mut rx),
            vec![PlayState::Launching, PlayState::Idle]
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn game_output_is_logged_under_the_version_id() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let handle = monitor(
            fake_process("Setting user: Notch\n", "Exception in thread main\n", Some(0)),
            "ashclient-1.8.9",
            EventSink::disconnected(),
        );
        handle.wait().await;

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("[ashclient-1.8.9] Setting user: Notch"), "{text}");
        assert!(text.contains("[ashclient-1.8.9] Exception in thread main"), "{text}");
        assert!(!text.contains("[MC"), "{text}");
    }
}
