use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ashlauncher_lib::commands;
use ashlauncher_lib::core::auth::token_cache::{CachedAccount, TokenCache};
use ashlauncher_lib::core::auth::AuthEndpoints;
use ashlauncher_lib::core::downloader::Origins;
use ashlauncher_lib::core::error::LauncherResult;
use ashlauncher_lib::core::events::{EventSink, LauncherEvent, PlayState};
use ashlauncher_lib::core::launch::{GameProcess, LaunchCommand, LaunchOptions, ProcessSpawner};
use ashlauncher_lib::core::state::{AppState, InstallLayout, LauncherConfig};
use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc::Receiver;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSpawner {
    commands: Mutex<Vec<LaunchCommand>>,
}

#[async_trait]
impl ProcessSpawner for RecordingSpawner {
    async fn spawn(&self, command: &LaunchCommand) -> LauncherResult<GameProcess> {
        self.commands.lock().unwrap().push(command.clone());
        Ok(GameProcess {
            pid: Some(1),
            stdout: Box::new(std::io::Cursor::new(b"[Client thread/INFO]: LWJGL Version: 2.9.4\n".to_vec())),
            stderr: Box::new(std::io::Cursor::new(Vec::new())),
            exit: Box::pin(async { Ok(Some(0)) }),
        })
    }
}

fn natives_jar() -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("lwjgl64.dll", options).unwrap();
        writer.write_all(b"native").unwrap();
        writer.start_file("META-INF/MANIFEST.MF", options).unwrap();
        writer.write_all(b"Manifest-Version: 1.0\n").unwrap();
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/user/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Token": "xbl-token",
            "DisplayClaims": { "xui": [{ "uhs": "hash-1" }] }
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/xsts/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Token": "xsts-token",
            "DisplayClaims": { "xui": [{ "uhs": "hash-1" }] }
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/authentication/login_with_xbox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "mc-token" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/minecraft/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "069a79f444e94726a5befca90e38aaf5",
            "name": "Notch"
        })))
        .mount(server)
        .await;
}

async fn mount_content(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/releases/ashclient-1.8.9.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 12_000]))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/releases/ashclient-1.8.9.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"ashclient-1.8.9"}"#))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/vendor/.*-natives-windows.*\.jar$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(natives_jar()))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/vendor/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"library".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mirror/resources/ClientInput.dll"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"dll".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mirror/resources/java-discord-rpc-2.0.1-all.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"rpc".to_vec()))
        .mount(server)
        .await;
}

async fn seed_session(layout: &InstallLayout) {
    let mut cache = TokenCache::load(&layout.token_cache_path()).await.unwrap();
    cache.upsert(CachedAccount {
        home_account_id: "home-1".into(),
        username: "alex@example.com".into(),
        name: Some("Alex Doe".into()),
        access_token: "ms-access".into(),
        refresh_token: Some("ms-refresh".into()),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    });
    cache.save().await.unwrap();
}

fn app_state(server: &MockServer, root: &Path) -> (AppState, Receiver<LauncherEvent>) {
    let layout = InstallLayout::new(root.join(".minecraft"), root.join("ashclient"));
    let mut config = LauncherConfig::for_layout(layout, &root.join("ashlauncher"));
    config.origins = Origins {
        primary: format!("{}/vendor/", server.uri()),
        secondary: format!("{}/mirror/", server.uri()),
    };
    config.releases_base = format!("{}/releases/", server.uri());
    config.auth.endpoints = AuthEndpoints::under(&server.uri());
    config.auth.callback_addr = SocketAddr::from(([127, 0, 0, 1], 0));

    let (events, rx) = EventSink::channel(4096);
    (AppState::new(config, events).unwrap(), rx)
}

async fn content_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| {
            let path = request.url.path();
            path.starts_with("/vendor/") || path.starts_with("/mirror/") || path.starts_with("/releases/")
        })
        .count()
}

#[tokio::test]
async fn signed_in_launch_prepares_everything_and_reports_play_states() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_content(&server).await;
    let temp = tempfile::tempdir().unwrap();
    let (state, mut rx) = app_state(&server, temp.path());
    seed_session(&state.layout).await;
    let spawner = RecordingSpawner::default();

    let handle = commands::launch_minecraft(
        &state,
        LaunchOptions {
            java_path: Some("/opt/java8/bin/java".into()),
            ram_mb: Some(2048),
        },
        &spawner,
    )
    .await
    .unwrap();
    assert_eq!(handle.wait().await, Some(0));

    let layout = &state.layout;
    let version_dir = layout.versions_dir().join("ashclient-1.8.9");
    assert_eq!(
        std::fs::metadata(version_dir.join("ashclient-1.8.9.jar")).unwrap().len(),
        12_000
    );
    assert!(layout
        .libraries_dir()
        .join("com/mojang/authlib/1.5.21/authlib-1.5.21.jar")
        .exists());
    let natives = layout.natives_dir("ashclient-1.8.9");
    assert_eq!(std::fs::read(natives.join("lwjgl64.dll")).unwrap(), b"native");
    assert!(!natives.join("META-INF").exists());
    assert_eq!(std::fs::read(natives.join("ClientInput.dll")).unwrap(), b"dll");
    assert!(layout.storage_dir.join("java-discord-rpc-2.0.1-all.jar").exists());

    let commands = spawner.commands.lock().unwrap().clone();
    assert_eq!(commands.len(), 1);
    let command = &commands[0];
    assert_eq!(command.program, "/opt/java8/bin/java");
    assert_eq!(command.args[0], "-Xmx2048m");
    let classpath = &command.args[command.args.iter().position(|a| a == "-cp").unwrap() + 1];
    let separator = if cfg!(windows) { ";" } else { ":" };
    let entries: Vec<&str> = classpath.split(separator).collect();
    assert_eq!(entries.len(), 3 + state.manifest.libraries.len());
    assert!(entries[0].ends_with("ashclient-1.8.9.jar"));
    assert!(entries[2].ends_with("java-discord-rpc-2.0.1-all.jar"));
    let flag = |name: &str| &command.args[command.args.iter().position(|a| a == name).unwrap() + 1];
    assert_eq!(flag("--username"), "Notch");
    assert_eq!(flag("--uuid"), "069a79f444e94726a5befca90e38aaf5");
    assert_eq!(flag("--accessToken"), "mc-token");

    let mut play_states = Vec::new();
    let mut finished_downloads = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            LauncherEvent::PlayState(play_state) => play_states.push(play_state),
            LauncherEvent::DownloadProgress(progress) if progress.percent == 100 => {
                assert_eq!(progress.bytes_downloaded, progress.bytes_total);
                finished_downloads.push(progress.tracking_id);
            }
            LauncherEvent::DownloadProgress(_) => {}
        }
    }
    assert_eq!(
        play_states,
        vec![PlayState::Launching, PlayState::Running, PlayState::Idle]
    );
    assert!(finished_downloads.contains(&"ashclient-1.8.9-jar".to_string()));
    assert!(finished_downloads.contains(&"discord-rpc".to_string()));
}

#[tokio::test]
async fn second_launch_downloads_nothing() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_content(&server).await;
    let temp = tempfile::tempdir().unwrap();
    let (state, _rx) = app_state(&server, temp.path());
    seed_session(&state.layout).await;
    let spawner = RecordingSpawner::default();

    commands::launch_minecraft(&state, LaunchOptions::default(), &spawner)
        .await
        .unwrap()
        .wait()
        .await;
    let after_first = content_requests(&server).await;
    assert!(after_first > 0);

    commands::launch_minecraft(&state, LaunchOptions::default(), &spawner)
        .await
        .unwrap()
        .wait()
        .await;

    assert_eq!(content_requests(&server).await, after_first);
    assert_eq!(spawner.commands.lock().unwrap().len(), 2);
}
