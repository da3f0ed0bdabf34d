//! End-to-end runs of the `mocap-minimal-client` binary against simulated and
//! replayed servers.

use std::path::PathBuf;
use std::process::{Command, Output};

use mocap_client::providers::Recording;
use mocap_client::{DataDescription, MocapFrame, RigidBodyDescription, ServerDescription, Vec3};

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("mocap_minimal_client_{}_{}", test, std::process::id()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn run_client(test: &str, config: &str) -> Output {
    let dir = scratch_dir(test);
    let config_path = dir.join("mocap-client.yaml");
    std::fs::write(&config_path, config).expect("write config");

    Command::new(env!("CARGO_BIN_EXE_mocap-minimal-client"))
        .env("MOCAP_CLIENT_CONFIG", &config_path)
        .env_remove("RUST_LOG")
        .current_dir(&dir)
        .output()
        .expect("run mocap-minimal-client")
}

fn body1_recording(frames: Vec<MocapFrame>) -> Recording {
    Recording {
        server: ServerDescription::default(),
        descriptions: vec![DataDescription::RigidBody(RigidBodyDescription {
            name: "Body1".to_string(),
            id: 1,
            parent_id: -1,
            offset: Vec3::ZERO,
            markers: Vec::new(),
        })],
        // Faster than the client prints its catalog; frames queue from connect onwards.
        frame_rate: 1000.0,
        frames,
    }
}

#[test]
fn absent_host_exits_with_server_description_error() {
    let output = run_client(
        "absent_host",
        "log_filter: warn\nbackend:\n  kind: simulated\n  server:\n    host_present: false\n",
    );
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1), "stderr:\n{stderr}");
    assert!(stderr.contains("server description"), "stderr:\n{stderr}");
    assert!(stderr.contains("Error code: 0"), "stderr:\n{stderr}");
}

#[test]
fn unreachable_server_exits_after_fallback() {
    let output = run_client(
        "unreachable",
        "log_filter: warn\nbackend:\n  kind: simulated\n  accept: []\n",
    );
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1), "stderr:\n{stderr}");
    assert!(stderr.contains("Unable to connect"), "stderr:\n{stderr}");
    assert!(stderr.contains("2 attempt(s)"), "stderr:\n{stderr}");
    assert!(stderr.contains("Operation: connect. Error code: 3."), "stderr:\n{stderr}");
}

#[test]
fn empty_catalog_exits_with_asset_list_error() {
    let output = run_client(
        "empty_catalog",
        "log_filter: warn\nbackend:\n  kind: simulated\n  catalog: []\n",
    );
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1), "stderr:\n{stderr}");
    assert!(stderr.contains("Error getting asset list"), "stderr:\n{stderr}");
}

#[test]
fn invalid_config_exits_with_failure() {
    let output = run_client("invalid_config", "session:\n  connect_timeout_ms: 0\n");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1), "stderr:\n{stderr}");
    assert!(stderr.contains("connect_timeout_ms"), "stderr:\n{stderr}");
}

#[test]
fn replay_prints_catalog_and_empty_frame_then_exits() {
    let dir = scratch_dir("replay");
    let recording = body1_recording(vec![MocapFrame::new(0, 0.0)]);
    std::fs::write(dir.join("take.yaml"), recording.to_yaml().expect("serialize recording"))
        .expect("write recording");

    let output = run_client(
        "replay",
        "log_filter: warn\nbackend:\n  kind: replay\n  path: take.yaml\n",
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(0), "stderr:\n{stderr}");
    assert!(stdout.contains("Connected : Motive (ver. 3.1.0.0)"), "stdout:\n{stdout}");
    assert!(stdout.contains("Rigid Body Name : Body1"), "stdout:\n{stdout}");
    assert!(stdout.contains("Rigid Body ID : 1"), "stdout:\n{stdout}");
    assert!(stdout.contains("Rigid Body Parent ID : -1"), "stdout:\n{stdout}");
    assert!(stdout.contains("Parent Offset : 0.00,0.00,0.00"), "stdout:\n{stdout}");

    for header in [
        "Rigid Bodies [ Count = 0 ]",
        "Skeletons [ Count = 0 ]",
        "Assets [ Count = 0 ]",
        "Markers [ Count = 0 ]",
        "Force Plates [ Count = 0 ]",
        "Devices [ Count = 0 ]",
    ] {
        assert!(stdout.contains(header), "missing {header} in:\n{stdout}");
    }
}
