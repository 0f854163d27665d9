// Config loading, validation, and phase-label resolution

use pathwatch::config::{AppConfig, PHASE_ENV, PHASE_UNKNOWN, resolve_phase_label};

const VALID_CONFIG: &str = r#"
[targets]
hosts = ["192.168.1.1", "1.1.1.1", "9.9.9.9"]

[latency]
ping_count = 10
interval_ms = 200
reply_wait_secs = 1
timeout_secs = 8

[route]
max_hops = 20
snip_lines = 12
timeout_secs = 90

[bandwidth]
timeout_secs = 180

[cadence]
route_every_min = 15
bandwidth_every_min = 30

[dataset]
dir = "data"

[snapshot]
path = "viz/latest.csv"
window_hours = 24

[phase]
file = "phase.txt"
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.targets.hosts.len(), 3);
    assert_eq!(config.latency.ping_count, 10);
    assert_eq!(config.route.max_hops, 20);
    assert_eq!(config.cadence.route_every_min, 15);
    assert_eq!(config.cadence.bandwidth_every_min, 30);
    assert_eq!(config.snapshot.window_hours, 24);
}

#[test]
fn test_config_defaults_when_omitted() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("valid");
    assert_eq!(config.dataset.file_prefix, "pathwatch_");
    assert_eq!(config.latency.command, "ping");
    assert_eq!(config.route.command, "traceroute");
    assert_eq!(config.bandwidth.command, "speedtest");
}

#[test]
fn test_config_snip_lines_defaults_to_twelve() {
    let trimmed = VALID_CONFIG.replace("snip_lines = 12\n", "");
    let config = AppConfig::load_from_str(&trimmed).expect("valid");
    assert_eq!(config.route.snip_lines, 12);
}

#[test]
fn test_config_rejects_empty_targets() {
    let bad = VALID_CONFIG.replace(
        r#"hosts = ["192.168.1.1", "1.1.1.1", "9.9.9.9"]"#,
        "hosts = []",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("targets.hosts"));
}

#[test]
fn test_config_rejects_ping_count_zero() {
    let bad = VALID_CONFIG.replace("ping_count = 10", "ping_count = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("ping_count"));
}

#[test]
fn test_config_rejects_latency_timeout_below_probe_duration() {
    // 10 pings * 200ms = 2s of sending; the cap must leave headroom beyond it
    let bad = VALID_CONFIG.replace("timeout_secs = 8", "timeout_secs = 2");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("latency.timeout_secs"));
}

#[test]
fn test_config_rejects_cadence_zero() {
    let bad = VALID_CONFIG.replace("route_every_min = 15", "route_every_min = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("route_every_min"));
}

#[test]
fn test_config_rejects_empty_dataset_dir() {
    let bad = VALID_CONFIG.replace("dir = \"data\"", "dir = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("dataset.dir"));
}

#[test]
fn test_config_rejects_window_hours_zero() {
    let bad = VALID_CONFIG.replace("window_hours = 24", "window_hours = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("window_hours"));
}

#[test]
fn test_config_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.targets.hosts.len(), 3);
}

// Env mutations race across threads, so all phase-resolution cases run in one test.
#[test]
fn test_phase_label_resolution_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let phase_file = dir.path().join("phase.txt");

    unsafe { std::env::remove_var(PHASE_ENV) };

    // neither source present -> sentinel
    assert_eq!(resolve_phase_label(&phase_file), PHASE_UNKNOWN);

    // blank file still falls back to the sentinel
    std::fs::write(&phase_file, "  \n").unwrap();
    assert_eq!(resolve_phase_label(&phase_file), PHASE_UNKNOWN);

    // file fallback: first line, trimmed
    std::fs::write(&phase_file, "  wired-baseline  \nsecond line ignored\n").unwrap();
    assert_eq!(resolve_phase_label(&phase_file), "wired-baseline");

    // env override wins over the file
    unsafe { std::env::set_var(PHASE_ENV, "mesh-experiment") };
    assert_eq!(resolve_phase_label(&phase_file), "mesh-experiment");

    // blank env override is ignored, not taken literally
    unsafe { std::env::set_var(PHASE_ENV, "   ") };
    assert_eq!(resolve_phase_label(&phase_file), "wired-baseline");

    unsafe { std::env::remove_var(PHASE_ENV) };
}
