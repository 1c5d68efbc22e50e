use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        let env = Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        };
        seed_fixtures(&env.data_dir());
        env
    }

    fn data_dir(&self) -> PathBuf {
        self.xdg_data.join("chatlens/processed")
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("chatlens");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }
}

fn seed_fixtures(data_dir: &Path) {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../chatlens-core/tests/fixtures");

    fs::create_dir_all(data_dir).expect("failed to create data dir");
    for name in ["scenario.ndjson", "outliers.ndjson", "with-malformed.ndjson"] {
        fs::copy(fixtures.join(name), data_dir.join(name)).expect("failed to copy fixture");
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let mut command = Command::new(assert_cmd::cargo::cargo_bin!("chatlens"));

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute chatlens: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "chatlens {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn json_stdout(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn files_lists_archives_in_data_dir() {
    let env = CliTestEnv::new();
    fs::write(env.data_dir().join("notes.txt"), "skip me").expect("failed to write notes");

    let args = ["files"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let listed: Vec<_> = stdout.lines().collect();
    assert_eq!(
        listed,
        vec!["outliers.ndjson", "scenario.ndjson", "with-malformed.ndjson"]
    );
}

#[test]
fn summary_view_as_json() {
    let env = CliTestEnv::new();

    let args = ["view", "summary", "--file", "scenario.ndjson", "--format", "json"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let summary = json_stdout(&output);
    assert_eq!(summary["total_messages"], 3);
    assert_eq!(summary["total_users"], 2);
    assert_eq!(summary["total_redpacket_amount"], 30.0);
    assert_eq!(summary["first_date"], "2024-01-01");
    assert_eq!(summary["last_date"], "2024-01-02");
}

#[test]
fn top_users_text_output() {
    let env = CliTestEnv::new();

    let args = ["view", "top-users", "--file", "scenario.ndjson"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("top-users"), "unexpected output:\n{stdout}");
    let alice = stdout.find("Alice").expect("Alice should be listed");
    let bob = stdout.find("Bob").expect("Bob should be listed");
    assert!(alice < bob, "Alice should rank above Bob:\n{stdout}");
}

#[test]
fn user_trend_requires_user() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["view", "user-trend", "--file", "scenario.ndjson"]);
    assert!(!output.status.success());

    let args = [
        "view",
        "user-trend",
        "--file",
        "scenario.ndjson",
        "--file",
        "outliers.ndjson",
        "--user",
        "u3",
        "--format",
        "json",
    ];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    let trend = json_stdout(&output);
    assert_eq!(trend["sender_id"], "u3");
    assert_eq!(trend["days"][0]["date"], "2024-01-03");
    assert_eq!(trend["days"][0]["message_count"], 2);
}

#[test]
fn report_combines_every_view() {
    let env = CliTestEnv::new();

    let args = [
        "report",
        "--file",
        "scenario.ndjson",
        "--file",
        "outliers.ndjson",
    ];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let report = json_stdout(&output);
    assert_eq!(report["generation"], 1);
    assert_eq!(report["files"][1], "outliers.ndjson");
    assert_eq!(report["summary"]["total_messages"], 7);
    assert_eq!(report["payments"]["total_amount"], 80.0);
    assert_eq!(report["payments"]["excluded_count"], 2);
    assert_eq!(report["heatmap"]["cells"].as_array().map(Vec::len), Some(168));
    assert_eq!(
        report["length_histograms"]["content_length"]
            .as_array()
            .map(Vec::len),
        Some(31)
    );
}

#[test]
fn malformed_lines_warn_but_succeed() {
    let env = CliTestEnv::new();

    let args = ["view", "summary", "--file", "with-malformed.ndjson"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("skipped 3 malformed line(s)"),
        "expected skip warning, got:\n{stderr}"
    );
}

#[test]
fn traversal_and_missing_files_fail() {
    let env = CliTestEnv::new();

    for bad in ["../secret.ndjson", "/etc/passwd", "missing.ndjson"] {
        let output = run_bin(&env, &["view", "summary", "--file", bad]);
        assert!(!output.status.success(), "{bad} should be rejected");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("input error"),
            "expected input error for {bad}, got:\n{stderr}"
        );
    }
}

#[test]
fn unknown_view_and_format_fail() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["view", "pie-chart", "--file", "scenario.ndjson"]);
    assert!(!output.status.success());

    let output = run_bin(
        &env,
        &["view", "summary", "--file", "scenario.ndjson", "--format", "xml"],
    );
    assert!(!output.status.success());
}

#[test]
fn data_dir_flag_and_config_override_defaults() {
    let env = CliTestEnv::new();
    let elsewhere = env.home.join("archives");
    seed_fixtures(&elsewhere);
    fs::remove_file(env.data_dir().join("outliers.ndjson")).expect("failed to remove fixture");

    let data_dir = elsewhere.to_string_lossy().into_owned();
    let args = [
        "view",
        "payments",
        "--file",
        "outliers.ndjson",
        "--format",
        "json",
        "--data-dir",
        data_dir.as_str(),
    ];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert_eq!(json_stdout(&output)["total_amount"], 50.0);

    env.write_config(&format!(
        "[analytics]\noutlier_threshold = 100.0\n\n[data]\ndir = {:?}\n",
        data_dir
    ));
    let args = ["view", "payments", "--file", "outliers.ndjson", "--format", "json"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    let payments = json_stdout(&output);
    assert_eq!(payments["excluded_count"], 0);
    assert_eq!(payments["event_count"], 3);
}

#[test]
fn invalid_config_is_reported() {
    let env = CliTestEnv::new();
    env.write_config("[analytics]\nhistogram_bin_width = 0\n");

    let output = run_bin(&env, &["files"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("histogram_bin_width"),
        "expected config error, got:\n{stderr}"
    );
}
