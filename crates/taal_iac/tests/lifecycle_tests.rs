//! Integration tests for the apply/destroy/output lifecycle.
//!
//! A mock runner stands in for terraform; its hook mimics terraform's side
//! effect of writing a state file during `apply`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use taal_iac::markers::{APPLY_SUCCESS, DESTROY_SUCCESS, PLAN_FAILURE};
use taal_iac::workspace::{CONFIG_FILE, STATE_FILE};
use taal_iac::{IacError, Infra, SessionPhase, TerraformClient, TerraformSettings};
use taal_runner::{CommandSpec, MockResponse, MockRunner};

const CONFIG: &str = r#"resource "google_compute_project_metadata_item" "default" { key = "my_metadata" value = "my_value" }"#;
const CREDENTIALS: &str = "/keys/service-account.json";

fn valid_infra() -> Infra {
    Infra::new().with_config(CONFIG).with_credentials(CREDENTIALS)
}

fn apply_stdout() -> String {
    format!("\n{} 1 added, 0 changed, 0 destroyed.\n", APPLY_SUCCESS)
}

fn workdir(spec: &CommandSpec) -> PathBuf {
    spec.workdir.clone().expect("terraform always runs in a workspace")
}

/// State written by the fake `apply`: the config plus any `-var` arguments.
fn fake_state(spec: &CommandSpec) -> String {
    let config = std::fs::read_to_string(workdir(spec).join(CONFIG_FILE)).unwrap_or_default();
    let vars: Vec<&str> = spec
        .args
        .windows(2)
        .filter(|w| w[0] == "-var")
        .map(|w| w[1].as_str())
        .collect();
    format!("{{\"config_len\":{},\"vars\":{:?}}}", config.len(), vars)
}

/// A mock that behaves like terraform for init/apply.
fn applying_mock() -> MockRunner {
    MockRunner::new()
        .with_responses(vec![
            MockResponse::success("Terraform has been successfully initialized!"),
            MockResponse::success(apply_stdout()),
        ])
        .on_run(|spec| {
            if spec.args.first().map(String::as_str) == Some("apply") {
                std::fs::write(workdir(spec).join(STATE_FILE), fake_state(spec)).unwrap();
            }
        })
}

fn client(mock: &MockRunner) -> TerraformClient {
    TerraformClient::new(Arc::new(mock.clone()), TerraformSettings::default())
}

#[test]
fn test_new_session_is_empty() {
    let infra = Infra::new();
    assert!(infra.config().is_empty());
    assert!(infra.credentials().is_empty());
    assert!(infra.state().is_empty());
    assert!(infra.plugin_dir().is_none());
    assert!(infra.inputs().is_empty());
}

#[tokio::test]
async fn test_apply_without_config_fails() {
    let mock = MockRunner::new();
    let mut infra = Infra::new().with_credentials(CREDENTIALS).with_state("previous");

    let err = client(&mock).apply_and_record(&mut infra).await.unwrap_err();

    assert!(matches!(err, IacError::MissingConfig));
    assert_eq!(err.to_string(), taal_iac::markers::ERROR_MISSING_CONFIG);
    assert_eq!(infra.state(), b"previous");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_apply_without_credentials_fails_regardless_of_config() {
    let mock = MockRunner::new();

    for config in ["", CONFIG, "foo"] {
        let infra = Infra::new().with_config(config);
        let err = client(&mock).apply(&infra).await.unwrap_err();
        assert!(matches!(err, IacError::MissingCredentials));
        assert_eq!(err.to_string(), taal_iac::markers::ERROR_MISSING_CREDENTIALS);
    }
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_apply_records_fresh_state() {
    let mock = applying_mock();
    let mut infra = valid_infra();

    let stdout = client(&mock).apply_and_record(&mut infra).await.unwrap();

    assert!(stdout.contains(APPLY_SUCCESS));
    assert_eq!(infra.phase(), SessionPhase::Applied);
    assert_eq!(
        infra.state(),
        format!("{{\"config_len\":{},\"vars\":[]}}", CONFIG.len()).as_bytes()
    );
    assert_eq!(mock.subcommands(), vec!["init", "apply"]);
}

#[tokio::test]
async fn test_apply_is_pure_with_respect_to_session() {
    let mock = applying_mock();
    let infra = valid_infra();

    let outcome = client(&mock).apply(&infra).await.unwrap();

    assert!(!outcome.state.is_empty());
    assert!(infra.state().is_empty());
}

#[tokio::test]
async fn test_apply_command_lines_and_environment() {
    let mock = applying_mock();
    let plugins = tempfile::tempdir().unwrap();
    let infra = valid_infra().with_plugin_dir(plugins.path());

    client(&mock).apply(&infra).await.unwrap();

    let calls = mock.get_method_calls("run");
    assert_eq!(calls.len(), 2);

    let ws = calls[0].workdir.clone().unwrap();
    assert_eq!(calls[1].workdir.as_ref(), Some(&ws));
    assert!(calls[0].workdir_existed);

    assert_eq!(
        calls[0].args.as_ref().unwrap(),
        &vec![
            "init".to_string(),
            "-input=false".to_string(),
            "-get=true".to_string(),
            "-backend=false".to_string(),
            format!("-plugin-dir={}", plugins.path().display()),
            ws.display().to_string(),
            "-no-color".to_string(),
        ]
    );
    assert_eq!(
        calls[1].args.as_ref().unwrap(),
        &vec!["apply", "-auto-approve", "-input=false", "-no-color"]
    );

    for call in &calls {
        let env = call.env.as_ref().unwrap();
        let keys: Vec<&str> = env.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["CHECKPOINT_DISABLE", "GOOGLE_APPLICATION_CREDENTIALS", "HOME", "PATH"]
        );
        assert_eq!(env["GOOGLE_APPLICATION_CREDENTIALS"], CREDENTIALS);
        assert_eq!(env["CHECKPOINT_DISABLE"], "1");
    }

    // Workspace is cleaned up once the operation returns.
    assert!(!ws.exists());
}

#[tokio::test]
async fn test_inputs_change_the_applied_state() {
    let plain = client(&applying_mock()).apply(&valid_infra()).await.unwrap();

    let mock = applying_mock();
    let with_inputs = valid_infra().with_input("key", "value").with_input("image", "debian-12");
    let overridden = client(&mock).apply(&with_inputs).await.unwrap();

    assert!(overridden.stdout.contains(APPLY_SUCCESS));
    assert_ne!(plain.state, overridden.state);
    assert!(String::from_utf8_lossy(&overridden.state).contains("key=value"));

    let apply_args = mock.get_method_calls("run")[1].args.clone().unwrap();
    assert_eq!(
        apply_args,
        vec![
            "apply",
            "-auto-approve",
            "-input=false",
            "-var",
            "image=debian-12",
            "-var",
            "key=value",
            "-no-color",
        ]
    );
}

#[tokio::test]
async fn test_invalid_config_reports_plan_failure_and_keeps_state() {
    let mock = MockRunner::new().with_responses(vec![
        MockResponse::success("Terraform has been successfully initialized!"),
        MockResponse::failure(
            1,
            format!("Error: {}, described below.\n", PLAN_FAILURE),
        ),
    ]);
    let mut infra = Infra::new()
        .with_config("foo")
        .with_credentials(CREDENTIALS)
        .with_state("previous");

    let err = client(&mock).apply_and_record(&mut infra).await.unwrap_err();

    assert!(err.diagnostics().unwrap().contains(PLAN_FAILURE));
    assert!(!err.is_precondition());
    assert_eq!(infra.state(), b"previous");
}

#[tokio::test]
async fn test_init_failure_stops_before_apply() {
    let mock = MockRunner::new().add_response(MockResponse::failure(1, "Error: Failed to query available provider packages"));

    let err = client(&mock).apply(&valid_infra()).await.unwrap_err();

    assert_eq!(err.command_failure().unwrap().subcommand, "init");
    assert!(err.diagnostics().unwrap().contains("provider packages"));
    assert_eq!(mock.subcommands(), vec!["init"]);
}

#[tokio::test]
async fn test_apply_without_state_file_is_workspace_error() {
    // terraform "succeeds" but never writes a state file
    let mock = MockRunner::new();

    let err = client(&mock).apply(&valid_infra()).await.unwrap_err();

    assert!(matches!(err, IacError::Workspace { action: "read", .. }));
}

#[tokio::test]
async fn test_destroy_preconditions() {
    let mock = MockRunner::new();
    let client = client(&mock);

    let err = client.destroy(&Infra::new().with_config(CONFIG)).await.unwrap_err();
    assert!(matches!(err, IacError::MissingCredentials));

    let err = client.destroy(&Infra::new().with_credentials(CREDENTIALS)).await.unwrap_err();
    assert!(matches!(err, IacError::MissingConfig));

    let err = client.destroy(&Infra::new()).await.unwrap_err();
    assert!(matches!(err, IacError::MissingCredentials));

    assert!(!mock.was_called("run"));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_destroy_without_state_fails_in_terraform() {
    let seen_state = Arc::new(Mutex::new(None));
    let recorder = seen_state.clone();
    let mock = MockRunner::new()
        .with_responses(vec![
            MockResponse::success("Terraform has been successfully initialized!"),
            MockResponse::failure(1, "Error: no state to destroy"),
        ])
        .on_run(move |spec| {
            if spec.args.first().map(String::as_str) == Some("destroy") {
                *recorder.lock() = std::fs::read(workdir(spec).join(STATE_FILE)).ok();
            }
        });

    let err = client(&mock).destroy(&valid_infra()).await.unwrap_err();

    assert!(!err.is_precondition());
    assert_eq!(err.command_failure().unwrap().subcommand, "destroy");
    assert!(err.diagnostics().unwrap().contains("no state"));
    assert_eq!(mock.subcommands(), vec!["init", "destroy"]);
    assert_eq!(seen_state.lock().as_deref(), Some(&b""[..]));
}

#[tokio::test]
async fn test_destroy_after_apply() {
    let apply_mock = applying_mock();
    let mut infra = valid_infra().with_input("key", "value");
    client(&apply_mock).apply_and_record(&mut infra).await.unwrap();
    let state_after_apply = infra.state().to_vec();

    let seen_state = Arc::new(Mutex::new(None));
    let recorder = seen_state.clone();
    let destroy_mock = MockRunner::new()
        .with_responses(vec![
            MockResponse::success("Terraform has been successfully initialized!"),
            MockResponse::success(format!("{} 1 destroyed.", DESTROY_SUCCESS)),
        ])
        .on_run(move |spec| {
            if spec.args.first().map(String::as_str) == Some("destroy") {
                *recorder.lock() = std::fs::read(workdir(spec).join(STATE_FILE)).ok();
            }
        });

    let outcome = client(&destroy_mock).destroy(&infra).await.unwrap();

    assert!(outcome.stdout.contains(DESTROY_SUCCESS));
    assert_eq!(seen_state.lock().as_deref(), Some(state_after_apply.as_slice()));
    assert_eq!(destroy_mock.subcommands(), vec!["init", "destroy"]);
    assert_eq!(
        destroy_mock.get_method_calls("run")[1].args.clone().unwrap(),
        vec!["destroy", "-force", "-var", "key=value", "-no-color"]
    );
    // Destroy leaves the session's state as it was.
    assert_eq!(infra.state(), state_after_apply.as_slice());
}

#[tokio::test]
async fn test_outputs_from_state() {
    let stdout = r#"{
        "foo": {"sensitive": false, "type": "string", "value": "bar"},
        "key": {"sensitive": false, "type": "string", "value": "value"}
    }"#;
    let seen_state = Arc::new(Mutex::new(None));
    let recorder = seen_state.clone();
    let mock = MockRunner::new()
        .add_response(MockResponse::success(stdout))
        .on_run(move |spec| {
            *recorder.lock() = std::fs::read(workdir(spec).join(STATE_FILE)).ok();
        });
    let infra = Infra::new().with_state("{\"version\":4}");

    let outputs = client(&mock).outputs(&infra).await.unwrap();

    assert_eq!(
        outputs,
        BTreeMap::from([
            ("foo".to_string(), "bar".to_string()),
            ("key".to_string(), "value".to_string()),
        ])
    );
    assert_eq!(seen_state.lock().as_deref(), Some(&b"{\"version\":4}"[..]));

    let calls = mock.get_method_calls("run");
    assert_eq!(calls.len(), 1);
    let ws = calls[0].workdir.clone().unwrap();
    assert_eq!(
        calls[0].args.clone().unwrap(),
        vec![
            "output".to_string(),
            "-json".to_string(),
            format!("-state={}", ws.join(STATE_FILE).display()),
            "-no-color".to_string(),
        ]
    );
    let env_keys: Vec<String> = calls[0].env.clone().unwrap().into_keys().collect();
    assert_eq!(env_keys, vec!["HOME", "PATH"]);
}

#[tokio::test]
async fn test_outputs_with_none_declared_is_empty() {
    let mock = MockRunner::new().add_response(MockResponse::success("{}\n"));
    let infra = Infra::new().with_state("{\"version\":4}");

    let outputs = client(&mock).outputs(&infra).await.unwrap();

    assert!(outputs.is_empty());
}

#[tokio::test]
async fn test_outputs_decode_failure() {
    let mock = MockRunner::new().add_response(MockResponse::success("not json"));
    let infra = Infra::new().with_state("{\"version\":4}");

    let err = client(&mock).outputs(&infra).await.unwrap_err();

    assert!(matches!(err, IacError::Decode(_)));
}

#[tokio::test]
async fn test_outputs_without_state_runs_terraform() {
    let mock = MockRunner::new().add_response(MockResponse::failure(1, "Error: No state file was found!"));

    let err = client(&mock).outputs(&Infra::new()).await.unwrap_err();

    assert_eq!(err.command_failure().unwrap().subcommand, "output");
    assert_eq!(mock.subcommands(), vec!["output"]);
}

#[tokio::test]
async fn test_keep_workspaces_leaves_directory() {
    let root = tempfile::tempdir().unwrap();
    let mock = applying_mock();
    let settings = TerraformSettings::default()
        .keep_workspaces(true)
        .with_workspace_root(root.path());
    let client = TerraformClient::new(Arc::new(mock.clone()), settings);

    client.apply(&valid_infra()).await.unwrap();

    let ws = mock.get_method_calls("run")[0].workdir.clone().unwrap();
    assert!(ws.starts_with(root.path()));
    assert!(ws.join(CONFIG_FILE).is_file());
    assert!(ws.join(STATE_FILE).is_file());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_sessions_are_isolated() {
    let mock_a = applying_mock();
    let mock_b = applying_mock();
    let client_a = client(&mock_a);
    let client_b = client(&mock_b);

    let infra_a = valid_infra().with_input("name", "a");
    let infra_b = Infra::new()
        .with_config("resource \"null_resource\" \"b\" {}")
        .with_credentials(CREDENTIALS)
        .with_input("name", "b");

    let task_a = tokio::spawn({
        let infra = infra_a.clone();
        async move { client_a.apply(&infra).await }
    });
    let task_b = tokio::spawn({
        let infra = infra_b.clone();
        async move { client_b.apply(&infra).await }
    });

    let outcome_a = task_a.await.unwrap().unwrap();
    let outcome_b = task_b.await.unwrap().unwrap();

    assert!(String::from_utf8_lossy(&outcome_a.state).contains("name=a"));
    assert!(String::from_utf8_lossy(&outcome_b.state).contains("name=b"));

    let dir_a = mock_a.get_method_calls("run")[0].workdir.clone().unwrap();
    let dir_b = mock_b.get_method_calls("run")[0].workdir.clone().unwrap();
    assert_ne!(dir_a, dir_b);
}
