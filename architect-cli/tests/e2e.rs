//! End-to-end tests for the architect binary.
//!
//! Each run uses its own config directories and keyring service, with the
//! provider key variables removed from the environment. Provider traffic
//! goes to a local wiremock server.

use std::path::Path;
use std::process::Output;

use tempfile::TempDir;
use tokio::process::Command;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY_VARS: &[&str] = &[
    "GEMINI_API_KEY",
    "GOOGLE_API_KEY",
    "GROQ_API_KEY",
    "XAI_API_KEY",
    "DEEPSEEK_API_KEY",
];

/// An isolated home for one CLI invocation.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("project")).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the project-level config file.
    fn project_config(&self, contents: &str) {
        std::fs::write(self.path().join("project/config.toml"), contents).unwrap();
    }

    /// A keyring service nothing else stores keys under.
    fn keyring_service(&self) -> String {
        let name = self.path().file_name().unwrap_or_default();
        format!("architect-e2e-{}", name.to_string_lossy())
    }

    async fn run(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_architect"));
        cmd.args(args)
            .current_dir(self.path())
            .env("XDG_CONFIG_HOME", self.path().join("xdg"))
            .env("ARCHITECT_PROJECT_CONFIG_DIR", self.path().join("project"))
            .env("ARCHITECT_KEYRING_SERVICE", self.keyring_service())
            .env("RUST_LOG", "warn");
        for var in KEY_VARS {
            cmd.env_remove(var);
        }
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.output().await.expect("failed to run architect")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[tokio::test]
async fn help_lists_commands() {
    let output = Sandbox::new().run(&["--help"], &[]).await;

    assert!(output.status.success());
    let stdout = stdout(&output);
    for command in ["generate", "models", "providers", "config"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

#[tokio::test]
async fn generate_help_shows_flags() {
    let output = Sandbox::new().run(&["generate", "--help"], &[]).await;

    assert!(output.status.success());
    let stdout = stdout(&output);
    for flag in ["--provider", "--model", "--prompt", "--attach", "--export", "--no-retry"] {
        assert!(stdout.contains(flag), "missing {flag}");
    }
}

#[tokio::test]
async fn config_show_prints_defaults() {
    let output = Sandbox::new().run(&["config", "show"], &[]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    let stdout = stdout(&output);
    assert!(stdout.contains("[dispatch]"));
    assert!(stdout.contains("timeout_secs = 120"));
    assert!(stdout.contains("max_attempts = 3"));
}

#[tokio::test]
async fn config_path_shows_both_layers() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["config", "path"], &[]).await;

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("User config:"));
    assert!(stdout.contains("architect/config.toml"));
    assert!(stdout.contains("Project config:"));
    assert!(stdout.contains("project/config.toml"));
}

#[tokio::test]
async fn providers_lists_builtin_and_custom() {
    let sandbox = Sandbox::new();
    sandbox.project_config(
        r#"
[[custom_providers]]
id = "local"
display_name = "Local Gateway"
base_endpoint = "http://127.0.0.1:9/v1"
models = ["m1"]
"#,
    );

    let output = sandbox.run(&["providers"], &[]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    let stdout = stdout(&output);
    for name in ["Google Gemini", "Groq (Ultra Fast)", "xAI Grok", "DeepSeek", "Local Gateway"] {
        assert!(stdout.contains(name), "missing {name}");
    }
}

#[tokio::test]
async fn generate_with_unknown_provider_fails() {
    let output = Sandbox::new()
        .run(
            &["generate", "--provider", "openai", "--model", "gpt-4o", "--prompt", "hi"],
            &[],
        )
        .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("no provider named 'openai'"));
}

#[tokio::test]
async fn generate_without_key_explains_setup() {
    let output = Sandbox::new()
        .run(
            &["generate", "--model", "groq:llama-3.3-70b-versatile", "--prompt", "hi"],
            &[],
        )
        .await;

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("No API key for 'groq'"));
    assert!(stderr.contains("GROQ_API_KEY"));
}

#[tokio::test]
async fn image_on_text_only_provider_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    sandbox.project_config(&format!(
        "[providers.deepseek]\nbase_endpoint = \"{}\"\n",
        server.uri()
    ));
    std::fs::write(sandbox.path().join("diagram.png"), b"not decoded yet").unwrap();

    let output = sandbox
        .run(
            &[
                "generate",
                "--provider",
                "deepseek",
                "--model",
                "deepseek-chat",
                "--prompt",
                "Describe",
                "--attach",
                "diagram.png",
            ],
            &[("DEEPSEEK_API_KEY", "sk-test")],
        )
        .await;

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("unsupported capability"));
    assert!(stderr.contains("hint:"));
}

#[tokio::test]
async fn generate_prints_text_and_exports_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer gsk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "| Component | Role |\n|---|---|\n| api | entry point |\n| db | storage, backups |"
                },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    sandbox.project_config(&format!(
        "[providers.groq]\nbase_endpoint = \"{}\"\n",
        server.uri()
    ));
    std::fs::write(sandbox.path().join("notes.md"), "Three services talk over HTTP.").unwrap();

    let output = sandbox
        .run(
            &[
                "generate",
                "--model",
                "groq:llama-3.3-70b-versatile",
                "--prompt",
                "Tabulate the components",
                "--attach",
                "notes.md",
                "--export",
                "components",
            ],
            &[("GROQ_API_KEY", "gsk-test")],
        )
        .await;

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("| api | entry point |"));

    let csv = std::fs::read_to_string(sandbox.path().join("components.csv")).unwrap();
    assert_eq!(
        csv,
        "Component,Role\r\napi,entry point\r\ndb,\"storage, backups\"\r\n"
    );

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(
        body["messages"][0]["content"],
        "Tabulate the components\n\n--- notes.md ---\nThree services talk over HTTP."
    );
}

#[tokio::test]
async fn exhausted_quota_exits_with_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
            "error": {"message": "Insufficient Balance"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    sandbox.project_config(&format!(
        "[providers.deepseek]\nbase_endpoint = \"{}\"\n",
        server.uri()
    ));

    let output = sandbox
        .run(
            &["generate", "-p", "deepseek", "-m", "deepseek-chat", "--prompt", "hi"],
            &[("DEEPSEEK_API_KEY", "sk-test")],
        )
        .await;

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("quota exceeded (exhausted)"));
    assert!(stderr.contains("Insufficient Balance"));
}
