use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

use crate::catalog::Method;
use crate::error::FleetError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<String>,
    pub paginate: bool,
}

impl ApiRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            body: None,
            paginate: false,
        }
    }
}

/// One call of the `gh` tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    AuthStatus,
    Api(ApiRequest),
    AddTopic { repo: String, topic: String },
}

impl Invocation {
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::AuthStatus => vec!["auth".to_string(), "status".to_string()],
            Self::Api(request) => {
                let mut args = vec![
                    "api".to_string(),
                    request.endpoint.clone(),
                    "--method".to_string(),
                    request.method.as_str().to_string(),
                ];
                if request.body.is_some() {
                    args.push("--input".to_string());
                    args.push("-".to_string());
                }
                if request.paginate {
                    args.push("--paginate".to_string());
                }
                args
            }
            Self::AddTopic { repo, topic } => vec![
                "repo".to_string(),
                "edit".to_string(),
                repo.clone(),
                "--add-topic".to_string(),
                topic.clone(),
            ],
        }
    }

    pub fn stdin(&self) -> Option<&str> {
        match self {
            Self::Api(request) => request.body.as_deref(),
            _ => None,
        }
    }

    /// Shell-style rendering used in dry-run messages.
    pub fn command_line(&self) -> String {
        format!("gh {}", self.args().join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl GhOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Diagnostic text of a failed call: stderr, else stdout, else the exit code.
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("gh exited with status {}", self.code)
    }
}

/// The external collaborator. Implementations are shared across pool workers.
pub trait GhApi: Sync {
    /// Run one invocation to completion. `Err` means the process could not run at all.
    fn run(&self, invocation: &Invocation) -> Result<GhOutput>;

    /// Confirm the tool is installed and logged in.
    fn check_auth(&self) -> Result<(), FleetError>;
}

#[derive(Debug, Clone)]
pub struct GhCli {
    binary: String,
}

impl GhCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl GhApi for GhCli {
    fn run(&self, invocation: &Invocation) -> Result<GhOutput> {
        let args = invocation.args();
        debug!(binary = %self.binary, args = ?args, "running gh");

        let mut command = Command::new(&self.binary);
        command
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let input = invocation.stdin();
        command.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to execute {}", self.binary))?;
        if let (Some(body), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin
                .write_all(body.as_bytes())
                .with_context(|| format!("failed to write request body to {}", self.binary))?;
        }
        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for {}", self.binary))?;

        Ok(GhOutput {
            code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn check_auth(&self) -> Result<(), FleetError> {
        let status = Command::new(&self.binary)
            .args(Invocation::AuthStatus.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(_) => Err(FleetError::GhNotAuthenticated {
                binary: self.binary.clone(),
            }),
            Err(error) if error.kind() == ErrorKind::NotFound => Err(FleetError::GhNotFound {
                binary: self.binary.clone(),
            }),
            Err(error) => {
                debug!(error = %error, "gh auth status could not run");
                Err(FleetError::GhNotFound {
                    binary: self.binary.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_invocation_with_body_reads_stdin() {
        let invocation = Invocation::Api(ApiRequest {
            method: Method::Patch,
            endpoint: "/repos/acme/api".to_string(),
            body: Some("{}".to_string()),
            paginate: false,
        });
        assert_eq!(
            invocation.command_line(),
            "gh api /repos/acme/api --method PATCH --input -"
        );
        assert_eq!(invocation.stdin(), Some("{}"));
    }

    #[test]
    fn paginated_get_has_no_stdin() {
        let mut request = ApiRequest::get("/repos/acme/api/dependabot/alerts");
        request.paginate = true;
        let invocation = Invocation::Api(request);
        assert_eq!(
            invocation.args(),
            vec![
                "api",
                "/repos/acme/api/dependabot/alerts",
                "--method",
                "GET",
                "--paginate"
            ]
        );
        assert_eq!(invocation.stdin(), None);
    }

    #[test]
    fn add_topic_uses_repo_edit() {
        let invocation = Invocation::AddTopic {
            repo: "acme/api".to_string(),
            topic: "security".to_string(),
        };
        assert_eq!(
            invocation.command_line(),
            "gh repo edit acme/api --add-topic security"
        );
    }

    #[test]
    fn error_text_prefers_stderr_then_stdout() {
        let output = GhOutput {
            code: 1,
            stdout: "{\"message\":\"Not Found\"}\n".to_string(),
            stderr: "  gh: Not Found (HTTP 404)\n".to_string(),
        };
        assert_eq!(output.error_text(), "gh: Not Found (HTTP 404)");

        let output = GhOutput {
            code: 1,
            stdout: " partial ".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.error_text(), "partial");

        let output = GhOutput {
            code: 4,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(output.error_text(), "gh exited with status 4");
    }

    #[test]
    fn missing_binary_is_reported_as_not_found() {
        let cli = GhCli::new("repofleet-test-no-such-gh-binary");
        let error = cli.check_auth().expect_err("must fail");
        assert!(matches!(error, FleetError::GhNotFound { .. }));
    }

    #[cfg(unix)]
    mod process {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        use tempfile::tempdir;

        use super::*;

        fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
            path
        }

        fn cli_for(path: &Path) -> GhCli {
            GhCli::new(path.to_string_lossy().into_owned())
        }

        #[test]
        fn request_body_is_delivered_on_stdin() {
            let temp = tempdir().expect("tempdir");
            let script = write_script(temp.path(), "fake-gh", "cat");
            let invocation = Invocation::Api(ApiRequest {
                method: Method::Put,
                endpoint: "/repos/acme/api/vulnerability-alerts".to_string(),
                body: Some("{\"enabled\":true}".to_string()),
                paginate: false,
            });

            let output = cli_for(&script).run(&invocation).expect("run");
            assert!(output.success());
            assert_eq!(output.stdout, "{\"enabled\":true}");
            assert_eq!(output.stderr, "");
        }

        #[test]
        fn exit_code_and_streams_are_captured() {
            let temp = tempdir().expect("tempdir");
            let script = write_script(
                temp.path(),
                "fake-gh",
                "printf '%s ' \"$@\"\necho 'gh: Not Found (HTTP 404)' >&2\nexit 3",
            );
            let invocation = Invocation::Api(ApiRequest::get("/repos/acme/api"));

            let output = cli_for(&script).run(&invocation).expect("run");
            assert_eq!(output.code, 3);
            assert!(!output.success());
            assert_eq!(output.stdout, "api /repos/acme/api --method GET ");
            assert_eq!(output.stderr, "gh: Not Found (HTTP 404)\n");
            assert_eq!(output.error_text(), "gh: Not Found (HTTP 404)");
        }

        #[test]
        fn failing_auth_status_is_not_authenticated() {
            let error = GhCli::new("false").check_auth().expect_err("must fail");
            assert!(matches!(error, FleetError::GhNotAuthenticated { .. }));
        }

        #[test]
        fn passing_auth_status_is_ok() {
            GhCli::new("true").check_auth().expect("authenticated");
        }
    }
}
