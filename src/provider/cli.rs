use super::{ApiCall, ApiOutput, CloudApi};
use crate::{config, errors::{AppError, AppResult}};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::{path::PathBuf, process::Stdio, time::Instant};
use tokio::{process::Command, time::{timeout, Duration}};

/// Executes provider operations through the `aws` command line client, which
/// owns credential resolution, request signing, retries and pagination.
pub struct AwsCli {
    program: PathBuf,
    timeout_s: u64,
}

impl AwsCli {
    pub fn new(cfg: &config::Aws) -> Self {
        let program = match resolve_program(&cfg.cli_path) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(cli_path = %cfg.cli_path, error = %e, "aws cli not resolved; calls will fail until it is installed");
                PathBuf::from(&cfg.cli_path)
            }
        };
        Self { program, timeout_s: cfg.command_timeout_s }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

fn resolve_program(cmd: &str) -> anyhow::Result<PathBuf> {
    let path = if cmd.contains('/') { PathBuf::from(cmd) } else { which::which(cmd)? };
    Ok(dunce::canonicalize(path)?)
}

#[async_trait]
impl CloudApi for AwsCli {
    async fn call(&self, call: ApiCall) -> AppResult<ApiOutput> {
        let label = format!("{} {}", call.service, call.operation);
        let scratch = tempfile::tempdir().map_err(|e| AppError::Internal(e.to_string()))?;

        let mut command = Command::new(&self.program);
        command.arg(call.service).arg(call.operation);
        if call.input.as_object().map(|m| !m.is_empty()).unwrap_or(false) {
            command.arg("--cli-input-json").arg(call.input.to_string());
        }
        command.args(["--output", "json", "--region", call.region.as_str()]);
        if let Some(profile) = &call.profile {
            command.args(["--profile", profile.as_str()]);
        }
        if let Some(body) = &call.upload {
            let path = scratch.path().join("upload");
            tokio::fs::write(&path, body).await.map_err(|e| AppError::Internal(e.to_string()))?;
            command.arg("--body").arg(&path);
        }
        let outfile = scratch.path().join("download");
        if call.download {
            command.arg(&outfile);
        }
        command.env("AWS_PAGER", "");
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        tracing::debug!(operation = %label, profile = ?call.profile, region = %call.region, "invoking aws cli");
        let started = Instant::now();
        let child = command
            .spawn()
            .map_err(|e| AppError::Internal(format!("failed to spawn {}: {e}", self.program.display())))?;
        let out = match timeout(Duration::from_secs(self.timeout_s), child.wait_with_output()).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) => return Err(AppError::Internal(e.to_string())),
            Err(_) => return Err(AppError::Timeout(label)),
        };
        tracing::debug!(
            operation = %label,
            exit_code = out.status.code(),
            duration_ms = started.elapsed().as_millis() as u64,
            "aws cli finished"
        );

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let (code, message) = parse_cli_error(&stderr);
            return Err(AppError::Downstream { operation: label, code, message });
        }

        let output = if out.stdout.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&out.stdout)
                .map_err(|e| AppError::Internal(format!("unparseable output from {label}: {e}")))?
        };
        let body = if call.download {
            let data = tokio::fs::read(&outfile).await.map_err(|e| AppError::Internal(e.to_string()))?;
            Some(Bytes::from(data))
        } else {
            None
        };
        Ok(ApiOutput { output, body })
    }
}

/// Splits `An error occurred (Code) when calling the Op operation: text` into code and text.
fn parse_cli_error(stderr: &str) -> (Option<String>, String) {
    let trimmed = stderr.trim();
    let code = trimmed
        .split_once("An error occurred (")
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(code, _)| code.to_string());
    let message = if trimmed.is_empty() { "aws cli exited with an error".to_string() } else { trimmed.to_string() };
    (code, message)
}
