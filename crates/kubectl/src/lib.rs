//! Krex kubectl integration – the command-execution collaborator.
//!
//! Everything the rest of the workspace knows about the tool goes through
//! the [`CommandRunner`] trait: one call, one command line, exit code and
//! stdout back. The default runner spawns the configured binary per call.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use krex_core::ResourceTypeDescriptor;

/// Exit code and captured stdout of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResult {
    pub code: i32,
    pub stdout: String,
}

impl InvokeResult {
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}

/// Command-execution collaborator.
///
/// Implementations must be safe to call from concurrent browse
/// operations; each call is independent and carries no shared state.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn invoke(&self, command_line: &str) -> Result<InvokeResult>;
}

/// Runner configuration, constructed once at startup and handed down to
/// every component that talks to the tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KubectlConfig {
    /// Binary to spawn; `kubectl` when unset.
    pub binary: Option<PathBuf>,
    /// `--context` prepended to every call.
    pub context: Option<String>,
    /// `--kubeconfig` prepended to every call.
    pub kubeconfig: Option<PathBuf>,
}

/// Default runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct KubectlRunner {
    config: KubectlConfig,
}

impl KubectlRunner {
    pub fn new(config: KubectlConfig) -> Self {
        Self { config }
    }

    fn binary(&self) -> PathBuf {
        self.config
            .binary
            .clone()
            .unwrap_or_else(|| PathBuf::from("kubectl"))
    }
}

#[async_trait]
impl CommandRunner for KubectlRunner {
    async fn invoke(&self, command_line: &str) -> Result<InvokeResult> {
        let started = Instant::now();
        let binary = self.binary();
        let mut cmd = Command::new(&binary);
        if let Some(ctx) = &self.config.context {
            cmd.arg("--context").arg(ctx);
        }
        if let Some(path) = &self.config.kubeconfig {
            cmd.arg("--kubeconfig").arg(path);
        }
        cmd.args(command_line.split_whitespace());
        cmd.kill_on_drop(true);

        debug!(command = %command_line, "invoking tool");
        let output = cmd
            .output()
            .await
            .with_context(|| format!("spawning {}", binary.display()))?;
        let code = output.status.code().unwrap_or(-1);
        if code != 0 {
            warn!(command = %command_line, code, "tool exited non-zero");
        }

        counter!("krex_invocations_total", 1);
        histogram!("krex_invoke_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(InvokeResult {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Output mode for the raw `get` passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOutput {
    Plain,
    Wide,
    Yaml,
}

/// Command line for the resource listing report.
pub fn api_resources_command() -> String {
    "api-resources".to_string()
}

/// Command line for the recursive field report of one resource type.
pub fn explain_tree_command(resource: &ResourceTypeDescriptor) -> String {
    format!(
        "explain {} --api-version={} --recursive=true",
        resource.name, resource.api_version
    )
}

/// Command line for the prose documentation of one field path.
pub fn explain_path_command(resource: &ResourceTypeDescriptor, path: &str) -> String {
    format!(
        "explain --api-version={} --recursive=false {}",
        resource.api_version, path
    )
}

/// Command line for a raw object listing passthrough.
pub fn get_command(
    resource: &ResourceTypeDescriptor,
    output: GetOutput,
    all_namespaces: bool,
) -> String {
    let mut cmd = format!("get {}", resource.invoke_name());
    match output {
        GetOutput::Plain => {}
        GetOutput::Wide => cmd.push_str(" -o wide"),
        GetOutput::Yaml => cmd.push_str(" -o yaml"),
    }
    if all_namespaces {
        cmd.push_str(" -A");
    }
    cmd
}

/// Command line for a describe passthrough.
pub fn describe_command(resource: &ResourceTypeDescriptor, all_namespaces: bool) -> String {
    let mut cmd = format!("describe {}", resource.invoke_name());
    if all_namespaces {
        cmd.push_str(" -A");
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pods() -> ResourceTypeDescriptor {
        ResourceTypeDescriptor {
            name: "pods".to_string(),
            short_name: "po".to_string(),
            api_version: "v1".to_string(),
            namespaced: true,
            kind: "Pod".to_string(),
        }
    }

    #[test]
    fn command_lines_match_tool_grammar() {
        let rt = pods();
        assert_eq!(api_resources_command(), "api-resources");
        assert_eq!(
            explain_tree_command(&rt),
            "explain pods --api-version=v1 --recursive=true"
        );
        assert_eq!(
            explain_path_command(&rt, "pods.spec.containers"),
            "explain --api-version=v1 --recursive=false pods.spec.containers"
        );
        assert_eq!(get_command(&rt, GetOutput::Wide, true), "get po -o wide -A");
        assert_eq!(get_command(&rt, GetOutput::Yaml, false), "get po -o yaml");
        assert_eq!(describe_command(&rt, false), "describe po");
    }

    #[tokio::test]
    async fn runner_captures_stdout_and_exit_code() {
        let runner = KubectlRunner::new(KubectlConfig {
            binary: Some(PathBuf::from("echo")),
            ..Default::default()
        });
        let res = runner.invoke("api-resources").await.unwrap();
        assert!(res.succeeded());
        assert_eq!(res.stdout.trim(), "api-resources");
    }

    #[tokio::test]
    async fn runner_reports_non_zero_exit() {
        let runner = KubectlRunner::new(KubectlConfig {
            binary: Some(PathBuf::from("false")),
            ..Default::default()
        });
        let res = runner.invoke("").await.unwrap();
        assert!(!res.succeeded());
    }
}
