//! Helm release and repository operations.
//!
//! Runs the `helm` binary as a subprocess with `-o json` and parses its
//! output, instead of reimplementing chart rendering and release storage.
//! Helm keeps ownership of its own state (release secrets, repo index);
//! this crate only drives it.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::Stdio;

use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum HelmError {
    #[error("helm io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("helm exited with {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("failed to parse helm output as JSON: {0}")]
    OutputParse(#[from] serde_json::Error),

    #[error("failed to serialize chart values: {0}")]
    Values(#[from] serde_yaml::Error),
}

/// Handle for running Helm operations against one cluster.
pub struct HelmClient {
    kubeconfig_path: Option<PathBuf>,
}

impl HelmClient {
    pub fn new(kubeconfig_path: Option<PathBuf>) -> Self {
        Self { kubeconfig_path }
    }

    /// List releases in a namespace, or across all namespaces when none
    /// is given.
    pub async fn list_releases(&self, namespace: Option<&str>) -> Result<Value, HelmError> {
        self.run_json(&list_args(namespace)).await
    }

    /// Status of one release, equivalent to `helm status -o json`.
    pub async fn get_release(&self, namespace: &str, release: &str) -> Result<Value, HelmError> {
        self.run_json(&status_args(namespace, release)).await
    }

    /// Revision history of one release.
    pub async fn release_history(
        &self,
        namespace: &str,
        release: &str,
    ) -> Result<Value, HelmError> {
        self.run_json(&history_args(namespace, release)).await
    }

    /// Install a chart. Values, when given, are passed through a
    /// temporary values file.
    pub async fn install_chart(
        &self,
        namespace: Option<&str>,
        release: &str,
        chart: &str,
        repo_url: Option<&str>,
        values: Option<&Value>,
    ) -> Result<Value, HelmError> {
        let values_file = values.map(write_values_file).transpose()?;
        let args = install_args(
            release,
            chart,
            namespace,
            repo_url,
            values_file.as_ref().map(|f| f.path().to_path_buf()),
        );
        self.run_json(&args).await
    }

    /// Upgrade an existing release to a new chart version or values.
    pub async fn upgrade_chart(
        &self,
        namespace: &str,
        release: &str,
        chart: &str,
        values: Option<&Value>,
    ) -> Result<Value, HelmError> {
        let values_file = values.map(write_values_file).transpose()?;
        let args = upgrade_args(
            release,
            chart,
            namespace,
            values_file.as_ref().map(|f| f.path().to_path_buf()),
        );
        self.run_json(&args).await
    }

    /// Uninstall a release. Helm prints a plain-text confirmation here,
    /// not JSON.
    pub async fn uninstall_chart(
        &self,
        namespace: &str,
        release: &str,
    ) -> Result<String, HelmError> {
        let stdout = self.run(&uninstall_args(namespace, release)).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Roll a release back to a previous revision (0 means the one
    /// before the current).
    pub async fn rollback_release(
        &self,
        namespace: &str,
        release: &str,
        revision: u32,
    ) -> Result<String, HelmError> {
        let stdout = self.run(&rollback_args(namespace, release, revision)).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Register a chart repository.
    pub async fn repo_add(&self, name: &str, url: &str) -> Result<String, HelmError> {
        let args: Vec<String> = ["repo", "add", name, url]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let stdout = self.run(&args).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// List registered chart repositories.
    pub async fn repo_list(&self) -> Result<Value, HelmError> {
        let args: Vec<String> = ["repo", "list", "-o", "json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.run_json(&args).await
    }

    async fn run_json(&self, args: &[String]) -> Result<Value, HelmError> {
        let stdout = self.run(args).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn run(&self, args: &[String]) -> Result<Vec<u8>, HelmError> {
        let mut command = Command::new("helm");
        command.args(args);
        if let Some(path) = &self.kubeconfig_path {
            command.arg("--kubeconfig").arg(path);
        }
        command.stdin(Stdio::null());

        tracing::debug!(?args, "running helm");
        let output = command.output().await?;
        if !output.status.success() {
            return Err(HelmError::CommandFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Serialize override values to a temporary YAML file for `-f`.
fn write_values_file(values: &Value) -> Result<NamedTempFile, HelmError> {
    let mut file = NamedTempFile::new()?;
    let yaml = serde_yaml::to_string(values)?;
    file.write_all(yaml.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn list_args(namespace: Option<&str>) -> Vec<String> {
    let mut args = vec!["list".to_string(), "-o".to_string(), "json".to_string()];
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) => {
            args.push("-n".to_string());
            args.push(ns.to_string());
        }
        None => args.push("--all-namespaces".to_string()),
    }
    args
}

fn status_args(namespace: &str, release: &str) -> Vec<String> {
    vec![
        "status".to_string(),
        release.to_string(),
        "-n".to_string(),
        namespace.to_string(),
        "-o".to_string(),
        "json".to_string(),
    ]
}

fn history_args(namespace: &str, release: &str) -> Vec<String> {
    vec![
        "history".to_string(),
        release.to_string(),
        "-n".to_string(),
        namespace.to_string(),
        "-o".to_string(),
        "json".to_string(),
    ]
}

fn install_args(
    release: &str,
    chart: &str,
    namespace: Option<&str>,
    repo_url: Option<&str>,
    values_file: Option<PathBuf>,
) -> Vec<String> {
    let mut args = vec![
        "install".to_string(),
        release.to_string(),
        chart.to_string(),
        "-o".to_string(),
        "json".to_string(),
    ];
    if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
        args.push("-n".to_string());
        args.push(ns.to_string());
        args.push("--create-namespace".to_string());
    }
    if let Some(url) = repo_url.filter(|u| !u.is_empty()) {
        args.push("--repo".to_string());
        args.push(url.to_string());
    }
    if let Some(path) = values_file {
        args.push("-f".to_string());
        args.push(path.display().to_string());
    }
    args
}

fn upgrade_args(
    release: &str,
    chart: &str,
    namespace: &str,
    values_file: Option<PathBuf>,
) -> Vec<String> {
    let mut args = vec![
        "upgrade".to_string(),
        release.to_string(),
        chart.to_string(),
        "-n".to_string(),
        namespace.to_string(),
        "-o".to_string(),
        "json".to_string(),
    ];
    if let Some(path) = values_file {
        args.push("-f".to_string());
        args.push(path.display().to_string());
    }
    args
}

fn uninstall_args(namespace: &str, release: &str) -> Vec<String> {
    vec![
        "uninstall".to_string(),
        release.to_string(),
        "-n".to_string(),
        namespace.to_string(),
    ]
}

fn rollback_args(namespace: &str, release: &str, revision: u32) -> Vec<String> {
    vec![
        "rollback".to_string(),
        release.to_string(),
        revision.to_string(),
        "-n".to_string(),
        namespace.to_string(),
    ]
}
