use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// A program to run, where, and with which extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Shell-ish rendering for logs.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.envs.len() + self.args.len() + 1);
        for (k, v) in &self.envs {
            parts.push(format!("{}={}", k, v));
        }
        parts.push(self.program.display().to_string());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Backend trait: run a process to completion and report its exit status.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> anyhow::Result<ExitStatus>;
}

/// Local backend: spawns on the host with the parent's stdio inherited.
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self { Self {} }
}

impl Default for LocalBackend {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn run(&self, invocation: &Invocation) -> anyhow::Result<ExitStatus> {
        let mut c = Command::new(&invocation.program);
        c.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = c
            .status()
            .await
            .with_context(|| format!("local backend failed to run {:?}", invocation.program))?;
        Ok(status)
    }
}
