//! # castkeep-adapter-catt
//!
//! Cast transport adapter backed by the `catt` command-line tool.
//!
//! Each command spawns one short-lived `catt` process addressed at the
//! device by name (`catt -d <device> …`) and enforces a deadline; a
//! process still running at the deadline is killed and reported as a
//! timeout. castkeep never parses `catt scan` output — devices are
//! addressed by the names the configuration declares.
//!
//! ## Dependency rule
//! Depends on `castkeep-app` (port traits) and `castkeep-domain` only.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use castkeep_app::ports::CastTransport;
use castkeep_domain::error::TransportError;

/// Default per-command deadline.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// [`CastTransport`] implementation that shells out to `catt`.
#[derive(Debug, Clone)]
pub struct CattTransport {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for CattTransport {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("catt"),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl CattTransport {
    /// Transport using `catt` from `PATH` with the default deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit `catt` binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Use an explicit per-command deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Spawn one `catt -d <device> <args…>` invocation and collect stdout.
    async fn run(&self, device: &str, args: &[&str]) -> Result<String, TransportError> {
        tracing::debug!(device, ?args, "running catt command");
        let child = Command::new(&self.binary)
            .arg("-d")
            .arg(device)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| TransportError::DeviceUnreachable(format!("failed to launch catt: {err}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(|err| TransportError::DeviceUnreachable(err.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                format!("catt exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            tracing::debug!(device, %reason, "catt command rejected");
            Err(TransportError::CommandRejected(reason))
        }
    }
}

impl CastTransport for CattTransport {
    async fn cast(&self, device: &str, url: &str) -> Result<(), TransportError> {
        self.run(device, &["cast_site", url]).await.map(drop)
    }

    async fn stop(&self, device: &str) -> Result<(), TransportError> {
        self.run(device, &["stop"]).await.map(drop)
    }

    async fn set_volume(&self, device: &str, percent: u8) -> Result<(), TransportError> {
        self.run(device, &["volume", &percent.to_string()])
            .await
            .map(drop)
    }

    async fn query_status(&self, device: &str) -> Result<String, TransportError> {
        self.run(device, &["status"]).await
    }
}
