//! kubectl proxy management
//!
//! The control plane is reached through a local `kubectl proxy`, which
//! handles authentication. The proxy is a scoped resource:
//! - Spawned before the verification sequence starts
//! - Considered ready once its port accepts TCP connections
//! - Killed when the sequence ends, or when the guard is dropped

use std::net::SocketAddr;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::ProxyConfig;

const READY_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised while bringing the proxy up
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to start proxy process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("proxy exited before becoming ready: {0}")]
    Exited(ExitStatus),

    #[error("proxy did not accept connections on {addr} within {timeout:?}")]
    StartupTimeout { addr: SocketAddr, timeout: Duration },
}

/// A running proxy process, killed when released
pub struct KubectlProxy {
    child: Child,
    addr: SocketAddr,
}

impl KubectlProxy {
    /// Starts `kubectl proxy` on the configured port and waits until it is ready
    pub async fn spawn(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let mut command = Command::new(&config.program);
        command.arg("proxy").arg(format!("--port={}", config.port));

        let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
        Self::spawn_command(command, addr, config.startup_timeout).await
    }

    /// Starts `command` and waits until `addr` accepts connections
    pub async fn spawn_command(
        mut command: Command,
        addr: SocketAddr,
        startup_timeout: Duration,
    ) -> Result<Self, ProxyError> {
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(ProxyError::Spawn)?;

        info!("Started proxy process (pid {:?}) for {}", child.id(), addr);

        let mut proxy = Self { child, addr };
        proxy.wait_ready(startup_timeout).await?;

        info!("Proxy is accepting connections on {}", addr);
        Ok(proxy)
    }

    /// Address the proxy listens on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn wait_ready(&mut self, startup_timeout: Duration) -> Result<(), ProxyError> {
        let deadline = Instant::now() + startup_timeout;

        loop {
            if let Some(status) = self.child.try_wait().map_err(ProxyError::Spawn)? {
                return Err(ProxyError::Exited(status));
            }

            match TcpStream::connect(self.addr).await {
                Ok(_) => return Ok(()),
                Err(e) => debug!("Proxy on {} not ready yet: {}", self.addr, e),
            }

            if Instant::now() >= deadline {
                return Err(ProxyError::StartupTimeout {
                    addr: self.addr,
                    timeout: startup_timeout,
                });
            }

            time::sleep(READY_CHECK_INTERVAL).await;
        }
    }

    /// Terminates the proxy process and reaps it
    pub async fn shutdown(mut self) {
        match self.child.kill().await {
            Ok(()) => info!("Proxy on {} stopped", self.addr),
            Err(e) => warn!("Failed to stop proxy on {}: {}", self.addr, e),
        }
    }
}
