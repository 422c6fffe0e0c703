//! ADB connection management for local and remote devices

use super::output::{self, ConnectOutcome};
use super::settle;
use crate::config::{TimingConfig, TIMING_CONFIG};
use crate::error::{AdbError, Result};
use crate::executor::{adb_args, CommandRunner, ProcessExecutor, LONG_TIMEOUT, SHORT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Port adb listens on in TCP/IP mode unless told otherwise
pub const DEFAULT_ADB_PORT: u16 = 5555;

/// Type of ADB connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    Usb,
    Wifi,
    Remote,
}

/// Information about a connected device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub status: String,
    pub connection_type: ConnectionType,
    pub model: Option<String>,
    pub android_version: Option<String>,
}

/// Append the default port when `address` has none
pub fn normalize_address(address: &str) -> String {
    if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", address, DEFAULT_ADB_PORT)
    }
}

/// Manages ADB connections to Android devices
#[derive(Debug, Clone)]
pub struct AdbConnection<R = ProcessExecutor> {
    runner: R,
    timing: Arc<TimingConfig>,
}

impl AdbConnection<ProcessExecutor> {
    /// Create a new ADB connection manager
    pub fn new() -> Self {
        Self::with_runner(ProcessExecutor::new(), TIMING_CONFIG.clone())
    }

    /// Create a new ADB connection manager with custom ADB path
    pub fn with_path(adb_path: impl Into<String>) -> Self {
        Self::with_runner(ProcessExecutor::with_path(adb_path), TIMING_CONFIG.clone())
    }
}

impl Default for AdbConnection<ProcessExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> AdbConnection<R> {
    pub fn with_runner(runner: R, timing: Arc<TimingConfig>) -> Self {
        Self { runner, timing }
    }

    /// Connect to a remote device via TCP/IP
    pub async fn connect(&self, address: &str, timeout: Duration) -> Result<String> {
        let address = normalize_address(address);

        let result = self
            .runner
            .run(&adb_args(None, &["connect", &address]), timeout)
            .await?;

        match output::parse_connect_output(&result.combined()) {
            ConnectOutcome::Connected => {
                info!("Connected to {}", address);
                Ok(format!("Connected to {}", address))
            }
            ConnectOutcome::AlreadyConnected => Ok(format!("Already connected to {}", address)),
            ConnectOutcome::Failed(reason) => Err(AdbError::ConnectionFailed(if reason.is_empty() {
                format!("no response connecting to {}", address)
            } else {
                reason
            })),
        }
    }

    /// Disconnect from a remote device, or from every device when `address` is `None`
    pub async fn disconnect(&self, address: Option<&str>) -> Result<String> {
        let mut args = vec!["disconnect"];
        if let Some(addr) = address {
            args.push(addr);
        }

        let result = self.runner.run(&adb_args(None, &args), SHORT_TIMEOUT).await?;

        let message = result.combined().trim().to_string();
        info!("Disconnected {}", address.unwrap_or("all devices"));
        Ok(if message.is_empty() {
            "Disconnected".to_string()
        } else {
            message
        })
    }

    /// List all connected devices
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let result = self
            .runner
            .run(&adb_args(None, &["devices", "-l"]), SHORT_TIMEOUT)
            .await?;

        Ok(output::parse_devices(&result.stdout_lossy()))
    }

    /// Get detailed information about a device
    ///
    /// Without a device id the first listed device is described. Returns
    /// `None` when no matching device is attached.
    pub async fn get_device_info(&self, device_id: Option<&str>) -> Result<Option<DeviceInfo>> {
        let devices = self.list_devices().await?;

        let found = match device_id {
            Some(id) => devices.into_iter().find(|d| d.device_id == id),
            None => devices.into_iter().next(),
        };

        let Some(mut info) = found else {
            return Ok(None);
        };

        if info.status == "device" {
            info.android_version = self.get_android_version(Some(&info.device_id)).await?;
        }

        Ok(Some(info))
    }

    /// Look a device up in the current listing, failing if it is absent
    pub async fn require_device(&self, device_id: &str) -> Result<DeviceInfo> {
        self.list_devices()
            .await?
            .into_iter()
            .find(|d| d.device_id == device_id)
            .ok_or_else(|| AdbError::DeviceNotFound(device_id.to_string()))
    }

    /// Check if a device is connected
    pub async fn is_connected(&self, device_id: Option<&str>) -> Result<bool> {
        let devices = self.list_devices().await?;

        Ok(match device_id {
            Some(id) => devices
                .iter()
                .any(|d| d.device_id == id && d.status == "device"),
            None => devices.iter().any(|d| d.status == "device"),
        })
    }

    /// Read `ro.build.version.release`
    pub async fn get_android_version(&self, device_id: Option<&str>) -> Result<Option<String>> {
        let result = self
            .runner
            .run(
                &adb_args(
                    device_id,
                    &["shell", "getprop", "ro.build.version.release"],
                ),
                LONG_TIMEOUT,
            )
            .await?;

        if let Some(err) = output::device_error(&result, device_id) {
            return Err(err);
        }

        let version = result.stdout_lossy().trim().to_string();
        Ok((!version.is_empty()).then_some(version))
    }

    /// Enable TCP/IP debugging on a USB-connected device
    ///
    /// Waits `adb_restart_delay` afterwards so the restarting daemon can
    /// settle before the caller talks to it again.
    pub async fn enable_tcpip(&self, port: u16, device_id: Option<&str>) -> Result<String> {
        let port_arg = port.to_string();
        let result = self
            .runner
            .run(&adb_args(device_id, &["tcpip", &port_arg]), LONG_TIMEOUT)
            .await?;

        if let Some(err) = output::device_error(&result, device_id) {
            return Err(err);
        }

        if !output::parse_tcpip_output(&result) {
            return Err(AdbError::CommandFailed(result.combined().trim().to_string()));
        }

        settle(self.timing.connection.adb_restart_delay).await;
        info!("TCP/IP mode enabled on port {}", port);
        Ok(format!("TCP/IP mode enabled on port {}", port))
    }

    /// Get the IP address of a connected device
    ///
    /// `None` means the device has no address yet, which is not an error.
    pub async fn get_device_ip(&self, device_id: Option<&str>) -> Result<Option<String>> {
        let route = self
            .runner
            .run(&adb_args(device_id, &["shell", "ip", "route"]), SHORT_TIMEOUT)
            .await?;

        if let Some(err) = output::device_error(&route, device_id) {
            return Err(err);
        }

        if let Some(ip) = output::parse_route_src(&route.stdout_lossy()) {
            return Ok(Some(ip));
        }

        let addr = self
            .runner
            .run(
                &adb_args(device_id, &["shell", "ip", "addr", "show", "wlan0"]),
                SHORT_TIMEOUT,
            )
            .await?;

        Ok(output::parse_inet_addr(&addr.stdout_lossy()))
    }

    /// Restart the ADB server
    ///
    /// The start step runs even when the kill step fails or finds no server.
    pub async fn restart_server(&self) -> Result<String> {
        if let Err(e) = self
            .runner
            .run(&adb_args(None, &["kill-server"]), SHORT_TIMEOUT)
            .await
        {
            warn!("kill-server failed, starting anyway: {}", e);
        }

        settle(self.timing.connection.server_restart_delay).await;

        self.runner
            .run(&adb_args(None, &["start-server"]), SHORT_TIMEOUT)
            .await?;

        info!("ADB server restarted");
        Ok("ADB server restarted".to_string())
    }
}

/// Quick helper to connect to a remote device
pub async fn quick_connect(address: &str) -> Result<String> {
    let conn = AdbConnection::new();
    conn.connect(address, Duration::from_secs(10)).await
}

/// Quick helper to list connected devices
pub async fn list_devices() -> Result<Vec<DeviceInfo>> {
    let conn = AdbConnection::new();
    conn.list_devices().await
}
