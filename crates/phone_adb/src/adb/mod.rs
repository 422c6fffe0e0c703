//! ADB (Android Debug Bridge) module for Android device control
//!
//! This module provides:
//! - `connection`: ADB connection management
//! - `device`: Device control operations (tap, swipe, back, home, etc.)
//! - `input`: Text input handling
//! - `screenshot`: Screenshot capture
//! - `output`: Parsers for adb's text output

mod connection;
mod device;
mod input;
pub mod output;
mod screenshot;

pub use connection::{
    list_devices, normalize_address, quick_connect, AdbConnection, ConnectionType, DeviceInfo,
    DEFAULT_ADB_PORT,
};
pub use device::{swipe_duration_ms, DeviceController, SYSTEM_HOME};
pub use input::{TextInput, ADB_KEYBOARD_IME};
pub use screenshot::{
    get_screenshot, Screenshot, ScreenshotCapturer, FALLBACK_HEIGHT, FALLBACK_WIDTH,
};

use crate::config::{TimingConfig, TIMING_CONFIG};
use crate::executor::{CommandRunner, ProcessExecutor};
use std::sync::Arc;
use std::time::Duration;

/// Sleep for a settle delay given in seconds
///
/// Zero, negative and non-finite values do not wait.
pub(crate) async fn settle(seconds: f64) {
    if let Ok(delay) = Duration::try_from_secs_f64(seconds) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// All adb components sharing one runner and one timing configuration
#[derive(Debug, Clone)]
pub struct AdbClient<R = ProcessExecutor> {
    connection: AdbConnection<R>,
    device: DeviceController<R>,
    input: TextInput<R>,
    screenshot: ScreenshotCapturer<R>,
}

impl AdbClient<ProcessExecutor> {
    /// Client for `adb` on `PATH` using the global timing configuration
    pub fn new() -> Self {
        Self::with_runner(ProcessExecutor::new(), TIMING_CONFIG.clone())
    }
}

impl Default for AdbClient<ProcessExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner + Clone> AdbClient<R> {
    pub fn with_runner(runner: R, timing: Arc<TimingConfig>) -> Self {
        Self {
            connection: AdbConnection::with_runner(runner.clone(), Arc::clone(&timing)),
            device: DeviceController::with_runner(runner.clone(), Arc::clone(&timing)),
            input: TextInput::with_runner(runner.clone(), timing),
            screenshot: ScreenshotCapturer::with_runner(runner),
        }
    }

    pub fn connection(&self) -> &AdbConnection<R> {
        &self.connection
    }

    pub fn device(&self) -> &DeviceController<R> {
        &self.device
    }

    pub fn input(&self) -> &TextInput<R> {
        &self.input
    }

    pub fn screenshot(&self) -> &ScreenshotCapturer<R> {
        &self.screenshot
    }
}
