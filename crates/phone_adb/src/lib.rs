//! phone_adb: Android device automation through adb
//!
//! This library turns automation intents into `adb` invocations:
//! - Connection management (connect, disconnect, device listing, TCP/IP mode)
//! - Gestures and navigation (tap, swipe, long press, back, home, app launch)
//! - Text input through the ADB Keyboard companion IME
//! - Screenshot capture with placeholder images when capture is impossible
//!
//! Every operation waits for its configured settle delay before returning.
//! Delays come from [`TimingConfig`], resolved once from `PHONE_AGENT_*`
//! environment variables.
//!
//! # Example
//!
//! ```no_run
//! use phone_adb::AdbClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> phone_adb::Result<()> {
//!     let client = AdbClient::new();
//!
//!     client.connection().connect("192.168.1.100", Duration::from_secs(10)).await?;
//!     client.device().launch_app("Chrome", None, None).await?;
//!     client.device().tap(540, 1200, None, None).await?;
//!
//!     let shot = client.screenshot().capture(None, Duration::from_secs(10)).await?;
//!     println!("{}x{} sensitive={}", shot.width, shot.height, shot.is_sensitive);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;
pub mod executor;

// Configuration module
pub mod config;

// Device backend
pub mod adb;

// Re-export commonly used types and functions
pub use error::{AdbError, Result};

// Config re-exports
pub use config::{
    get_app_name, get_package_name, list_supported_apps, ActionTimingConfig,
    ConnectionTimingConfig, DeviceTimingConfig, TimingConfig, APP_PACKAGES, TIMING_CONFIG,
};

// Executor re-exports
pub use executor::{adb_args, CommandRunner, ExecutionResult, ProcessExecutor};

// ADB re-exports
pub use adb::{
    get_screenshot, list_devices, quick_connect, swipe_duration_ms, AdbClient, AdbConnection,
    ConnectionType, DeviceController, DeviceInfo, Screenshot, ScreenshotCapturer, TextInput,
};
