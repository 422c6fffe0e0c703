//! Screenshot utilities for capturing Android device screen

use super::output;
use crate::error::Result;
use crate::executor::{adb_args, CommandRunner, ProcessExecutor, LONG_TIMEOUT, SHORT_TIMEOUT};
use base64::{engine::general_purpose, Engine as _};
use image::{ImageBuffer, ImageFormat, Rgb};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use tracing::{debug, warn};
use uuid::Uuid;

/// Size of the placeholder image returned when capture fails
pub const FALLBACK_WIDTH: u32 = 1080;
pub const FALLBACK_HEIGHT: u32 = 2400;

/// Represents a captured screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    /// Base64-encoded PNG
    pub base64_data: String,
    pub width: u32,
    pub height: u32,
    /// The device refused capture (secure surface); the image is a placeholder
    pub is_sensitive: bool,
}

/// Create a black fallback image when screenshot fails
fn create_fallback_screenshot(is_sensitive: bool, reason: &str) -> Result<Screenshot> {
    warn!("Creating fallback screenshot: {}", reason);

    let black_img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(FALLBACK_WIDTH, FALLBACK_HEIGHT, Rgb([0, 0, 0]));

    let mut buffer = Vec::new();
    black_img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;

    Ok(Screenshot {
        base64_data: general_purpose::STANDARD.encode(&buffer),
        width: FALLBACK_WIDTH,
        height: FALLBACK_HEIGHT,
        is_sensitive,
    })
}

/// What happened between `screencap` and decoding
enum Capture {
    Image(Screenshot),
    Refused(String),
    Failed(String),
}

/// Captures, transfers and decodes device screenshots
#[derive(Debug, Clone, Default)]
pub struct ScreenshotCapturer<R = ProcessExecutor> {
    runner: R,
}

impl ScreenshotCapturer<ProcessExecutor> {
    pub fn new() -> Self {
        Self::with_runner(ProcessExecutor::new())
    }
}

impl<R: CommandRunner> ScreenshotCapturer<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    /// Capture a screenshot from the connected Android device
    ///
    /// Always yields an image. When the device refuses capture the
    /// placeholder is flagged `is_sensitive`; any other failure gives the
    /// same placeholder unflagged. Only a failure to encode the placeholder
    /// itself is returned as an error.
    pub async fn capture(&self, device_id: Option<&str>, timeout: Duration) -> Result<Screenshot> {
        debug!("Capturing screenshot with device_id: {:?}", device_id);

        // Dropping the directory removes the pulled file on every path.
        let local_dir = match tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return create_fallback_screenshot(false, &format!("temp dir unavailable: {}", e))
            }
        };
        let local_path = local_dir.path().join("screenshot.png");
        let remote_path = format!("/sdcard/phone_adb_{}.png", Uuid::new_v4().simple());

        let capture = self
            .capture_to(&remote_path, &local_path, device_id, timeout)
            .await;

        self.remove_remote(&remote_path, device_id).await;

        match capture {
            Capture::Image(screenshot) => Ok(screenshot),
            Capture::Refused(reason) => create_fallback_screenshot(true, &reason),
            Capture::Failed(reason) => create_fallback_screenshot(false, &reason),
        }
    }

    async fn capture_to(
        &self,
        remote_path: &str,
        local_path: &Path,
        device_id: Option<&str>,
        timeout: Duration,
    ) -> Capture {
        let screencap = match self
            .runner
            .run(
                &adb_args(device_id, &["shell", "screencap", "-p", remote_path]),
                timeout,
            )
            .await
        {
            Ok(result) => result,
            Err(e) => return Capture::Failed(format!("screencap failed: {}", e)),
        };

        let combined = screencap.combined();
        debug!("screencap output: {}", combined);

        if output::is_screencap_refused(&combined) {
            return Capture::Refused(format!(
                "screencap refused (sensitive screen): {}",
                combined.trim()
            ));
        }
        if let Some(err) = output::device_error(&screencap, device_id) {
            return Capture::Failed(err.to_string());
        }

        let local_arg = local_path.to_string_lossy();
        let pull = match self
            .runner
            .run(
                &adb_args(device_id, &["pull", remote_path, &local_arg]),
                LONG_TIMEOUT,
            )
            .await
        {
            Ok(pull) => pull,
            Err(e) => return Capture::Failed(format!("adb pull failed: {}", e)),
        };

        if !pull.success() {
            return Capture::Failed(format!("adb pull failed: {}", pull.combined().trim()));
        }

        let bytes = match tokio::fs::read(local_path).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return Capture::Failed("Screenshot file is empty (0 bytes)".to_string()),
            Err(e) => return Capture::Failed(format!("Screenshot file unreadable: {}", e)),
        };

        debug!("Screenshot file size: {} bytes", bytes.len());

        match encode_png(&bytes) {
            Ok(screenshot) => Capture::Image(screenshot),
            Err(e) => Capture::Failed(format!("Failed to decode image: {}", e)),
        }
    }

    async fn remove_remote(&self, remote_path: &str, device_id: Option<&str>) {
        let args = adb_args(device_id, &["shell", "rm", "-f", remote_path]);
        if let Err(e) = self.runner.run(&args, SHORT_TIMEOUT).await {
            debug!("Could not remove {}: {}", remote_path, e);
        }
    }
}

/// Decode captured bytes and re-encode them as base64 PNG
fn encode_png(bytes: &[u8]) -> Result<Screenshot> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width(), img.height());

    debug!("Screenshot dimensions: {}x{}", width, height);

    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;

    Ok(Screenshot {
        base64_data: general_purpose::STANDARD.encode(&buffer),
        width,
        height,
        is_sensitive: false,
    })
}

/// Capture a screenshot with the default adb executor
pub async fn get_screenshot(device_id: Option<&str>, timeout: Duration) -> Result<Screenshot> {
    ScreenshotCapturer::new().capture(device_id, timeout).await
}
