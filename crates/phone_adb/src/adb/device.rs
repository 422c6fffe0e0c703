//! Device control utilities for Android automation
//!
//! Every gesture waits for its settle delay before returning. The delay
//! covers the device's own UI animation, so the next action sees a stable
//! screen.

use super::output;
use super::settle;
use crate::config::{get_app_name, get_package_name, TimingConfig, TIMING_CONFIG};
use crate::error::{AdbError, Result};
use crate::executor::{
    adb_args, CommandRunner, ExecutionResult, ProcessExecutor, LONG_TIMEOUT, SHORT_TIMEOUT,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Label returned when the focused window belongs to no known app
pub const SYSTEM_HOME: &str = "System Home";

const MIN_SWIPE_MS: i64 = 1000;
const MAX_SWIPE_MS: i64 = 2000;

/// Swipe duration derived from squared pixel distance
///
/// `clamp(dist² / 1000, 1000, 2000)` milliseconds.
pub fn swipe_duration_ms(start_x: i32, start_y: i32, end_x: i32, end_y: i32) -> u32 {
    let dx = i64::from(start_x) - i64::from(end_x);
    let dy = i64::from(start_y) - i64::from(end_y);
    let dist_sq = dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy));
    (dist_sq / 1000).clamp(MIN_SWIPE_MS, MAX_SWIPE_MS) as u32
}

/// Gesture and navigation primitives
#[derive(Debug, Clone)]
pub struct DeviceController<R = ProcessExecutor> {
    runner: R,
    timing: Arc<TimingConfig>,
}

impl DeviceController<ProcessExecutor> {
    pub fn new() -> Self {
        Self::with_runner(ProcessExecutor::new(), TIMING_CONFIG.clone())
    }
}

impl Default for DeviceController<ProcessExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> DeviceController<R> {
    pub fn with_runner(runner: R, timing: Arc<TimingConfig>) -> Self {
        Self { runner, timing }
    }

    /// Run `adb [-s id] shell <args>` and check for a missing device
    async fn shell(&self, device_id: Option<&str>, args: &[&str]) -> Result<ExecutionResult> {
        let mut full = vec!["shell"];
        full.extend_from_slice(args);

        let timeout = match args.first() {
            Some(&"monkey") | Some(&"dumpsys") => LONG_TIMEOUT,
            _ => SHORT_TIMEOUT,
        };

        let result = self.runner.run(&adb_args(device_id, &full), timeout).await?;

        if let Some(err) = output::device_error(&result, device_id) {
            warn!("{}", err);
            return Err(err);
        }

        Ok(result)
    }

    async fn input_tap(&self, x: i32, y: i32, device_id: Option<&str>) -> Result<()> {
        let (x, y) = (x.to_string(), y.to_string());
        self.shell(device_id, &["input", "tap", &x, &y]).await?;
        Ok(())
    }

    /// Get the currently focused app name
    ///
    /// Home screen and unknown apps both come back as [`SYSTEM_HOME`].
    pub async fn get_current_app(&self, device_id: Option<&str>) -> Result<String> {
        let result = self.shell(device_id, &["dumpsys", "window"]).await?;
        let stdout = result.stdout_lossy();

        if stdout.is_empty() {
            return Err(AdbError::CommandFailed(
                "No output from dumpsys window".to_string(),
            ));
        }

        let app = output::parse_focused_package(&stdout)
            .as_deref()
            .and_then(get_app_name)
            .unwrap_or(SYSTEM_HOME);

        debug!("Current app: {}", app);
        Ok(app.to_string())
    }

    /// Tap at the specified coordinates
    pub async fn tap(
        &self,
        x: i32,
        y: i32,
        device_id: Option<&str>,
        delay: Option<f64>,
    ) -> Result<()> {
        let delay = delay.unwrap_or(self.timing.device.default_tap_delay);

        self.input_tap(x, y, device_id).await?;

        settle(delay).await;
        Ok(())
    }

    /// Double tap at the specified coordinates
    pub async fn double_tap(
        &self,
        x: i32,
        y: i32,
        device_id: Option<&str>,
        delay: Option<f64>,
    ) -> Result<()> {
        let delay = delay.unwrap_or(self.timing.device.default_double_tap_delay);

        self.input_tap(x, y, device_id).await?;
        settle(self.timing.device.double_tap_interval).await;
        self.input_tap(x, y, device_id).await?;

        settle(delay).await;
        Ok(())
    }

    /// Long press at the specified coordinates
    ///
    /// adb has no long-press primitive, so this is a swipe that does not move.
    pub async fn long_press(
        &self,
        x: i32,
        y: i32,
        duration_ms: u32,
        device_id: Option<&str>,
        delay: Option<f64>,
    ) -> Result<()> {
        let delay = delay.unwrap_or(self.timing.device.default_long_press_delay);
        let (x, y, duration) = (x.to_string(), y.to_string(), duration_ms.to_string());

        self.shell(device_id, &["input", "swipe", &x, &y, &x, &y, &duration])
            .await?;

        settle(delay).await;
        Ok(())
    }

    /// Swipe from start to end coordinates
    ///
    /// Without an explicit duration one is derived with [`swipe_duration_ms`].
    /// An explicit duration, zero included, is passed to the device unchanged.
    #[allow(clippy::too_many_arguments)]
    pub async fn swipe(
        &self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration_ms: Option<u32>,
        device_id: Option<&str>,
        delay: Option<f64>,
    ) -> Result<()> {
        let delay = delay.unwrap_or(self.timing.device.default_swipe_delay);
        let duration_ms =
            duration_ms.unwrap_or_else(|| swipe_duration_ms(start_x, start_y, end_x, end_y));

        let coords = [start_x, start_y, end_x, end_y].map(|v| v.to_string());
        let duration = duration_ms.to_string();

        self.shell(
            device_id,
            &[
                "input", "swipe", &coords[0], &coords[1], &coords[2], &coords[3], &duration,
            ],
        )
        .await?;

        settle(delay).await;
        Ok(())
    }

    /// Press the back button
    pub async fn back(&self, device_id: Option<&str>, delay: Option<f64>) -> Result<()> {
        let delay = delay.unwrap_or(self.timing.device.default_back_delay);

        self.shell(device_id, &["input", "keyevent", "4"]).await?;

        settle(delay).await;
        Ok(())
    }

    /// Press the home button
    pub async fn home(&self, device_id: Option<&str>, delay: Option<f64>) -> Result<()> {
        let delay = delay.unwrap_or(self.timing.device.default_home_delay);

        self.shell(device_id, &["input", "keyevent", "KEYCODE_HOME"])
            .await?;

        settle(delay).await;
        Ok(())
    }

    /// Launch an app by name
    ///
    /// Returns `Ok(false)` when the name is not in the app table.
    pub async fn launch_app(
        &self,
        app_name: &str,
        device_id: Option<&str>,
        delay: Option<f64>,
    ) -> Result<bool> {
        let delay = delay.unwrap_or(self.timing.device.default_launch_delay);

        let Some(package) = get_package_name(app_name) else {
            debug!("No package mapped for app {:?}", app_name);
            return Ok(false);
        };

        self.shell(
            device_id,
            &[
                "monkey",
                "-p",
                package,
                "-c",
                "android.intent.category.LAUNCHER",
                "1",
            ],
        )
        .await?;

        settle(delay).await;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::mock::ScriptedRunner;
    use std::time::Duration;
    use tokio::time::Instant;

    fn controller(runner: &ScriptedRunner) -> DeviceController<ScriptedRunner> {
        DeviceController::with_runner(runner.clone(), Arc::new(TimingConfig::default()))
    }

    fn dumpsys(text: &'static str) -> ScriptedRunner {
        ScriptedRunner::new(move |_| Ok(ExecutionResult::from_output(0, text, "")))
    }

    #[test]
    fn test_swipe_duration_clamps() {
        assert_eq!(swipe_duration_ms(0, 0, 10, 10), 1000);
        assert_eq!(swipe_duration_ms(0, 0, 500, 500), 1000);
        assert_eq!(swipe_duration_ms(0, 0, 1200, 0), 1440);
        assert_eq!(swipe_duration_ms(0, 0, 1500, 0), 2000);
        assert_eq!(swipe_duration_ms(1200, 0, 0, 0), 1440);
        assert_eq!(swipe_duration_ms(i32::MIN, i32::MIN, i32::MAX, i32::MAX), 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_waits_default_delay() {
        let runner = ScriptedRunner::succeeding();
        let started = Instant::now();

        controller(&runner).tap(500, 300, None, None).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(runner.calls(), vec![vec!["shell", "input", "tap", "500", "300"]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_on_offline_device_fails() {
        let runner = ScriptedRunner::new(|_| {
            Ok(ExecutionResult::from_output(1, "", "error: device offline\n"))
        });

        let err = controller(&runner)
            .tap(500, 300, Some("R58M"), Some(0.0))
            .await
            .unwrap_err();

        assert!(matches!(err, AdbError::DeviceNotFound(id) if id == "R58M"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_tap_interval_then_delay() {
        let runner = ScriptedRunner::succeeding();
        let started = Instant::now();

        controller(&runner)
            .double_tap(10, 20, Some("emulator-5554"), Some(0.5))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(600));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(runner.call_count(), 2);
        assert_eq!(
            runner.calls()[1],
            vec!["-s", "emulator-5554", "shell", "input", "tap", "10", "20"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_press_is_stationary_swipe() {
        let runner = ScriptedRunner::succeeding();
        controller(&runner)
            .long_press(100, 200, 3000, None, Some(0.0))
            .await
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![vec!["shell", "input", "swipe", "100", "200", "100", "200", "3000"]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_swipe_derives_duration() {
        let runner = ScriptedRunner::succeeding();
        controller(&runner)
            .swipe(0, 0, 500, 500, None, None, None)
            .await
            .unwrap();
        controller(&runner)
            .swipe(0, 0, 1500, 0, None, None, None)
            .await
            .unwrap();

        assert_eq!(runner.calls()[0].last().unwrap(), "1000");
        assert_eq!(runner.calls()[1].last().unwrap(), "2000");
    }

    #[tokio::test(start_paused = true)]
    async fn test_swipe_explicit_zero_duration_passes_through() {
        let runner = ScriptedRunner::succeeding();
        controller(&runner)
            .swipe(0, 0, 500, 500, Some(0), None, None)
            .await
            .unwrap();

        assert_eq!(runner.calls()[0].last().unwrap(), "0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_delay_does_not_wait() {
        let runner = ScriptedRunner::succeeding();
        let started = Instant::now();

        controller(&runner).back(None, Some(-1.0)).await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(runner.calls(), vec![vec!["shell", "input", "keyevent", "4"]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_home_keyevent() {
        let runner = ScriptedRunner::succeeding();
        controller(&runner).home(None, None).await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![vec!["shell", "input", "keyevent", "KEYCODE_HOME"]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_known_app() {
        let runner = ScriptedRunner::succeeding();
        let launched = controller(&runner)
            .launch_app("Chrome", None, None)
            .await
            .unwrap();

        assert!(launched);
        assert_eq!(
            runner.calls(),
            vec![vec![
                "shell",
                "monkey",
                "-p",
                "com.android.chrome",
                "-c",
                "android.intent.category.LAUNCHER",
                "1"
            ]]
        );
    }

    #[tokio::test]
    async fn test_launch_unknown_app_is_not_an_error() {
        let runner = ScriptedRunner::succeeding();
        let launched = controller(&runner)
            .launch_app("NonexistentApp", None, None)
            .await
            .unwrap();

        assert!(!launched);
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_get_current_app_maps_package() {
        let runner = dumpsys(
            "  mCurrentFocus=Window{5d3c1a u0 com.android.chrome/com.google.android.apps.chrome.Main}\n",
        );
        let app = controller(&runner).get_current_app(None).await.unwrap();
        assert_eq!(app, "Chrome");
    }

    #[tokio::test]
    async fn test_get_current_app_unknown_is_system_home() {
        let runner = dumpsys(
            "  mCurrentFocus=Window{1a u0 com.google.android.apps.nexuslauncher/.NexusLauncherActivity}\n",
        );
        let app = controller(&runner).get_current_app(None).await.unwrap();
        assert_eq!(app, SYSTEM_HOME);
    }

    #[tokio::test]
    async fn test_get_current_app_empty_output_fails() {
        let runner = dumpsys("");
        let err = controller(&runner).get_current_app(None).await.unwrap_err();
        assert!(matches!(err, AdbError::CommandFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_device_is_reported() {
        let runner = ScriptedRunner::new(|_| {
            Ok(ExecutionResult::from_output(
                1,
                "",
                "adb: device 'ghost' not found\n",
            ))
        });
        let err = controller(&runner)
            .tap(1, 1, Some("ghost"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AdbError::DeviceNotFound(id) if id == "ghost"));
    }
}
