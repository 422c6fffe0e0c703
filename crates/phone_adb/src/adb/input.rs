//! Text input through the ADB Keyboard companion IME
//!
//! The ADB Keyboard app must be installed on the device. Text travels as
//! base64 inside a broadcast so any byte sequence survives the adb shell.

use super::output;
use super::settle;
use crate::config::{TimingConfig, TIMING_CONFIG};
use crate::error::Result;
use crate::executor::{adb_args, CommandRunner, ExecutionResult, ProcessExecutor, SHORT_TIMEOUT};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;
use tracing::{debug, warn};

/// IME identifier of the ADB Keyboard
pub const ADB_KEYBOARD_IME: &str = "com.android.adbkeyboard/.AdbIME";

const ACTION_INPUT_B64: &str = "ADB_INPUT_B64";
const ACTION_CLEAR_TEXT: &str = "ADB_CLEAR_TEXT";

/// Keyboard switching and text injection
#[derive(Debug, Clone)]
pub struct TextInput<R = ProcessExecutor> {
    runner: R,
    timing: Arc<TimingConfig>,
}

impl TextInput<ProcessExecutor> {
    pub fn new() -> Self {
        Self::with_runner(ProcessExecutor::new(), TIMING_CONFIG.clone())
    }
}

impl Default for TextInput<ProcessExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> TextInput<R> {
    pub fn with_runner(runner: R, timing: Arc<TimingConfig>) -> Self {
        Self { runner, timing }
    }

    async fn shell(&self, device_id: Option<&str>, args: &[&str]) -> Result<ExecutionResult> {
        let mut full = vec!["shell"];
        full.extend_from_slice(args);

        let result = self
            .runner
            .run(&adb_args(device_id, &full), SHORT_TIMEOUT)
            .await?;

        match output::device_error(&result, device_id) {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    /// Type text into the currently focused input field using ADB Keyboard
    pub async fn type_text(&self, text: &str, device_id: Option<&str>) -> Result<()> {
        let encoded_text = general_purpose::STANDARD.encode(text.as_bytes());

        self.shell(
            device_id,
            &["am", "broadcast", "-a", ACTION_INPUT_B64, "--es", "msg", &encoded_text],
        )
        .await?;

        Ok(())
    }

    /// Clear text in the currently focused input field
    pub async fn clear_text(&self, device_id: Option<&str>) -> Result<()> {
        self.shell(device_id, &["am", "broadcast", "-a", ACTION_CLEAR_TEXT])
            .await?;
        Ok(())
    }

    /// Detect current keyboard and switch to ADB Keyboard if needed
    ///
    /// Returns the IME that was active before, for [`Self::restore_keyboard`].
    /// An empty string means the device reported no default IME.
    pub async fn detect_and_set_adb_keyboard(&self, device_id: Option<&str>) -> Result<String> {
        let result = self
            .shell(
                device_id,
                &["settings", "get", "secure", "default_input_method"],
            )
            .await?;

        // Handed back to `ime set` verbatim.
        let current_ime = output::parse_default_ime(&result.stdout_utf8()?).unwrap_or_default();
        debug!("Current IME: {:?}", current_ime);

        if !current_ime.contains(ADB_KEYBOARD_IME) {
            self.shell(device_id, &["ime", "set", ADB_KEYBOARD_IME])
                .await?;
        }

        // The first broadcast after a switch can be dropped; send an empty one.
        self.type_text("", device_id).await?;

        Ok(current_ime)
    }

    /// Restore the original keyboard IME
    ///
    /// The device validates the id; its answer is not inspected.
    pub async fn restore_keyboard(&self, ime: &str, device_id: Option<&str>) -> Result<()> {
        let ime = ime.trim();
        if ime.is_empty() {
            debug!("No IME to restore");
            return Ok(());
        }

        self.runner
            .run(&adb_args(device_id, &["shell", "ime", "set", ime]), SHORT_TIMEOUT)
            .await?;

        Ok(())
    }

    /// Replace the focused field's content with `text`
    ///
    /// Switches to ADB Keyboard, clears, types, then restores the original
    /// IME, waiting the action delays between steps. The original IME is
    /// restored even when clearing or typing fails.
    pub async fn input_text(&self, text: &str, device_id: Option<&str>) -> Result<()> {
        let timing = &self.timing.action;

        let original_ime = self.detect_and_set_adb_keyboard(device_id).await?;
        settle(timing.keyboard_switch_delay).await;

        let typed = self.clear_and_type(text, device_id).await;

        let restored = self.restore_keyboard(&original_ime, device_id).await;
        settle(timing.keyboard_restore_delay).await;

        if let Err(e) = &typed {
            warn!("Text input failed, keyboard restored: {}", e);
        }
        typed.and(restored)
    }

    async fn clear_and_type(&self, text: &str, device_id: Option<&str>) -> Result<()> {
        self.clear_text(device_id).await?;
        settle(self.timing.action.text_clear_delay).await;

        self.type_text(text, device_id).await?;
        settle(self.timing.action.text_input_delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdbError;
    use crate::executor::mock::ScriptedRunner;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    const LATIN_IME: &str =
        "com.google.android.inputmethod.latin/com.android.inputmethod.latin.LatinIME";

    fn text_input(runner: &ScriptedRunner) -> TextInput<ScriptedRunner> {
        TextInput::with_runner(runner.clone(), Arc::new(TimingConfig::default()))
    }

    /// A device whose active IME follows `ime set` calls
    fn ime_device(initial: &str) -> (ScriptedRunner, Arc<Mutex<String>>) {
        let ime = Arc::new(Mutex::new(initial.to_string()));
        let state = Arc::clone(&ime);
        let runner = ScriptedRunner::new(move |args| {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let mut current = state.lock().unwrap();
            match args.as_slice() {
                ["shell", "settings", "get", "secure", "default_input_method"] => Ok(
                    ExecutionResult::from_output(0, &format!("{}\n", current), ""),
                ),
                ["shell", "ime", "set", id] => {
                    *current = id.to_string();
                    Ok(ExecutionResult::from_output(
                        0,
                        &format!("Input method {} selected for user #0\n", id),
                        "",
                    ))
                }
                _ => Ok(ExecutionResult::from_output(
                    0,
                    "Broadcasting: Intent { act=ADB_INPUT_B64 flg=0x400000 }\nBroadcast completed: result=0\n",
                    "",
                )),
            }
        });
        (runner, ime)
    }

    #[tokio::test]
    async fn test_type_text_base64_preserves_bytes() {
        let runner = ScriptedRunner::succeeding();
        text_input(&runner)
            .type_text("héllo\n世界", None)
            .await
            .unwrap();

        let call = &runner.calls()[0];
        assert_eq!(&call[..6], &["shell", "am", "broadcast", "-a", "ADB_INPUT_B64", "--es"]);
        assert_eq!(call[6], "msg");
        let decoded = general_purpose::STANDARD.decode(&call[7]).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "héllo\n世界");
    }

    #[tokio::test]
    async fn test_clear_text_broadcast() {
        let runner = ScriptedRunner::succeeding();
        text_input(&runner).clear_text(Some("emulator-5554")).await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![vec![
                "-s",
                "emulator-5554",
                "shell",
                "am",
                "broadcast",
                "-a",
                "ADB_CLEAR_TEXT"
            ]]
        );
    }

    #[tokio::test]
    async fn test_detect_switches_and_warms_up() {
        let (runner, ime) = ime_device(LATIN_IME);
        let original = text_input(&runner)
            .detect_and_set_adb_keyboard(None)
            .await
            .unwrap();

        assert_eq!(original, LATIN_IME);
        assert_eq!(*ime.lock().unwrap(), ADB_KEYBOARD_IME);

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1], vec!["shell", "ime", "set", ADB_KEYBOARD_IME]);
        // warm-up broadcast carries an empty payload
        assert_eq!(calls[2].last().unwrap(), "");
    }

    #[tokio::test]
    async fn test_detect_skips_switch_when_already_active() {
        let (runner, _) = ime_device(ADB_KEYBOARD_IME);
        let original = text_input(&runner)
            .detect_and_set_adb_keyboard(None)
            .await
            .unwrap();

        assert_eq!(original, ADB_KEYBOARD_IME);
        assert!(runner
            .calls()
            .iter()
            .all(|c| !c.contains(&"ime".to_string())));
    }

    #[tokio::test]
    async fn test_detect_ignores_stderr_noise() {
        let runner = ScriptedRunner::new(|args| {
            if args.last().map(String::as_str) == Some("default_input_method") {
                Ok(ExecutionResult::from_output(
                    0,
                    &format!("{}\n", LATIN_IME),
                    "WARNING: linker: unused DT entry\n",
                ))
            } else {
                Ok(ExecutionResult::from_output(0, "", ""))
            }
        });

        let original = text_input(&runner)
            .detect_and_set_adb_keyboard(None)
            .await
            .unwrap();

        assert_eq!(original, LATIN_IME);
    }

    #[tokio::test]
    async fn test_detect_rejects_malformed_ime_id() {
        let runner = ScriptedRunner::new(|_| {
            Ok(ExecutionResult {
                exit_status: Some(0),
                stdout: vec![b'c', b'o', b'm', 0xff, b'\n'],
                stderr: Vec::new(),
            })
        });

        let err = text_input(&runner)
            .detect_and_set_adb_keyboard(None)
            .await
            .unwrap_err();

        assert!(matches!(err, AdbError::Utf8(_)));
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_detect_then_restore_round_trips_ime() {
        let (runner, ime) = ime_device(LATIN_IME);
        let input = text_input(&runner);

        let original = input.detect_and_set_adb_keyboard(None).await.unwrap();
        input.restore_keyboard(&original, None).await.unwrap();

        assert_eq!(*ime.lock().unwrap(), LATIN_IME);
    }

    #[tokio::test]
    async fn test_restore_ignores_device_answer() {
        let runner = ScriptedRunner::new(|_| {
            Ok(ExecutionResult::from_output(
                255,
                "",
                "Unknown input method not/an.ime cannot be selected for user #0\n",
            ))
        });
        text_input(&runner)
            .restore_keyboard("not/an.ime", None)
            .await
            .unwrap();
        assert_eq!(runner.call_count(), 1);

        text_input(&runner).restore_keyboard("  ", None).await.unwrap();
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_text_full_sequence() {
        let (runner, ime) = ime_device(LATIN_IME);
        let started = Instant::now();

        text_input(&runner).input_text("hi", None).await.unwrap();

        // switch + clear + input + restore delays
        assert!(started.elapsed() >= Duration::from_secs(4));
        assert_eq!(*ime.lock().unwrap(), LATIN_IME);

        let actions: Vec<String> = runner
            .calls()
            .iter()
            .filter_map(|c| c.iter().position(|a| a == "-a").map(|i| c[i + 1].clone()))
            .collect();
        assert_eq!(actions, vec!["ADB_INPUT_B64", "ADB_CLEAR_TEXT", "ADB_INPUT_B64"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_text_restores_after_failure() {
        let ime = Arc::new(Mutex::new(LATIN_IME.to_string()));
        let state = Arc::clone(&ime);
        let runner = ScriptedRunner::new(move |args| {
            let mut current = state.lock().unwrap();
            if args.iter().any(|a| a == "default_input_method") {
                return Ok(ExecutionResult::from_output(0, &current, ""));
            }
            if args.iter().any(|a| a == ACTION_CLEAR_TEXT) {
                return Err(AdbError::Timeout("clear".to_string()));
            }
            if args[1] == "ime" {
                *current = args[3].clone();
            }
            Ok(ExecutionResult::from_output(0, "", ""))
        });

        let err = text_input(&runner).input_text("hi", None).await.unwrap_err();

        assert!(matches!(err, AdbError::Timeout(_)));
        assert_eq!(*ime.lock().unwrap(), LATIN_IME);
    }
}
