//! Timing configuration for device operations
//!
//! Every value is a delay in seconds. Values are resolved once from
//! `PHONE_AGENT_*` environment variables, falling back to compiled-in
//! defaults when a variable is missing or does not parse as a number.

use lazy_static::lazy_static;
use std::env;
use std::sync::Arc;

/// Read a delay through `lookup`, falling back to `default`
fn resolve<F>(lookup: &F, key: &str, default: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Action timing configuration for text input operations
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTimingConfig {
    pub keyboard_switch_delay: f64,
    pub text_clear_delay: f64,
    pub text_input_delay: f64,
    pub keyboard_restore_delay: f64,
}

impl ActionTimingConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Self {
            keyboard_switch_delay: resolve(
                lookup,
                "PHONE_AGENT_KEYBOARD_SWITCH_DELAY",
                d.keyboard_switch_delay,
            ),
            text_clear_delay: resolve(lookup, "PHONE_AGENT_TEXT_CLEAR_DELAY", d.text_clear_delay),
            text_input_delay: resolve(lookup, "PHONE_AGENT_TEXT_INPUT_DELAY", d.text_input_delay),
            keyboard_restore_delay: resolve(
                lookup,
                "PHONE_AGENT_KEYBOARD_RESTORE_DELAY",
                d.keyboard_restore_delay,
            ),
        }
    }
}

impl Default for ActionTimingConfig {
    fn default() -> Self {
        Self {
            keyboard_switch_delay: 1.0,
            text_clear_delay: 1.0,
            text_input_delay: 1.0,
            keyboard_restore_delay: 1.0,
        }
    }
}

/// Device timing configuration for gesture and navigation operations
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceTimingConfig {
    pub default_tap_delay: f64,
    pub default_double_tap_delay: f64,
    pub double_tap_interval: f64,
    pub default_long_press_delay: f64,
    pub default_swipe_delay: f64,
    pub default_back_delay: f64,
    pub default_home_delay: f64,
    pub default_launch_delay: f64,
}

impl DeviceTimingConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Self {
            default_tap_delay: resolve(lookup, "PHONE_AGENT_TAP_DELAY", d.default_tap_delay),
            default_double_tap_delay: resolve(
                lookup,
                "PHONE_AGENT_DOUBLE_TAP_DELAY",
                d.default_double_tap_delay,
            ),
            double_tap_interval: resolve(
                lookup,
                "PHONE_AGENT_DOUBLE_TAP_INTERVAL",
                d.double_tap_interval,
            ),
            default_long_press_delay: resolve(
                lookup,
                "PHONE_AGENT_LONG_PRESS_DELAY",
                d.default_long_press_delay,
            ),
            default_swipe_delay: resolve(lookup, "PHONE_AGENT_SWIPE_DELAY", d.default_swipe_delay),
            default_back_delay: resolve(lookup, "PHONE_AGENT_BACK_DELAY", d.default_back_delay),
            default_home_delay: resolve(lookup, "PHONE_AGENT_HOME_DELAY", d.default_home_delay),
            default_launch_delay: resolve(
                lookup,
                "PHONE_AGENT_LAUNCH_DELAY",
                d.default_launch_delay,
            ),
        }
    }
}

impl Default for DeviceTimingConfig {
    fn default() -> Self {
        Self {
            default_tap_delay: 1.0,
            default_double_tap_delay: 1.0,
            double_tap_interval: 0.1,
            default_long_press_delay: 1.0,
            default_swipe_delay: 1.0,
            default_back_delay: 1.0,
            default_home_delay: 1.0,
            default_launch_delay: 1.0,
        }
    }
}

/// Connection timing configuration for adb connection operations
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionTimingConfig {
    pub adb_restart_delay: f64,
    pub server_restart_delay: f64,
}

impl ConnectionTimingConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Self {
            adb_restart_delay: resolve(
                lookup,
                "PHONE_AGENT_ADB_RESTART_DELAY",
                d.adb_restart_delay,
            ),
            server_restart_delay: resolve(
                lookup,
                "PHONE_AGENT_SERVER_RESTART_DELAY",
                d.server_restart_delay,
            ),
        }
    }
}

impl Default for ConnectionTimingConfig {
    fn default() -> Self {
        Self {
            adb_restart_delay: 2.0,
            server_restart_delay: 1.0,
        }
    }
}

/// Master timing configuration
///
/// `Default` yields the compiled-in values without touching the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingConfig {
    pub action: ActionTimingConfig,
    pub device: DeviceTimingConfig,
    pub connection: ConnectionTimingConfig,
}

impl TimingConfig {
    /// Resolve every delay from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve every delay through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            action: ActionTimingConfig::from_lookup(&lookup),
            device: DeviceTimingConfig::from_lookup(&lookup),
            connection: ConnectionTimingConfig::from_lookup(&lookup),
        }
    }
}

lazy_static! {
    /// Global timing configuration, resolved from the environment on first use
    pub static ref TIMING_CONFIG: Arc<TimingConfig> = Arc::new(TimingConfig::from_env());
}
