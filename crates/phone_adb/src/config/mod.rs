//! Configuration module for phone_adb
//!
//! This module contains:
//! - `apps`: App package mappings for Android
//! - `timing`: Timing configurations for device operations

mod apps;
mod timing;

pub use apps::{get_app_name, get_package_name, list_supported_apps, APP_PACKAGES};
pub use timing::{
    ActionTimingConfig, ConnectionTimingConfig, DeviceTimingConfig, TimingConfig, TIMING_CONFIG,
};
