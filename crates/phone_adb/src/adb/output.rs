//! Parsers for adb's textual output
//!
//! adb's wording is owned by the tool, not by us. Every substring we sniff
//! for lives in this module, either in a marker table or in one parse
//! function per sub-command, so wording drift is fixed here and nowhere else.

use super::connection::{ConnectionType, DeviceInfo};
use crate::error::AdbError;
use crate::executor::ExecutionResult;
use lazy_static::lazy_static;
use regex::Regex;

/// Output substrings that decide success or failure of one sub-command
#[derive(Debug, Clone, Copy)]
pub struct OutputMarkers {
    pub success: &'static [&'static str],
    pub failure: &'static [&'static str],
    pub ignore_case: bool,
}

impl OutputMarkers {
    /// `Some(false)` if a failure marker matches, else `Some(true)` if a
    /// success marker matches, else `None`
    pub fn classify(&self, text: &str) -> Option<bool> {
        let haystack = if self.ignore_case {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let matches = |marker: &&str| {
            if self.ignore_case {
                haystack.contains(&marker.to_lowercase())
            } else {
                haystack.contains(*marker)
            }
        };

        if self.failure.iter().any(matches) {
            Some(false)
        } else if self.success.iter().any(matches) {
            Some(true)
        } else {
            None
        }
    }
}

/// `adb connect`
pub const CONNECT_MARKERS: OutputMarkers = OutputMarkers {
    success: &["connected to", "already connected to"],
    failure: &[
        "failed to connect",
        "failed to authenticate",
        "unable to connect",
        "cannot connect",
        "no such host",
        "connection refused",
    ],
    ignore_case: true,
};

/// `adb tcpip`
pub const TCPIP_MARKERS: OutputMarkers = OutputMarkers {
    success: &["restarting in tcp mode"],
    failure: &["error:"],
    ignore_case: true,
};

/// `adb shell screencap`; only failures are signalled in text
pub const SCREENCAP_MARKERS: OutputMarkers = OutputMarkers {
    success: &[],
    failure: &["Status: -1", "Failed"],
    ignore_case: false,
};

/// Any device-targeted command whose device is missing or unusable
pub const DEVICE_ERROR_MARKERS: OutputMarkers = OutputMarkers {
    success: &[],
    failure: &[
        "no devices/emulators found",
        "error: device not found",
        "device offline",
        "device unauthorized",
    ],
    ignore_case: true,
};

/// States `adb devices` reports in the second column
const DEVICE_STATES: &[&str] = &[
    "device",
    "offline",
    "unauthorized",
    "recovery",
    "sideload",
    "bootloader",
    "no",
    "authorizing",
    "connecting",
];

lazy_static! {
    static ref DEVICE_NOT_FOUND_RE: Regex = Regex::new(r"device '([^']*)' not found").unwrap();
    static ref FOCUSED_PACKAGE_RE: Regex =
        Regex::new(r"\s([A-Za-z][\w.]*)/[\w.$]*").unwrap();
    static ref INET_RE: Regex = Regex::new(r"inet\s+(\d{1,3}(?:\.\d{1,3}){3})").unwrap();
}

/// Result of `adb connect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    AlreadyConnected,
    Failed(String),
}

pub fn parse_connect_output(text: &str) -> ConnectOutcome {
    match CONNECT_MARKERS.classify(text) {
        Some(true) if text.to_lowercase().contains("already connected") => {
            ConnectOutcome::AlreadyConnected
        }
        Some(true) => ConnectOutcome::Connected,
        _ => ConnectOutcome::Failed(text.trim().to_string()),
    }
}

/// Whether `adb tcpip` switched the daemon, falling back to the exit status
/// when the output says nothing recognisable
pub fn parse_tcpip_output(result: &ExecutionResult) -> bool {
    TCPIP_MARKERS
        .classify(&result.combined())
        .unwrap_or_else(|| result.success())
}

/// Parse `adb devices -l`
///
/// The header, blank lines, daemon notices (`* daemon ...`) and lines whose
/// second token is not a known device state are skipped.
pub fn parse_devices(text: &str) -> Vec<DeviceInfo> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !line.starts_with("List of devices") && !line.starts_with('*')
        })
        .filter_map(parse_device_line)
        .collect()
}

fn parse_device_line(line: &str) -> Option<DeviceInfo> {
    let mut parts = line.split_whitespace();
    let device_id = parts.next()?.to_string();
    let status = parts.next()?.to_string();
    if !DEVICE_STATES.contains(&status.as_str()) {
        return None;
    }

    let connection_type = if device_id.contains(':') {
        ConnectionType::Remote
    } else {
        ConnectionType::Usb
    };

    let model = parts
        .filter_map(|part| part.strip_prefix("model:"))
        .find(|m| !m.is_empty())
        .map(str::to_string);

    Some(DeviceInfo {
        device_id,
        status,
        connection_type,
        model,
        android_version: None,
    })
}

/// Source address from `ip route`
pub fn parse_route_src(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        tokens.find(|t| *t == "src")?;
        tokens.next().map(str::to_string)
    })
}

/// First IPv4 address from `ip addr show <iface>`
pub fn parse_inet_addr(text: &str) -> Option<String> {
    INET_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Package of the focused window from `dumpsys window`
///
/// `mCurrentFocus` wins; `mFocusedApp` is consulted when the current focus
/// is not an app window (status bar, `null`).
pub fn parse_focused_package(text: &str) -> Option<String> {
    let package_on = |marker: &str| {
        text.lines()
            .filter(|line| line.contains(marker))
            .find_map(|line| {
                FOCUSED_PACKAGE_RE
                    .captures(line)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
            })
    };

    package_on("mCurrentFocus").or_else(|| package_on("mFocusedApp"))
}

/// Active IME from `settings get secure default_input_method`
pub fn parse_default_ime(text: &str) -> Option<String> {
    let ime = text.trim();
    if ime.is_empty() || ime == "null" {
        None
    } else {
        Some(ime.to_string())
    }
}

/// Whether `screencap` was refused, typically by a secure surface
pub fn is_screencap_refused(text: &str) -> bool {
    SCREENCAP_MARKERS.classify(text) == Some(false)
}

/// Map adb's "no such device" and offline/unauthorized wording to
/// [`AdbError::DeviceNotFound`]
pub fn device_error(result: &ExecutionResult, device_id: Option<&str>) -> Option<AdbError> {
    let text = result.combined();

    if let Some(caps) = DEVICE_NOT_FOUND_RE.captures(&text) {
        let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        return Some(AdbError::DeviceNotFound(id.to_string()));
    }

    if DEVICE_ERROR_MARKERS.classify(&text) == Some(false) {
        let id = device_id.unwrap_or("<default>");
        return Some(AdbError::DeviceNotFound(id.to_string()));
    }

    None
}
