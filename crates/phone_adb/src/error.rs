//! Error types for adb operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdbError {
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Command timeout: {0}")]
    Timeout(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, AdbError>;
