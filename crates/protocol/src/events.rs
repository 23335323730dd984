//! Events the engine reports through the host's callback table.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Browser-scoped lifecycle notification (after-created, before-close).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserEvent {
    pub browser_id: i32,
}

/// Main-frame load finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEndEvent {
    pub browser_id: i32,
    pub http_status_code: i32,
}

/// Message delivered from a render process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMessage {
    pub browser_id: i32,
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// Off-screen frame, BGRA, row-major, `width * height * 4` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PaintEvent {
    pub browser_id: i32,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PaintEvent {
    /// Byte length a frame of this size must have.
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }
}

impl fmt::Debug for PaintEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintEvent")
            .field("browser_id", &self.browser_id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &format_args!("[{} bytes]", self.pixels.len()))
            .finish()
    }
}
