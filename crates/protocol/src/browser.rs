//! Parameters of a browser creation request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Frame rate used for off-screen rendering unless the host asks otherwise.
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Window the engine attaches a new browser to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    /// Render off-screen. Always true for this embedding.
    pub windowless: bool,
    /// Native parent window, `0` for none.
    pub parent_window: u64,
}

impl WindowInfo {
    /// Off-screen window with the given native parent (`0` for none).
    pub fn windowless(parent_window: u64) -> Self {
        Self {
            windowless: true,
            parent_window,
        }
    }
}

impl Default for WindowInfo {
    fn default() -> Self {
        Self::windowless(0)
    }
}

/// Per-browser engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSettings {
    /// Maximum paint rate for off-screen rendering, in frames per second.
    pub windowless_frame_rate: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            windowless_frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

/// Key/value payload attached to a browser at creation.
///
/// The engine forwards it to the render process that hosts the browser. This
/// layer never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraInfo(Map<String, Value>);

impl ExtraInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an integer entry, replacing any previous value under `key`.
    pub fn set_int(&mut self, key: impl Into<String>, value: i32) -> &mut Self {
        self.0.insert(key.into(), Value::from(value));
        self
    }

    /// Sets a string entry, replacing any previous value under `key`.
    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Sets an arbitrary JSON entry.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.0
            .get(key)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for ExtraInfo {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Everything needed to ask the engine for a new browser, apart from the
/// client and the start URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserOptions {
    pub window: WindowInfo,
    pub settings: BrowserSettings,
    #[serde(default, skip_serializing_if = "ExtraInfo::is_empty")]
    pub extra_info: ExtraInfo,
}

impl BrowserOptions {
    /// Attaches `extra_info` to the creation request.
    pub fn with_extra_info(mut self, extra_info: ExtraInfo) -> Self {
        self.extra_info = extra_info;
        self
    }

    /// Overrides the off-screen frame rate.
    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.settings.windowless_frame_rate = fps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_windowless_at_thirty_fps() {
        let options = BrowserOptions::default();

        assert!(options.window.windowless);
        assert_eq!(options.window.parent_window, 0);
        assert_eq!(options.settings.windowless_frame_rate, 30);
        assert!(options.extra_info.is_empty());
    }

    #[test]
    fn extra_info_is_passed_through_as_plain_json() {
        let mut extra = ExtraInfo::new();
        extra.set_int("slot", 23).set_string("profile", "kiosk");

        let json = serde_json::to_value(&extra).unwrap();
        assert_eq!(json, serde_json::json!({ "slot": 23, "profile": "kiosk" }));
        assert_eq!(extra.get_int("slot"), Some(23));
        assert_eq!(extra.get_int("profile"), None);
    }

    #[test]
    fn empty_extra_info_is_omitted() {
        let json = serde_json::to_value(BrowserOptions::default().with_frame_rate(60)).unwrap();

        assert!(json.get("extraInfo").is_none());
        assert_eq!(json["settings"]["windowlessFrameRate"], 60);
    }
}
