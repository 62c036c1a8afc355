/*
 *  message.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  JSON frames exchanged with the device
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::deutils::{
    deserialize_lenient_bool,
    deserialize_lenient_position,
    deserialize_lenient_string,
    deserialize_present,
};

/// One user click, sent as `{"action": "<button text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCommand {
    pub action: String,
}

impl ActionCommand {
    pub fn new(action: impl Into<String>) -> Self {
        Self { action: action.into() }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Status frame pushed by the device. Every field is optional; a field
/// that is missing leaves the panel as it was.
///
/// Two lamp encodings exist in the field: a single `direction` index
/// (rotary switch position 1..8) or one flag per lamp keyed by compass
/// point. Both are decoded here, `PanelState::apply` picks between them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceMessage {
    #[serde(default, alias = "stat", deserialize_with = "deserialize_lenient_string")]
    pub status: Option<String>,

    /// Raw level reading. `Some(Value::Null)` means "sent but empty".
    #[serde(default, rename = "status_vu", alias = "level", deserialize_with = "deserialize_present")]
    pub level: Option<Value>,

    /// `None` when absent, `Some(None)` when sent but not a position 1..8.
    #[serde(default, alias = "dir", deserialize_with = "deserialize_lenient_position")]
    pub direction: Option<Option<u8>>,

    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub s: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub sw: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub w: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub nw: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub n: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub ne: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub e: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub se: Option<bool>,
}

impl DeviceMessage {
    /// Only a JSON object is a frame. serde would otherwise map an array
    /// onto the fields by position.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(text)? {
            obj @ Value::Object(_) => serde_json::from_value(obj),
            other => Err(serde::de::Error::custom(format!(
                "device frame must be a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Per-lamp flags in switch-position order (S, SW, W, NW, N, NE, E, SE).
    pub fn lamp_fields(&self) -> [Option<bool>; 8] {
        [self.s, self.sw, self.w, self.nw, self.n, self.ne, self.e, self.se]
    }

    pub fn has_lamp_fields(&self) -> bool {
        self.lamp_fields().iter().any(Option::is_some)
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_wire_format() {
        let cmd = ActionCommand::new("toggle");
        assert_eq!(cmd.to_json().unwrap(), r#"{"action":"toggle"}"#);
    }

    #[test]
    fn test_firmware_status_frame() {
        // what notifyClients() emits
        let msg = DeviceMessage::parse(r#"{"status":"on","status_vu":2048}"#).unwrap();
        assert_eq!(msg.status.as_deref(), Some("on"));
        assert_eq!(msg.level, Some(json!(2048)));
        assert_eq!(msg.direction, None);
        assert!(!msg.has_lamp_fields());
    }

    #[test]
    fn test_direction_frame() {
        let msg = DeviceMessage::parse(r#"{"direction":"3"}"#).unwrap();
        assert_eq!(msg.direction, Some(Some(3)));
        // present but unusable is not the same as absent
        for raw in ["2.5", "300", "-1", "0", "null", r#""x""#] {
            let msg = DeviceMessage::parse(&format!(r#"{{"direction":{raw}}}"#)).unwrap();
            assert_eq!(msg.direction, Some(None), "direction {raw}");
        }
    }

    #[test]
    fn test_short_key_aliases() {
        let msg = DeviceMessage::parse(r#"{"stat":"on","dir":3}"#).unwrap();
        assert_eq!(msg.status.as_deref(), Some("on"));
        assert_eq!(msg.direction, Some(Some(3)));
    }

    #[test]
    fn test_per_lamp_frame() {
        let msg = DeviceMessage::parse(r#"{"n":"on","s":false,"ne":1,"e":"bogus"}"#).unwrap();
        let lamps = msg.lamp_fields();
        assert_eq!(lamps[0], Some(false)); // S
        assert_eq!(lamps[4], Some(true)); // N
        assert_eq!(lamps[5], Some(true)); // NE
        assert_eq!(lamps[6], None); // E unreadable
        assert!(msg.has_lamp_fields());
    }

    #[test]
    fn test_level_presence() {
        let msg = DeviceMessage::parse(r#"{"status_vu":null}"#).unwrap();
        assert_eq!(msg.level, Some(Value::Null));
        let msg = DeviceMessage::parse(r#"{"level":"12"}"#).unwrap();
        assert_eq!(msg.level, Some(json!("12")));
        let msg = DeviceMessage::parse(r#"{}"#).unwrap();
        assert_eq!(msg.level, None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(DeviceMessage::parse("[1,2,3]").is_err());
        assert!(DeviceMessage::parse(r#"["off", 4095, 5]"#).is_err());
        assert!(DeviceMessage::parse("42").is_err());
        assert!(DeviceMessage::parse(r#""on""#).is_err());
        assert!(DeviceMessage::parse("null").is_err());
        assert!(DeviceMessage::parse("not json").is_err());
    }
}
