//! Attribute store - the closed set of ad unit properties the host can read
//!
//! Every VPAID getter and the handful of host-driven setters map onto exactly
//! one [`AttributeField`]. Values are validated before they are stored; the
//! store itself never emits events.

use crate::config::CreativeConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum volume accepted by the store (percent)
pub const MAX_VOLUME: i64 = 100;

/// Ad view modes defined by the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Normal,
    Thumbnail,
    Fullscreen,
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Normal => write!(f, "normal"),
            ViewMode::Thumbnail => write!(f, "thumbnail"),
            ViewMode::Fullscreen => write!(f, "fullscreen"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(ViewMode::Normal),
            "thumbnail" => Ok(ViewMode::Thumbnail),
            "fullscreen" => Ok(ViewMode::Fullscreen),
            other => Err(Error::invalid(
                AttributeField::ViewMode,
                format!("unknown view mode '{}'", other),
            )),
        }
    }
}

/// Attribute names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeField {
    Width,
    Height,
    ViewMode,
    DesiredBitrate,
    Duration,
    RemainingTime,
    Volume,
    Linear,
    Expanded,
    SkippableState,
    Companions,
    Icons,
}

impl AttributeField {
    /// Every field in the schema, in display order
    pub const ALL: [AttributeField; 12] = [
        AttributeField::Width,
        AttributeField::Height,
        AttributeField::ViewMode,
        AttributeField::DesiredBitrate,
        AttributeField::Duration,
        AttributeField::RemainingTime,
        AttributeField::Volume,
        AttributeField::Linear,
        AttributeField::Expanded,
        AttributeField::SkippableState,
        AttributeField::Companions,
        AttributeField::Icons,
    ];

    /// Protocol name of the field
    pub fn name(&self) -> &'static str {
        match self {
            AttributeField::Width => "width",
            AttributeField::Height => "height",
            AttributeField::ViewMode => "viewMode",
            AttributeField::DesiredBitrate => "desiredBitrate",
            AttributeField::Duration => "duration",
            AttributeField::RemainingTime => "remainingTime",
            AttributeField::Volume => "volume",
            AttributeField::Linear => "linear",
            AttributeField::Expanded => "expanded",
            AttributeField::SkippableState => "skippableState",
            AttributeField::Companions => "companions",
            AttributeField::Icons => "icons",
        }
    }
}

impl std::fmt::Display for AttributeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttributeField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AttributeField::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// A dynamically typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Number(f64),
    Bool(bool),
    Text(String),
}

impl AttributeValue {
    fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Number(_) => "number",
            AttributeValue::Bool(_) => "boolean",
            AttributeValue::Text(_) => "string",
        }
    }

    /// Integral view of the value; numbers are accepted when they carry no fraction
    fn as_integer(&self) -> Option<i64> {
        match *self {
            AttributeValue::Integer(n) => Some(n),
            AttributeValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(n as i64),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match *self {
            AttributeValue::Integer(n) => Some(n as f64),
            AttributeValue::Number(n) if n.is_finite() => Some(n),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Integer(n) => write!(f, "{}", n),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::Integer(i64::from(v))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Number(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<ViewMode> for AttributeValue {
    fn from(v: ViewMode) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

/// Current ad unit properties
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSet {
    width: u32,
    height: u32,
    view_mode: ViewMode,
    /// Desired bitrate in kbps
    desired_bitrate: u32,
    /// Ad duration in seconds
    duration: f64,
    /// Remaining time in seconds
    remaining_time: f64,
    /// Volume in percent (0-100)
    volume: u8,
    linear: bool,
    expanded: bool,
    skippable_state: bool,
    companions: String,
    icons: String,
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            view_mode: ViewMode::Normal,
            desired_bitrate: 256,
            duration: 30.0,
            remaining_time: 10.0,
            volume: 50,
            linear: true,
            expanded: false,
            skippable_state: false,
            companions: String::new(),
            icons: String::new(),
        }
    }
}

impl AttributeSet {
    /// Create the default attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the attribute set from a creative build configuration
    pub fn from_config(config: &CreativeConfig) -> Self {
        Self {
            duration: config.duration,
            remaining_time: config.remaining_time,
            linear: config.linear,
            skippable_state: config.skippable,
            companions: config.companions.clone(),
            icons: config.icons.clone(),
            ..Self::default()
        }
    }

    /// Read a field
    pub fn get(&self, field: AttributeField) -> AttributeValue {
        match field {
            AttributeField::Width => self.width.into(),
            AttributeField::Height => self.height.into(),
            AttributeField::ViewMode => self.view_mode.into(),
            AttributeField::DesiredBitrate => self.desired_bitrate.into(),
            AttributeField::Duration => self.duration.into(),
            AttributeField::RemainingTime => self.remaining_time.into(),
            AttributeField::Volume => AttributeValue::Integer(i64::from(self.volume)),
            AttributeField::Linear => self.linear.into(),
            AttributeField::Expanded => self.expanded.into(),
            AttributeField::SkippableState => self.skippable_state.into(),
            AttributeField::Companions => self.companions.as_str().into(),
            AttributeField::Icons => self.icons.as_str().into(),
        }
    }

    /// Read a field by its protocol name
    pub fn get_by_name(&self, name: &str) -> Result<AttributeValue> {
        Ok(self.get(name.parse()?))
    }

    /// Validate and store a value. Rejected values leave the field untouched.
    pub fn set(&mut self, field: AttributeField, value: impl Into<AttributeValue>) -> Result<()> {
        let value = value.into();
        match field {
            AttributeField::Width => self.width = dimension(field, &value)?,
            AttributeField::Height => self.height = dimension(field, &value)?,
            AttributeField::DesiredBitrate => self.desired_bitrate = dimension(field, &value)?,
            AttributeField::ViewMode => match value {
                AttributeValue::Text(ref mode) => self.view_mode = mode.parse()?,
                ref other => return Err(type_mismatch(field, "string", other)),
            },
            AttributeField::Duration => self.duration = seconds(field, &value)?,
            AttributeField::RemainingTime => self.remaining_time = seconds(field, &value)?,
            AttributeField::Volume => {
                let volume = value
                    .as_integer()
                    .ok_or_else(|| type_mismatch(field, "integer", &value))?;
                if !(0..=MAX_VOLUME).contains(&volume) {
                    return Err(Error::invalid(
                        field,
                        format!("{} outside 0-{}", volume, MAX_VOLUME),
                    ));
                }
                self.volume = volume as u8;
            }
            AttributeField::Linear => self.linear = flag(field, &value)?,
            AttributeField::Expanded => self.expanded = flag(field, &value)?,
            AttributeField::SkippableState => self.skippable_state = flag(field, &value)?,
            AttributeField::Companions => self.companions = text(field, value)?,
            AttributeField::Icons => self.icons = text(field, value)?,
        }
        Ok(())
    }

    /// Set a field by its protocol name
    pub fn set_by_name(&mut self, name: &str, value: impl Into<AttributeValue>) -> Result<()> {
        self.set(name.parse()?, value)
    }

    /// All fields with their current values, in schema order
    pub fn entries(&self) -> Vec<(AttributeField, AttributeValue)> {
        AttributeField::ALL
            .iter()
            .map(|&field| (field, self.get(field)))
            .collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn desired_bitrate(&self) -> u32 {
        self.desired_bitrate
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn remaining_time(&self) -> f64 {
        self.remaining_time
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn linear(&self) -> bool {
        self.linear
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub fn skippable_state(&self) -> bool {
        self.skippable_state
    }

    pub fn companions(&self) -> &str {
        &self.companions
    }

    pub fn icons(&self) -> &str {
        &self.icons
    }
}

fn type_mismatch(field: AttributeField, expected: &str, got: &AttributeValue) -> Error {
    Error::invalid(field, format!("expected {}, got {}", expected, got.kind()))
}

fn dimension(field: AttributeField, value: &AttributeValue) -> Result<u32> {
    let n = value
        .as_integer()
        .ok_or_else(|| type_mismatch(field, "integer", value))?;
    u32::try_from(n).map_err(|_| Error::invalid(field, format!("{} is not a valid size", n)))
}

fn seconds(field: AttributeField, value: &AttributeValue) -> Result<f64> {
    value
        .as_number()
        .ok_or_else(|| type_mismatch(field, "finite number", value))
}

fn flag(field: AttributeField, value: &AttributeValue) -> Result<bool> {
    match *value {
        AttributeValue::Bool(b) => Ok(b),
        ref other => Err(type_mismatch(field, "boolean", other)),
    }
}

fn text(field: AttributeField, value: AttributeValue) -> Result<String> {
    match value {
        AttributeValue::Text(s) => Ok(s),
        other => Err(type_mismatch(field, "string", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_schema() {
        let attrs = AttributeSet::new();
        assert_eq!(attrs.width(), 0);
        assert_eq!(attrs.height(), 0);
        assert_eq!(attrs.view_mode(), ViewMode::Normal);
        assert_eq!(attrs.desired_bitrate(), 256);
        assert_eq!(attrs.duration(), 30.0);
        assert_eq!(attrs.remaining_time(), 10.0);
        assert_eq!(attrs.volume(), 50);
        assert!(attrs.linear());
        assert!(!attrs.expanded());
        assert!(!attrs.skippable_state());
        assert_eq!(attrs.companions(), "");
        assert_eq!(attrs.icons(), "");
    }

    #[test]
    fn test_volume_range() {
        let mut attrs = AttributeSet::new();
        for v in [0i64, 1, 50, 99, 100] {
            attrs.set(AttributeField::Volume, v).unwrap();
            assert_eq!(i64::from(attrs.volume()), v);
        }

        assert!(attrs.set(AttributeField::Volume, 101i64).is_err());
        assert!(attrs.set(AttributeField::Volume, -1i64).is_err());
        assert!(attrs.set(AttributeField::Volume, 42.5).is_err());
        assert_eq!(attrs.volume(), 100);

        attrs.set(AttributeField::Volume, 30.0).unwrap();
        assert_eq!(attrs.volume(), 30);
    }

    #[test]
    fn test_type_validation() {
        let mut attrs = AttributeSet::new();

        let err = attrs.set(AttributeField::Expanded, 1i64).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { field: AttributeField::Expanded, .. }));
        assert!(!attrs.expanded());

        assert!(attrs.set(AttributeField::Width, -10i64).is_err());
        assert!(attrs.set(AttributeField::Width, "640").is_err());
        assert!(attrs.set(AttributeField::Duration, f64::NAN).is_err());
        assert!(attrs.set(AttributeField::Companions, true).is_err());

        attrs.set(AttributeField::Duration, 15i64).unwrap();
        assert_eq!(attrs.duration(), 15.0);
    }

    #[test]
    fn test_view_mode_parsing() {
        let mut attrs = AttributeSet::new();
        attrs.set(AttributeField::ViewMode, "fullscreen").unwrap();
        assert_eq!(attrs.view_mode(), ViewMode::Fullscreen);
        assert_eq!(
            attrs.get(AttributeField::ViewMode),
            AttributeValue::Text("fullscreen".into())
        );

        assert!(attrs.set(AttributeField::ViewMode, "theatre").is_err());
        assert_eq!(attrs.view_mode(), ViewMode::Fullscreen);
    }

    #[test]
    fn test_lookup_by_name() {
        let mut attrs = AttributeSet::new();
        attrs.set_by_name("skippableState", true).unwrap();
        assert_eq!(attrs.get_by_name("skippableState").unwrap(), AttributeValue::Bool(true));

        assert_eq!(
            attrs.get_by_name("autoplay"),
            Err(Error::UnknownField("autoplay".into()))
        );
        assert!(attrs.set_by_name("autoplay", true).is_err());
    }

    #[test]
    fn test_snapshot_keys() {
        let json = serde_json::to_value(AttributeSet::new()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), AttributeField::ALL.len());
        for field in AttributeField::ALL {
            assert!(obj.contains_key(field.name()), "missing {}", field);
        }
        assert_eq!(obj["viewMode"], "normal");
    }
}
