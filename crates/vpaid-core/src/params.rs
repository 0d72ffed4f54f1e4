//! Creative parameter loader
//!
//! The ad server delivers an opaque `AdParameters` string alongside the
//! creative. For this creative it is a JSON object listing candidate media
//! files; only the first one is played.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A playable media file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Source locator
    pub url: String,
    /// MIME type, e.g. `video/mp4`
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl MediaDescriptor {
    pub fn new(url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: mime_type.into(),
        }
    }
}

impl std::fmt::Display for MediaDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.url, self.mime_type)
    }
}

/// Parsed `AdParameters` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeParameters {
    /// Candidate media files, in preference order
    pub videos: Vec<MediaDescriptor>,
}

impl CreativeParameters {
    /// Parse a raw payload. An empty media list is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let params: CreativeParameters = serde_json::from_str(raw)
            .map_err(|e| Error::MalformedParameters(e.to_string()))?;

        if params.videos.is_empty() {
            return Err(Error::MalformedParameters("videos list is empty".into()));
        }
        Ok(params)
    }

    /// The media file that gets played
    pub fn primary(&self) -> &MediaDescriptor {
        // parse() guarantees at least one entry
        &self.videos[0]
    }
}

/// Creative data handed over by the host at init time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeData {
    #[serde(rename = "AdParameters", default)]
    pub ad_parameters: String,
}

impl CreativeData {
    pub fn new(ad_parameters: impl Into<String>) -> Self {
        Self {
            ad_parameters: ad_parameters.into(),
        }
    }
}

/// Resolve the media file to play from a raw `AdParameters` payload
pub fn resolve(raw: &str) -> Result<MediaDescriptor> {
    let params = CreativeParameters::parse(raw)?;
    Ok(params.primary().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_first_video() {
        let raw = r#"{"videos":[
            {"url":"http://x/v.mp4","type":"video/mp4"},
            {"url":"http://x/v.webm","type":"video/webm"}
        ]}"#;
        let media = resolve(raw).unwrap();
        assert_eq!(media, MediaDescriptor::new("http://x/v.mp4", "video/mp4"));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let raw = r#"{"clickThrough":"http://x","videos":[{"url":"a.mp4","type":"video/mp4","bitrate":800}]}"#;
        assert_eq!(resolve(raw).unwrap().url, "a.mp4");
    }

    #[test]
    fn test_empty_list_rejected() {
        let err = resolve(r#"{"videos":[]}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedParameters(_)));
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        for raw in ["", "not json", "{}", r#"{"videos":{}}"#, r#"{"videos":[{"url":"a.mp4"}]}"#] {
            assert!(
                matches!(resolve(raw), Err(Error::MalformedParameters(_))),
                "accepted {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_creative_data_field_name() {
        let data: CreativeData =
            serde_json::from_str(r#"{"AdParameters":"{\"videos\":[]}"}"#).unwrap();
        assert_eq!(data.ad_parameters, r#"{"videos":[]}"#);
    }
}
