use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One URL scheduled for capture, with its position in the originating list
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// URL to capture
    pub url: String,

    /// 0-based position in the input list
    pub index: usize,
}

impl CaptureRequest {
    /// Create a new capture request
    pub fn new(url: String, index: usize) -> Self {
        Self { url, index }
    }
}

/// The outcome of one capture attempt
///
/// Exactly one of `image` and `error` is set; the constructors below are the
/// only way results are produced, which keeps the invariant intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResult {
    /// URL the capture was attempted for
    pub url: String,

    /// 0-based position in the input list
    pub index: usize,

    /// Page title (best effort; a generated placeholder when unavailable)
    pub title: String,

    /// Whether the capture produced an image
    pub success: bool,

    /// Encoded image bytes, present iff the capture succeeded
    #[serde(with = "image_bytes", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,

    /// Failure description, present iff the capture failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the capture attempt finished
    pub timestamp: DateTime<Utc>,
}

impl CaptureResult {
    /// A successful capture carrying its image bytes
    pub fn captured(request: &CaptureRequest, title: String, image: Vec<u8>) -> Self {
        Self {
            url: request.url.clone(),
            index: request.index,
            title,
            success: true,
            image: Some(image),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A failed capture carrying its error description
    pub fn failed(request: &CaptureRequest, title: String, error: String) -> Self {
        Self {
            url: request.url.clone(),
            index: request.index,
            title,
            success: false,
            image: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }
}

/// Image bytes travel as base64 strings on the wire
mod image_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
