use serde::{Deserialize, Serialize};

/// Query parameters sent to the QRNG endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrngRequest {
    pub length: usize,
    #[serde(rename = "type")]
    pub kind: String,
}

impl QrngRequest {
    pub fn uint8(length: usize) -> Self {
        Self {
            length,
            kind: "uint8".to_string(),
        }
    }
}

/// Response body of the QRNG endpoint
///
/// `data` is kept wide so out-of-range values can be rejected instead of
/// failing deserialization silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrngResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<i64>,
}
