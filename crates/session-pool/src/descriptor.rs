//! On-disk session descriptor shape

use serde::Deserialize;

/// One JSON object per file in the sessions directory:
/// `{"auth_key": "...", "session_id": "...", "valid": true}`.
///
/// Hand-written descriptors often carry only the token, so `session_id`
/// is optional (the pool falls back to the file stem) and `valid`
/// defaults to true.
#[derive(Debug, Deserialize)]
pub(crate) struct SessionDescriptor {
    pub auth_key: Option<String>,
    pub session_id: Option<String>,
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}
