use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{LoginError, OrgSelector};

/// Value carried through the authorization server in the `state` parameter.
///
/// Serialized as compact JSON (`{"org":..,"type":..}`) and then standard
/// base64. An unset environment leaves out the `type` key entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginState {
    pub org: OrgSelector,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl LoginState {
    pub fn new(org: OrgSelector, environment: Option<String>) -> Self {
        Self { org, environment }
    }

    pub fn to_json(&self) -> Result<String, LoginError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn encode(&self) -> Result<String, LoginError> {
        Ok(STANDARD.encode(self.to_json()?))
    }

    /// Reverses [`LoginState::encode`].
    ///
    /// The value travels unescaped, so a callback that form-decodes its query
    /// sees `+` as a space. Spaces are mapped back before decoding.
    pub fn decode(encoded: &str) -> Result<Self, LoginError> {
        let repaired = encoded.replace(' ', "+");
        let bytes = STANDARD.decode(repaired)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
