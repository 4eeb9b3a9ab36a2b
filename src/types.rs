use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{LoginError, LoginState};

const SANDBOX: &str = "Sandbox";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgSelector {
    Main,
    Secondary,
}

impl OrgSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for OrgSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrgSelector {
    type Err = LoginError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "main" => Ok(Self::Main),
            "secondary" => Ok(Self::Secondary),
            other => Err(LoginError::UnknownOrg(other.to_string())),
        }
    }
}

/// Deployment environment of the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    /// Only the exact string `Sandbox` selects the sandbox; everything else,
    /// including an unset field, is production.
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            Some(SANDBOX) => Self::Sandbox,
            _ => Self::Production,
        }
    }
}

/// Read access to the login form's controls, keyed by element id.
pub trait FormFields {
    fn field(&self, id: &str) -> Option<String>;
}

impl FormFields for HashMap<String, String> {
    fn field(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

/// Scheme and host (with any non-default port) of the page hosting the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub scheme: String,
    pub host: String,
}

impl PageLocation {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn parse(page_url: &str) -> Result<Self, LoginError> {
        let url = Url::parse(page_url)?;
        let host = url
            .host_str()
            .ok_or_else(|| LoginError::InvalidLocation(format!("{page_url} has no host")))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self::new(url.scheme(), host))
    }

    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    pub fn callback_url(&self, path: &str) -> String {
        format!("{}{}", self.origin(), path)
    }
}

/// Everything read from the page for a single click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub org: OrgSelector,
    pub environment: Option<String>,
    pub client_id: String,
    pub callback_url: String,
}

impl LoginRequest {
    pub fn environment_kind(&self) -> Environment {
        Environment::from_field(self.environment.as_deref())
    }

    pub fn state(&self) -> LoginState {
        LoginState::new(self.org, self.environment.clone())
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    pub environment: Environment,
    pub state: LoginState,
    pub encoded_state: String,
}
