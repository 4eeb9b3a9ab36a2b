use askama_escape::{Html, escape};
use url::Url;

use crate::{BinderConfig, LoginError};

pub(crate) const DEFAULT_INDEX_HTML: &str = include_str!("html/index.html");
pub(crate) const DEFAULT_ERROR_HTML: &str = include_str!("html/error.html");

const DEFAULT_SCHEME: &str = "http";
const CLIENT_ID_PLACEHOLDER: &str = "{{ client_id }}";

#[derive(Debug, Clone)]
pub struct LoginPageConfig {
    pub host: String,
    pub port: u16,
    /// Scheme of the page as the browser sees it, used for the callback URL.
    pub scheme: String,
    /// Pre-filled into the form's client id input.
    pub client_id: Option<String>,
    pub index_html: String,
    pub error_html: String,
    pub binder: BinderConfig,
}

impl LoginPageConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            scheme: DEFAULT_SCHEME.to_string(),
            client_id: None,
            index_html: DEFAULT_INDEX_HTML.to_string(),
            error_html: DEFAULT_ERROR_HTML.to_string(),
            binder: BinderConfig::default(),
        }
    }

    pub fn from_page_url(page_url: &str) -> Result<Self, LoginError> {
        let url = Url::parse(page_url)?;
        let host = url
            .host_str()
            .ok_or_else(|| LoginError::InvalidLocation(format!("{page_url} has no host")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| LoginError::InvalidLocation(format!("{page_url} has no port")))?;
        Ok(Self::new(host, port).with_scheme(url.scheme()))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn page_url(&self) -> String {
        format!("{}://{}/", self.scheme, self.address())
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// The index page with `{{ client_id }}` replaced by the escaped client id.
    pub fn index_page(&self) -> String {
        let client_id = self.client_id.as_deref().unwrap_or_default();
        self.index_html
            .replace(CLIENT_ID_PLACEHOLDER, &escape(client_id, Html).to_string())
    }

    /// The default page uses the field ids of [`BinderConfig::default`].
    pub fn with_index_html(mut self, html: impl Into<String>) -> Self {
        self.index_html = html.into();
        self
    }

    pub fn with_error_html(mut self, html: impl Into<String>) -> Self {
        self.error_html = html.into();
        self
    }

    pub fn with_binder_config(mut self, binder: BinderConfig) -> Self {
        self.binder = binder;
        self
    }
}
