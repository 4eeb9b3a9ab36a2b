//! OAuth 2.0 authorization-code login redirects for a pair of Salesforce orgs.
//!
//! A [`LoginRedirectBinder`] turns a click on the "main" or "secondary" login
//! button into an authorization URL and hands it to a [`Navigator`]. The
//! `local-server` feature adds a small login page that answers each button
//! with a redirect.

mod binder;
mod error;
#[cfg(feature = "local-server")]
mod login_page;
mod providers;
mod query;
mod state;
mod types;

pub use binder::{
    BinderConfig, LoginButton, LoginRedirectBinder, Navigator, STATE_TRACE_TARGET, StateTrace,
};
pub use error::LoginError;
#[cfg(feature = "local-server")]
pub use login_page::{LoginPage, LoginPageConfig};
pub use providers::{OAuthProvider, SalesforceProvider};
pub use query::QueryEncoding;
pub use state::LoginState;
pub use types::{
    AuthorizationRequest, Environment, FormFields, LoginRequest, OrgSelector, PageLocation,
};
