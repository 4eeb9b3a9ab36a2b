use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{HOST, LOCATION},
    },
    response::{Html, IntoResponse, Response},
};

use crate::{
    LoginError, LoginRedirectBinder, Navigator, OAuthProvider, OrgSelector, PageLocation,
};

pub(super) struct LoginPageState<P: OAuthProvider> {
    pub(super) binder: Arc<LoginRedirectBinder<P>>,
    pub(super) scheme: String,
    pub(super) fallback_host: String,
    pub(super) index_html: String,
    pub(super) error_html: String,
}

impl<P: OAuthProvider> Clone for LoginPageState<P> {
    fn clone(&self) -> Self {
        Self {
            binder: self.binder.clone(),
            scheme: self.scheme.clone(),
            fallback_host: self.fallback_host.clone(),
            index_html: self.index_html.clone(),
            error_html: self.error_html.clone(),
        }
    }
}

/// Captures the navigation target as a `Location` header value.
#[derive(Debug, Default)]
struct RedirectNavigator {
    location: Option<HeaderValue>,
}

impl Navigator for RedirectNavigator {
    fn navigate(&mut self, url: &str) -> Result<(), LoginError> {
        let location = HeaderValue::from_str(url).map_err(|err| LoginError::Navigation {
            message: err.to_string(),
        })?;
        self.location = Some(location);
        Ok(())
    }
}

pub(super) async fn index_handler<P: OAuthProvider>(
    State(state): State<LoginPageState<P>>,
) -> impl IntoResponse {
    Html(state.index_html)
}

pub(super) async fn login_handler<P: OAuthProvider>(
    State(state): State<LoginPageState<P>>,
    Path(org): Path<String>,
    Query(fields): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let org = match org.parse::<OrgSelector>() {
        Ok(org) => org,
        Err(error) => {
            tracing::debug!(%error, "rejected login request");
            return (StatusCode::NOT_FOUND, Html(state.error_html)).into_response();
        }
    };

    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.fallback_host.clone());
    let location = PageLocation::new(state.scheme.as_str(), host);

    let mut redirect = RedirectNavigator::default();
    match state.binder.click(org, &fields, &location, &mut redirect) {
        Ok(auth) => {
            tracing::debug!(
                %org,
                environment = ?auth.environment,
                "redirecting to authorization server"
            );
            match redirect.location {
                Some(target) => (StatusCode::SEE_OTHER, [(LOCATION, target)]).into_response(),
                None => (StatusCode::INTERNAL_SERVER_ERROR, Html(state.error_html)).into_response(),
            }
        }
        Err(error) => {
            tracing::warn!(%org, %error, "login redirect failed");
            let status = match error {
                LoginError::UnboundButton(_) => StatusCode::NOT_FOUND,
                LoginError::Navigation { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Html(state.error_html)).into_response()
        }
    }
}

pub(super) async fn fallback_handler<P: OAuthProvider>(
    State(state): State<LoginPageState<P>>,
) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(state.error_html))
}
