use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener as TokioTcpListener;

use crate::{LoginError, LoginRedirectBinder, OAuthProvider};

use super::config::LoginPageConfig;
use super::http::{LoginPageState, fallback_handler, index_handler, login_handler};

/// Serves the login form and answers each button with a redirect to the
/// authorization server.
#[derive(Debug)]
pub struct LoginPage<P: OAuthProvider> {
    binder: Arc<LoginRedirectBinder<P>>,
    config: LoginPageConfig,
}

impl<P: OAuthProvider + 'static> LoginPage<P> {
    pub fn new(provider: P) -> Self {
        Self::from_config(provider, LoginPageConfig::new("127.0.0.1", 5000))
    }

    pub fn from_config(provider: P, config: LoginPageConfig) -> Self {
        let binder = LoginRedirectBinder::new(provider, config.binder.clone());
        Self {
            binder: Arc::new(binder),
            config,
        }
    }

    pub fn config(&self) -> &LoginPageConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        let state = LoginPageState {
            binder: self.binder.clone(),
            scheme: self.config.scheme.clone(),
            fallback_host: self.config.address(),
            index_html: self.config.index_page(),
            error_html: self.config.error_html.clone(),
        };

        Router::new()
            .route("/", get(index_handler::<P>))
            .route("/login/{org}", get(login_handler::<P>))
            .fallback(fallback_handler::<P>)
            .with_state(state)
    }

    pub fn bind(&self) -> Result<TcpListener, LoginError> {
        TcpListener::bind((self.config.host.as_str(), self.config.port)).map_err(LoginError::from)
    }

    pub async fn serve_until<F>(
        &self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), LoginError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        listener.set_nonblocking(true)?;
        let listener = TokioTcpListener::from_std(listener)?;
        tracing::info!(
            address = %listener.local_addr()?,
            provider = self.binder.provider().id(),
            "serving login page"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn serve(&self) -> Result<(), LoginError> {
        let listener = self.bind()?;
        self.serve_until(listener, async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::warn!(%error, "failed to listen for shutdown signal");
            }
        })
        .await
    }
}
