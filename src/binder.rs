use crate::query::build_url;
use crate::{
    AuthorizationRequest, FormFields, LoginError, LoginRequest, OAuthProvider, OrgSelector,
    PageLocation, QueryEncoding,
};

pub const STATE_TRACE_TARGET: &str = "org_login::state";

const DEFAULT_CLIENT_ID_FIELD: &str = "client-id";
const DEFAULT_CALLBACK_PATH: &str = "/auth/authorized";
const MAIN_ENVIRONMENT_FIELD: &str = "org_one_env";
const SECONDARY_ENVIRONMENT_FIELD: &str = "org_env";

/// Receives the computed URL; a browser assigns it to `window.location`.
pub trait Navigator {
    fn navigate(&mut self, url: &str) -> Result<(), LoginError>;
}

impl<F> Navigator for F
where
    F: FnMut(&str) -> Result<(), LoginError>,
{
    fn navigate(&mut self, url: &str) -> Result<(), LoginError> {
        self(url)
    }
}

/// Which clicks emit the state trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateTrace {
    /// Each button's own `trace_state` flag decides.
    #[default]
    PerButton,
    Always,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginButton {
    pub org: OrgSelector,
    pub environment_field: String,
    pub trace_state: bool,
}

impl LoginButton {
    pub fn new(org: OrgSelector, environment_field: impl Into<String>) -> Self {
        Self {
            org,
            environment_field: environment_field.into(),
            trace_state: false,
        }
    }

    pub fn with_trace_state(mut self, trace_state: bool) -> Self {
        self.trace_state = trace_state;
        self
    }
}

#[derive(Debug, Clone)]
pub struct BinderConfig {
    pub client_id_field: String,
    pub callback_path: String,
    pub encoding: QueryEncoding,
    pub state_trace: StateTrace,
    pub buttons: Vec<LoginButton>,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self::new()
            .with_button(LoginButton::new(OrgSelector::Main, MAIN_ENVIRONMENT_FIELD))
            .with_button(
                LoginButton::new(OrgSelector::Secondary, SECONDARY_ENVIRONMENT_FIELD)
                    .with_trace_state(true),
            )
    }
}

impl BinderConfig {
    /// A config with no buttons bound; see [`BinderConfig::default`] for the
    /// standard main/secondary pair.
    pub fn new() -> Self {
        Self {
            client_id_field: DEFAULT_CLIENT_ID_FIELD.to_string(),
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            encoding: QueryEncoding::default(),
            state_trace: StateTrace::default(),
            buttons: Vec::new(),
        }
    }

    pub fn with_client_id_field(mut self, field: impl Into<String>) -> Self {
        self.client_id_field = field.into();
        self
    }

    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = normalize_path(path.into());
        self
    }

    pub fn with_encoding(mut self, encoding: QueryEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_state_trace(mut self, state_trace: StateTrace) -> Self {
        self.state_trace = state_trace;
        self
    }

    /// Binds `button`, replacing any button already bound to the same org.
    pub fn with_button(mut self, button: LoginButton) -> Self {
        self.buttons.retain(|bound| bound.org != button.org);
        self.buttons.push(button);
        self
    }
}

#[derive(Debug, Clone)]
pub struct LoginRedirectBinder<P: OAuthProvider> {
    provider: P,
    config: BinderConfig,
}

impl<P: OAuthProvider> LoginRedirectBinder<P> {
    pub fn new(provider: P, config: BinderConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    pub fn button(&self, org: OrgSelector) -> Option<&LoginButton> {
        self.config.buttons.iter().find(|button| button.org == org)
    }

    pub fn login_request<F>(
        &self,
        org: OrgSelector,
        form: &F,
        location: &PageLocation,
    ) -> Result<LoginRequest, LoginError>
    where
        F: FormFields + ?Sized,
    {
        let button = self.button(org).ok_or(LoginError::UnboundButton(org))?;
        Ok(LoginRequest {
            org,
            environment: form.field(&button.environment_field),
            client_id: form.field(&self.config.client_id_field).unwrap_or_default(),
            callback_url: location.callback_url(&self.config.callback_path),
        })
    }

    pub fn authorization_url(
        &self,
        request: &LoginRequest,
    ) -> Result<AuthorizationRequest, LoginError> {
        let environment = request.environment_kind();
        let state = request.state();
        let encoded_state = state.encode()?;

        let mut params = vec![
            ("response_type".to_string(), "code".to_string()),
            ("client_id".to_string(), request.client_id.clone()),
        ];
        params.extend(self.provider.authorize_params());
        params.push(("redirect_uri".to_string(), request.callback_url.clone()));
        params.push(("state".to_string(), encoded_state.clone()));

        let authorization_url = build_url(
            &self.provider.authorize_url(environment),
            &params,
            self.config.encoding,
        )?;

        Ok(AuthorizationRequest {
            authorization_url,
            environment,
            state,
            encoded_state,
        })
    }

    /// Handles one click: reads the form, builds the URL and navigates to it.
    pub fn click<F, N>(
        &self,
        org: OrgSelector,
        form: &F,
        location: &PageLocation,
        navigator: &mut N,
    ) -> Result<AuthorizationRequest, LoginError>
    where
        F: FormFields + ?Sized,
        N: Navigator + ?Sized,
    {
        let request = self.login_request(org, form, location)?;
        let auth = self.authorization_url(&request)?;

        if self.traces(org) {
            tracing::info!(target: STATE_TRACE_TARGET, state = ?auth.state, "login state");
        }

        navigator.navigate(&auth.authorization_url)?;
        Ok(auth)
    }

    fn traces(&self, org: OrgSelector) -> bool {
        match self.config.state_trace {
            StateTrace::Always => true,
            StateTrace::Never => false,
            StateTrace::PerButton => self.button(org).is_some_and(|button| button.trace_state),
        }
    }
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use url::Url;

    use super::*;
    use crate::{Environment, LoginState, SalesforceProvider};

    struct StateTraceCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for StateTraceCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() == STATE_TRACE_TARGET {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn form(main_env: &str, secondary_env: &str, client_id: &str) -> HashMap<String, String> {
        HashMap::from([
            ("org_one_env".to_string(), main_env.to_string()),
            ("org_env".to_string(), secondary_env.to_string()),
            ("client-id".to_string(), client_id.to_string()),
        ])
    }

    fn ignore(_: &str) -> Result<(), LoginError> {
        Ok(())
    }

    fn location() -> PageLocation {
        PageLocation::new("http", "localhost:5000")
    }

    fn binder() -> LoginRedirectBinder<SalesforceProvider> {
        LoginRedirectBinder::new(SalesforceProvider, BinderConfig::default())
    }

    fn query(url: &str) -> HashMap<String, String> {
        Url::parse(url).unwrap().query_pairs().into_owned().collect()
    }

    #[test]
    fn production_click_builds_full_url() {
        let mut visited = Vec::new();
        let auth = binder()
            .click(
                OrgSelector::Main,
                &form("Production", "Sandbox", "ABC123"),
                &location(),
                &mut |url: &str| -> Result<(), LoginError> {
                    visited.push(url.to_string());
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(auth.environment, Environment::Production);
        assert_eq!(
            auth.authorization_url,
            "https://login.salesforce.com/services/oauth2/authorize?response_type=code\
             &client_id=ABC123&prompt=login\
             &redirect_uri=http://localhost:5000/auth/authorized\
             &state=eyJvcmciOiJtYWluIiwidHlwZSI6IlByb2R1Y3Rpb24ifQ=="
        );
        assert_eq!(visited, vec![auth.authorization_url.clone()]);
    }

    #[test]
    fn sandbox_selects_test_host() {
        let auth = binder()
            .click(
                OrgSelector::Secondary,
                &form("Production", "Sandbox", "ABC123"),
                &location(),
                &mut ignore,
            )
            .unwrap();

        assert_eq!(auth.environment, Environment::Sandbox);
        assert!(
            auth.authorization_url
                .starts_with("https://test.salesforce.com/services/oauth2/authorize?")
        );
    }

    #[test]
    fn each_button_reads_its_own_environment_field() {
        let binder = binder();
        let fields = form("Sandbox", "Production", "id");

        let main = binder
            .authorization_url(
                &binder
                    .login_request(OrgSelector::Main, &fields, &location())
                    .unwrap(),
            )
            .unwrap();
        let secondary = binder
            .authorization_url(
                &binder
                    .login_request(OrgSelector::Secondary, &fields, &location())
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(main.environment, Environment::Sandbox);
        assert_eq!(secondary.environment, Environment::Production);
    }

    #[test]
    fn state_decodes_to_org_and_environment() {
        let binder = binder();
        let fields = form("Production", "Sandbox", "id");

        for (org, env) in [
            (OrgSelector::Main, "Production"),
            (OrgSelector::Secondary, "Sandbox"),
        ] {
            let request = binder.login_request(org, &fields, &location()).unwrap();
            let auth = binder.authorization_url(&request).unwrap();
            let state = query(&auth.authorization_url).remove("state").unwrap();
            assert_eq!(
                LoginState::decode(&state).unwrap(),
                LoginState::new(org, Some(env.to_string()))
            );
        }
    }

    #[test]
    fn redirect_uri_ignores_environment_and_client_id() {
        let binder = binder();
        for fields in [form("Sandbox", "Sandbox", ""), form("x", "y", "other")] {
            for org in [OrgSelector::Main, OrgSelector::Secondary] {
                let request = binder.login_request(org, &fields, &location()).unwrap();
                let auth = binder.authorization_url(&request).unwrap();
                assert_eq!(
                    query(&auth.authorization_url).get("redirect_uri").map(String::as_str),
                    Some("http://localhost:5000/auth/authorized")
                );
            }
        }
    }

    #[test]
    fn empty_client_id_is_not_rejected() {
        let auth = binder()
            .click(
                OrgSelector::Main,
                &form("Production", "Production", ""),
                &location(),
                &mut ignore,
            )
            .unwrap();
        assert!(auth.authorization_url.contains("&client_id=&prompt=login&"));
    }

    #[test]
    fn missing_fields_default_to_production_and_empty_id() {
        let fields: HashMap<String, String> = HashMap::new();
        let binder = binder();
        let request = binder
            .login_request(OrgSelector::Main, &fields, &location())
            .unwrap();
        assert_eq!(request.environment, None);
        assert_eq!(request.client_id, "");

        let auth = binder.authorization_url(&request).unwrap();
        assert_eq!(auth.environment, Environment::Production);
        assert_eq!(auth.state.to_json().unwrap(), r#"{"org":"main"}"#);
    }

    #[test]
    fn raw_encoding_passes_client_id_through() {
        let auth = binder()
            .authorization_url(&LoginRequest {
                org: OrgSelector::Main,
                environment: None,
                client_id: "a&b c".to_string(),
                callback_url: "http://localhost:5000/auth/authorized".to_string(),
            })
            .unwrap();
        assert!(auth.authorization_url.contains("client_id=a&b c&prompt"));
    }

    #[test]
    fn percent_encoding_keeps_parameter_order() {
        let binder = LoginRedirectBinder::new(
            SalesforceProvider,
            BinderConfig::default().with_encoding(QueryEncoding::PercentEncoded),
        );
        let request = binder
            .login_request(OrgSelector::Secondary, &form("", ">>>", "a b"), &location())
            .unwrap();
        let auth = binder.authorization_url(&request).unwrap();

        let keys: Vec<String> = Url::parse(&auth.authorization_url)
            .unwrap()
            .query_pairs()
            .map(|(key, _)| key.into_owned())
            .collect();
        assert_eq!(
            keys,
            ["response_type", "client_id", "prompt", "redirect_uri", "state"]
        );
        assert!(auth.authorization_url.contains("client_id=a+b&"));
        assert!(
            auth.authorization_url
                .contains("redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fauth%2Fauthorized")
        );
        assert!(!auth.encoded_state.is_empty());
        assert!(!auth.authorization_url.contains(&auth.encoded_state));
        assert_eq!(
            LoginState::decode(&query(&auth.authorization_url)["state"]).unwrap(),
            LoginState::new(OrgSelector::Secondary, Some(">>>".to_string()))
        );
    }

    #[test]
    fn only_secondary_click_traces_state_before_navigation() {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(StateTraceCounter(count.clone()));
        let binder = binder();
        let fields = form("Production", "Sandbox", "ABC123");

        tracing::subscriber::with_default(subscriber, || {
            let mut traced_at_navigation = Vec::new();
            for org in [OrgSelector::Main, OrgSelector::Secondary] {
                let before = count.load(Ordering::SeqCst);
                let mut record = |_: &str| -> Result<(), LoginError> {
                    traced_at_navigation.push(count.load(Ordering::SeqCst) - before);
                    Ok(())
                };
                binder
                    .click(org, &fields, &location(), &mut record)
                    .unwrap();
            }
            assert_eq!(traced_at_navigation, vec![0, 1]);
        });
    }

    #[test]
    fn state_trace_policy_overrides_buttons() {
        let fields = form("Production", "Sandbox", "ABC123");
        for (policy, expected) in [(StateTrace::Always, 2), (StateTrace::Never, 0)] {
            let count = Arc::new(AtomicUsize::new(0));
            let subscriber =
                tracing_subscriber::registry().with(StateTraceCounter(count.clone()));
            let binder = LoginRedirectBinder::new(
                SalesforceProvider,
                BinderConfig::default().with_state_trace(policy),
            );

            tracing::subscriber::with_default(subscriber, || {
                for org in [OrgSelector::Main, OrgSelector::Secondary] {
                    binder
                        .click(org, &fields, &location(), &mut ignore)
                        .unwrap();
                }
            });
            assert_eq!(count.load(Ordering::SeqCst), expected, "{policy:?}");
        }
    }

    #[test]
    fn unbound_org_is_an_error() {
        let binder = LoginRedirectBinder::new(
            SalesforceProvider,
            BinderConfig::new().with_button(LoginButton::new(OrgSelector::Main, "env")),
        );
        let result = binder.click(
            OrgSelector::Secondary,
            &form("", "", ""),
            &location(),
            &mut ignore,
        );
        assert!(matches!(
            result,
            Err(LoginError::UnboundButton(OrgSelector::Secondary))
        ));
    }

    #[test]
    fn navigator_failure_propagates() {
        let result = binder().click(
            OrgSelector::Main,
            &form("", "", "id"),
            &location(),
            &mut |_: &str| -> Result<(), LoginError> {
                Err(LoginError::Navigation {
                    message: "blocked".to_string(),
                })
            },
        );
        assert!(matches!(result, Err(LoginError::Navigation { .. })));
    }

    #[test]
    fn config_rebinds_buttons_and_normalizes_callback_path() {
        let config = BinderConfig::default()
            .with_button(LoginButton::new(OrgSelector::Main, "main_env"))
            .with_callback_path("oauth/done");
        assert_eq!(config.buttons.len(), 2);
        assert_eq!(config.callback_path, "/oauth/done");

        let binder = LoginRedirectBinder::new(SalesforceProvider, config);
        assert_eq!(
            binder.button(OrgSelector::Main).map(|b| b.environment_field.as_str()),
            Some("main_env")
        );
    }
}
