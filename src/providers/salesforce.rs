use crate::{Environment, OAuthProvider};

const PRODUCTION_HOST: &str = "https://login.salesforce.com";
const SANDBOX_HOST: &str = "https://test.salesforce.com";
const AUTHORIZE_PATH: &str = "/services/oauth2/authorize";

const AUTHORIZE_PARAMS: &[(&str, &str)] = &[("prompt", "login")];

#[derive(Debug, Clone, Copy, Default)]
pub struct SalesforceProvider;

impl OAuthProvider for SalesforceProvider {
    fn id(&self) -> &'static str {
        "salesforce"
    }

    fn authorize_host(&self, environment: Environment) -> &'static str {
        match environment {
            Environment::Sandbox => SANDBOX_HOST,
            Environment::Production => PRODUCTION_HOST,
        }
    }

    fn authorize_path(&self) -> &'static str {
        AUTHORIZE_PATH
    }

    fn authorize_params(&self) -> Vec<(String, String)> {
        AUTHORIZE_PARAMS
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }
}
