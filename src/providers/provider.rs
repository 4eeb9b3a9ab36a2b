use crate::Environment;

pub trait OAuthProvider: Send + Sync {
    fn id(&self) -> &'static str;
    fn authorize_host(&self, environment: Environment) -> &'static str;
    fn authorize_path(&self) -> &'static str;

    /// Extra query parameters, placed between `client_id` and `redirect_uri`.
    fn authorize_params(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn authorize_url(&self, environment: Environment) -> String {
        format!(
            "{}{}",
            self.authorize_host(environment),
            self.authorize_path()
        )
    }
}
