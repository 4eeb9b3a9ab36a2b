mod provider;
mod salesforce;

pub use provider::OAuthProvider;
pub use salesforce::SalesforceProvider;
