mod config;
mod http;
mod server;

pub use config::LoginPageConfig;
pub use server::LoginPage;
