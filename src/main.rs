use std::collections::HashMap;

use clap::{Args, Parser, Subcommand, ValueEnum};
use org_login::{
    BinderConfig, LoginError, LoginPage, LoginPageConfig, LoginRedirectBinder, LoginState,
    OrgSelector, PageLocation, QueryEncoding, SalesforceProvider, StateTrace,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(
    name = "org-login",
    about = "Build Salesforce OAuth login redirects for a main and a secondary org."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the authorization URL for a login button.
    Url(LoginArgs),
    /// Print the authorization URL and open it in the browser.
    Login(LoginArgs),
    /// Serve the login page.
    Serve(ServeArgs),
    /// Decode a `state` value returned to the callback.
    DecodeState { state: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrgArg {
    Main,
    Secondary,
}

impl From<OrgArg> for OrgSelector {
    fn from(org: OrgArg) -> Self {
        match org {
            OrgArg::Main => OrgSelector::Main,
            OrgArg::Secondary => OrgSelector::Secondary,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TraceArg {
    PerButton,
    Always,
    Never,
}

impl From<TraceArg> for StateTrace {
    fn from(trace: TraceArg) -> Self {
        match trace {
            TraceArg::PerButton => StateTrace::PerButton,
            TraceArg::Always => StateTrace::Always,
            TraceArg::Never => StateTrace::Never,
        }
    }
}

#[derive(Debug, Args)]
struct BinderArgs {
    /// Percent-encode query values instead of passing them through.
    #[arg(long)]
    percent_encode: bool,
    /// Which clicks log the state object.
    #[arg(long, value_enum, default_value_t = TraceArg::PerButton)]
    trace: TraceArg,
}

impl BinderArgs {
    fn config(&self) -> BinderConfig {
        let encoding = if self.percent_encode {
            QueryEncoding::PercentEncoded
        } else {
            QueryEncoding::Raw
        };
        BinderConfig::default()
            .with_encoding(encoding)
            .with_state_trace(self.trace.into())
    }
}

#[derive(Debug, Args)]
struct LoginArgs {
    #[arg(value_enum)]
    org: OrgArg,
    /// Environment selector value; only `Sandbox` picks the sandbox host.
    #[arg(long = "env")]
    environment: Option<String>,
    #[arg(long, env = "ORG_LOGIN_CLIENT_ID", default_value = "")]
    client_id: String,
    /// URL of the page the login button lives on.
    #[arg(long, default_value = "http://localhost:5000")]
    origin: String,
    #[command(flatten)]
    binder: BinderArgs,
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// Scheme the browser uses to reach the page, e.g. behind a TLS proxy.
    #[arg(long, default_value = "http")]
    scheme: String,
    /// Client id pre-filled into the login form.
    #[arg(long, env = "ORG_LOGIN_CLIENT_ID")]
    client_id: Option<String>,
    #[command(flatten)]
    binder: BinderArgs,
}

#[tokio::main]
async fn main() -> Result<(), LoginError> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Url(args) => run_url(args),
        Command::Login(args) => run_login(args),
        Command::Serve(args) => run_serve(args).await,
        Command::DecodeState { state } => run_decode_state(&state),
    }
}

fn click<N>(args: LoginArgs, navigator: &mut N) -> Result<(), LoginError>
where
    N: org_login::Navigator,
{
    let binder = LoginRedirectBinder::new(SalesforceProvider, args.binder.config());
    let org = OrgSelector::from(args.org);
    let button = binder.button(org).ok_or(LoginError::UnboundButton(org))?;

    let mut form = HashMap::new();
    if let Some(environment) = args.environment {
        form.insert(button.environment_field.clone(), environment);
    }
    form.insert(binder.config().client_id_field.clone(), args.client_id);

    let location = PageLocation::parse(&args.origin)?;
    binder.click(org, &form, &location, navigator)?;
    Ok(())
}

fn run_url(args: LoginArgs) -> Result<(), LoginError> {
    click(args, &mut |url: &str| -> Result<(), LoginError> {
        println!("{url}");
        Ok(())
    })
}

fn run_login(args: LoginArgs) -> Result<(), LoginError> {
    click(args, &mut |url: &str| -> Result<(), LoginError> {
        eprintln!("Authorization URL:\n{url}");
        if let Err(err) = webbrowser::open(url) {
            tracing::warn!(%err, "failed to open browser automatically");
        }
        Ok(())
    })
}

async fn run_serve(args: ServeArgs) -> Result<(), LoginError> {
    let mut config = LoginPageConfig::new(args.host, args.port)
        .with_scheme(args.scheme)
        .with_binder_config(args.binder.config());
    if let Some(client_id) = args.client_id {
        config = config.with_client_id(client_id);
    }
    let page = LoginPage::from_config(SalesforceProvider, config);
    eprintln!("Login page: {}", page.config().page_url());
    page.serve().await
}

fn run_decode_state(state: &str) -> Result<(), LoginError> {
    let state = LoginState::decode(state)?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
