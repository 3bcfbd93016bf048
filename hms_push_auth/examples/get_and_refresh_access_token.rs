use std::time::Duration;

use clap::Parser;
use hms_push_auth::{AppId, AppSecret, AuthClient, CachedAuthClient, Config, RequestContext};

#[derive(Debug, Parser)]
struct Opts {
    /// The authentication endpoint's token URL
    #[arg(
        short = 'u',
        long,
        env = "HMS_AUTH_URL",
        default_value = hms_push_auth::config::DEFAULT_AUTH_URL
    )]
    auth_url: String,

    /// The application ID
    #[arg(short = 'i', long, env = "HMS_APP_ID")]
    app_id: AppId,

    /// The application secret
    #[arg(short = 's', long, env = "HMS_APP_SECRET", hide_env_values = true)]
    app_secret: AppSecret,

    /// Seconds to wait before forcing a refresh
    #[arg(short, long, default_value_t = 10)]
    wait: u64,

    /// Seconds allowed for each token request
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let config = Config::new(opts.app_id, opts.app_secret, opts.auth_url);
    let request_timeout = Duration::from_secs(opts.timeout);

    let client = AuthClient::new(&config)?;
    let cached = CachedAuthClient::connect(
        client,
        &RequestContext::new().with_timeout(request_timeout),
    )
    .await?;

    if let Some(token) = cached.token() {
        tracing::info!(
            token = format_args!("{:#?}", token.access_token()),
            expired_at = token.expired_at().0,
            "first access token"
        );
    }

    tracing::info!(wait = opts.wait, "waiting before refresh");
    tokio::time::sleep(Duration::from_secs(opts.wait)).await;

    let token = cached
        .refresh(&RequestContext::new().with_timeout(request_timeout))
        .await?;

    tracing::info!(
        token = format_args!("{:#?}", token.access_token()),
        expired_at = token.expired_at().0,
        "refreshed access token"
    );

    Ok(())
}
