use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use followcrawl::{
    ExpansionWorker, FollowStore, FrontierSelector, HydrationWorker, Neo4jStore, SocialApi,
    Supervisor,
};
use followcrawl_common::config::{
    DEFAULT_EXPANSION_INTERVAL_SECS, DEFAULT_HYDRATION_BATCH_SIZE,
    DEFAULT_HYDRATION_INTERVAL_SECS, DEFAULT_NEO4J_URI, DEFAULT_NEO4J_USER,
    DEFAULT_ROOT_USER_ID, DEFAULT_SEED_SCREEN_NAME,
};
use followcrawl_common::Config;
use followcrawl_graph::{migrate::migrate, GraphClient};
use twitter_client::{Credentials, TwitterClient};

#[derive(Parser)]
#[command(
    name = "followcrawl",
    about = "Crawl the Twitter follow graph into Neo4j and backfill profiles"
)]
struct Cli {
    /// Consumer Key from Twitter. See: https://dev.twitter.com/apps/new
    #[arg(long = "consumerkey", env = "TWITTER_CONSUMER_KEY", default_value = "", hide_env_values = true)]
    consumer_key: String,

    /// Consumer Secret from Twitter. See: https://dev.twitter.com/apps/new
    #[arg(long = "consumersecret", env = "TWITTER_CONSUMER_SECRET", default_value = "", hide_env_values = true)]
    consumer_secret: String,

    /// Access Token from Twitter.
    #[arg(long = "accesstoken", env = "TWITTER_ACCESS_TOKEN", default_value = "", hide_env_values = true)]
    access_token: String,

    /// Access Token Secret from Twitter.
    #[arg(long = "accesstokensecret", env = "TWITTER_ACCESS_TOKEN_SECRET", default_value = "", hide_env_values = true)]
    access_token_secret: String,

    #[arg(long, env = "NEO4J_URI", default_value = DEFAULT_NEO4J_URI)]
    neo4j_uri: String,

    #[arg(long, env = "NEO4J_USER", default_value = DEFAULT_NEO4J_USER)]
    neo4j_user: String,

    #[arg(long, env = "NEO4J_PASSWORD", default_value = "", hide_env_values = true)]
    neo4j_password: String,

    /// Account the frontier is measured from (two FOLLOWS hops out).
    #[arg(long, env = "FOLLOWCRAWL_ROOT_USER_ID", default_value_t = DEFAULT_ROOT_USER_ID)]
    root_user_id: u64,

    /// Handle re-resolved to restart the crawl when the frontier is empty.
    #[arg(long, env = "FOLLOWCRAWL_SEED_SCREEN_NAME", default_value = DEFAULT_SEED_SCREEN_NAME)]
    seed_screen_name: String,

    #[arg(long, default_value_t = DEFAULT_EXPANSION_INTERVAL_SECS)]
    expansion_interval_secs: u64,

    #[arg(long, default_value_t = DEFAULT_HYDRATION_INTERVAL_SECS)]
    hydration_interval_secs: u64,

    /// Nodes hydrated per bulk profile lookup (at most 100).
    #[arg(long, default_value_t = DEFAULT_HYDRATION_BATCH_SIZE)]
    hydration_batch_size: usize,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            consumer_key: self.consumer_key,
            consumer_secret: self.consumer_secret,
            access_token: self.access_token,
            access_token_secret: self.access_token_secret,
            neo4j_uri: self.neo4j_uri,
            neo4j_user: self.neo4j_user,
            neo4j_password: self.neo4j_password,
            root_user_id: self.root_user_id,
            seed_screen_name: self.seed_screen_name,
            expansion_interval_secs: self.expansion_interval_secs,
            hydration_interval_secs: self.hydration_interval_secs,
            hydration_batch_size: self.hydration_batch_size,
        }
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("followcrawl=info".parse()?);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let config = cli.into_config();
    if let Err(e) = config.validate() {
        println!("{e}");
        println!("---");
        println!("{}", Cli::command().render_usage());
        std::process::exit(1);
    }

    info!("followcrawl starting...");
    config.log_redacted();

    // Connect to Neo4j
    let client =
        GraphClient::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
            .await?;

    // Run migrations (idempotent)
    migrate(&client).await?;

    let store: Arc<dyn FollowStore> = Arc::new(Neo4jStore::new(client));
    let api: Arc<dyn SocialApi> = Arc::new(TwitterClient::new(Credentials::new(
        config.consumer_key.clone(),
        config.consumer_secret.clone(),
        config.access_token.clone(),
        config.access_token_secret.clone(),
    )));

    let frontier = FrontierSelector::new(
        store.clone(),
        api.clone(),
        config.root_user_id,
        config.seed_screen_name.clone(),
    );
    let expansion = Arc::new(ExpansionWorker::new(
        frontier,
        store.clone(),
        api.clone(),
        config.expansion_interval(),
    ));
    let hydration = Arc::new(HydrationWorker::new(
        store,
        api,
        config.hydration_batch_size,
        config.hydration_interval(),
    ));

    let supervisor = Supervisor::default();
    let workers = async {
        tokio::join!(
            supervisor.run("expansion", || expansion.clone().run()),
            supervisor.run("hydration", || hydration.clone().run()),
        )
    };

    tokio::select! {
        (expansion_restarts, hydration_restarts) = workers => {
            error!(expansion_restarts, hydration_restarts, "Crawl loops exited");
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested, stopping crawl loops");
        }
    }

    Ok(())
}
