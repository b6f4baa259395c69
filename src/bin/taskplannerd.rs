use clap::Parser;
use taskplanner::config::Config;
use taskplanner::daemon;
use taskplanner::error::Result;

#[derive(Parser, Debug)]
#[command(name = "taskplannerd")]
#[command(about = "Taskplanner HTTP daemon")]
#[command(version = taskplanner::GIT_SHA)]
struct Cli {
    /// JSON config file; flags and env vars override its values.
    #[arg(long, env = "TASKPLANNER_CONFIG")]
    config: Option<String>,

    #[arg(long, env = "TASKPLANNER_HOST")]
    host: Option<String>,

    #[arg(long, env = "TASKPLANNER_PORT")]
    port: Option<u16>,

    #[arg(long, env = "TASKPLANNER_DB")]
    db: Option<String>,

    #[arg(long, env = "TASKPLANNER_STATIC_DIR")]
    static_dir: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match self.config.as_deref() {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(static_dir) = self.static_dir {
            config.static_dir = static_dir;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    taskplanner::logging::init_tracing("taskplannerd");
    let config = Cli::parse().into_config()?;

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("Could not listen for ctrl-c: {}", err);
            futures::future::pending::<()>().await;
        }
        tracing::info!("shutdown requested");
    };

    daemon::run_with_shutdown(&config, shutdown).await
}
