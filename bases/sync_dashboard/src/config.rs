// bases/sync_dashboard/src/config.rs
use clap::Parser;
use std::path::PathBuf;
use sync_settings::DEFAULT_CONFIG_PATH;

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Settings file shared with the CLI
    pub settings_path: PathBuf,
}

/// Web dashboard for playlist sync
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Address to bind; use 0.0.0.0 to expose the dashboard on the network
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// YAML settings file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

impl Config {
    pub fn from_args(args: CliArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            settings_path: args.config,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
