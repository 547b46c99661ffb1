use crate::config::ServerConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "unify-functions")]
#[command(about = "Unifies sample data from four data stores into one JSON report")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    #[command(about = "Run the custom handler server the Functions host forwards triggers to")]
    Serve(ServeArgs),
    #[command(about = "Run one unification and print the result")]
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "FUNCTIONS_CUSTOMHANDLER_PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, help = "Fire the timer trigger in-process instead of relying on the host")]
    pub standalone_timer: bool,

    #[arg(long, default_value = "30")]
    pub timer_interval_minutes: u64,

    #[arg(long, help = "Emit JSON log lines")]
    pub json_logs: bool,
}

impl ServeArgs {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            standalone_timer: self.standalone_timer,
            timer_interval_minutes: self.timer_interval_minutes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunSource {
    Http,
    Storage,
    Timer,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(long, value_enum, default_value = "http")]
    pub source: RunSource,

    #[arg(long, required_if_eq("source", "storage"), help = "Local file standing in for the uploaded blob")]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = CliConfig::try_parse_from([
            "unify-functions",
            "serve",
            "--port",
            "7071",
            "--standalone-timer",
        ])
        .unwrap();

        match cli.command {
            Command::Serve(args) => {
                let config = args.server_config();
                assert_eq!(config.port, 7071);
                assert!(config.standalone_timer);
                assert_eq!(config.timer_interval_minutes, 30);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_storage_run_requires_file() {
        assert!(CliConfig::try_parse_from(["unify-functions", "run", "--source", "storage"]).is_err());

        let cli = CliConfig::try_parse_from([
            "unify-functions",
            "--verbose",
            "run",
            "--source",
            "storage",
            "--file",
            "upload.csv",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Run(RunArgs { source: RunSource::Storage, .. })));
    }
}
