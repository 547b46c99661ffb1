use clap::Parser;
use unify_functions::app::scheduler::spawn_timer;
use unify_functions::app::server::{self, AppState};
use unify_functions::app::triggers::{http_trigger, storage_trigger, timer_trigger};
use unify_functions::config::cli::{Command, RunArgs, RunSource};
use unify_functions::domain::model::TriggerFile;
use unify_functions::utils::{logger, validation::Validate};
use unify_functions::{CliConfig, StoreConfig, Unifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    match cli.command {
        Command::Serve(args) => {
            // Functions host 會收集 stdout，JSON 格式較便於查詢
            if args.json_logs {
                logger::init_handler_logger(cli.verbose);
            } else {
                logger::init_cli_logger(cli.verbose);
            }

            let config = args.server_config();
            tracing::debug!("Server config: {:?}", config);
            if let Err(e) = config.validate() {
                tracing::error!("❌ Configuration validation failed: {}", e);
                eprintln!("❌ {}", e);
                std::process::exit(1);
            }

            let state = AppState::from_env();
            if config.standalone_timer {
                spawn_timer(state.unifiers(), config.timer_interval());
            }

            server::serve(&config, state).await?;
        }
        Command::Run(args) => {
            logger::init_cli_logger(cli.verbose);
            let output = run_once(&args).await?;
            println!("{}", output);
        }
    }

    Ok(())
}

async fn run_once(args: &RunArgs) -> anyhow::Result<String> {
    let store_config = StoreConfig::from_env();
    tracing::debug!("Store config: {:?}", store_config);
    let unifier = Unifier::from_config(&store_config);

    let output = match args.source {
        RunSource::Http => serde_json::to_string_pretty(&http_trigger(&unifier).await)?,
        RunSource::Storage => {
            let path = args
                .file
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--file is required for the storage source"))?;
            let metadata = tokio::fs::metadata(path).await?;
            let file = TriggerFile {
                name: path.display().to_string(),
                content_length: usize::try_from(metadata.len())?,
            };
            serde_json::to_string_pretty(&storage_trigger(&unifier, file).await)?
        }
        RunSource::Timer => serde_json::to_string_pretty(&timer_trigger(&unifier).await)?,
    };

    Ok(output)
}
