//! sqleval - execution-accuracy evaluation for text-to-SQL benchmarks.

use sql_exec_eval::benchmark::{self, BenchmarkRunner};
use sql_exec_eval::cli::Cli;
use sql_exec_eval::config::Config;
use sql_exec_eval::db::SqliteConnector;
use sql_exec_eval::error::Result;
use sql_exec_eval::eval::Evaluator;
use sql_exec_eval::logging;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => {
            if let Err(e) = logging::init_file_logging(path) {
                eprintln!("Warning: {e}. Logging to stderr instead.");
                logging::init_stderr_logging();
            }
        }
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Precedence: CLI flags, then config file, then built-in defaults
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?.apply_overrides(&cli.overrides())?;

    let items = benchmark::load_dev_set(&cli.dev_file)?;
    let predictions = benchmark::load_predictions(&cli.results)?;

    let connector = Arc::new(SqliteConnector::new(&config.database));
    let evaluator = Evaluator::from_config(connector, &config.evaluation);
    let runner = BenchmarkRunner::new(evaluator, &cli.db_dir);

    let report = runner.run(&items, &predictions).await;

    println!("{}", report.summary);
    report.save(&cli.output)?;

    Ok(())
}
