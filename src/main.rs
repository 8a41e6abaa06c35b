use anyhow::{bail, Context};
use clap::Parser;
use rl_portfolio::cli::{self, Cli, Commands};
use rl_portfolio::rl::data::RandomWalk;
use rl_portfolio::rl::training::CancellationToken;
use rl_portfolio::PortfolioError;
use tracing::{info, warn};

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple, spawn_ctrl_c_handler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Generate {
        length,
        series,
        output,
    } = &cli.command
    {
        init_logging_simple();
        let walk = RandomWalk {
            seed: cli.seed.unwrap_or(RandomWalk::default().seed),
            ..RandomWalk::default()
        };
        cli::run_generate(&walk, *length, *series, output)?;
        println!("Wrote {} x {} prices to {}", series, length, output.display());
        return Ok(());
    }

    let config = cli.load_config().context("failed to load configuration")?;
    let _guard = init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            warn!("Invalid configuration: {}", e);
        }
        bail!("configuration has {} error(s)", errors.len());
    }

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    match cli.command {
        Commands::Train { data, output } => {
            let data = data.unwrap_or_else(|| config.data.train_csv.clone());
            let output = output.unwrap_or_else(|| config.data.output_dir.clone());

            let outcome = match tokio::task::spawn_blocking(move || {
                cli::run_train(&config, &data, &output, cancel)
            })
            .await
            .context("training task panicked")?
            {
                Ok(outcome) => outcome,
                Err(PortfolioError::Cancelled) => {
                    warn!("Training cancelled before any series was trained; nothing exported");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            if outcome.cancelled {
                warn!("Training cancelled; exported the partially trained table");
            }
            info!(
                series = outcome.trained.len(),
                episodes_per_series = outcome.episodes_per_series,
                "Training finished"
            );
            if let Some(report) = &outcome.evaluation {
                println!("Test Results:");
                println!("  Initial value: {:.2}", report.initial_value);
                println!("  Final value: {:.2}", report.final_value);
                println!("  Return: {:.2}%", report.return_pct);
                println!("  Final cash: {:.2}", report.final_cash);
                println!("  Final shares: {:.2}", report.final_shares);
            }
        }
        Commands::Eval {
            q_matrix,
            data,
            column,
            output,
        } => {
            let q_matrix = q_matrix.unwrap_or_else(|| config.data.q_matrix_path());
            let data = data.unwrap_or_else(|| config.data.test_csv.clone());
            let output = output.unwrap_or_else(|| config.data.series_path());
            let column = column.or_else(|| config.data.price_column.clone());

            let report = tokio::task::spawn_blocking(move || {
                cli::run_eval(&config, &q_matrix, &data, column.as_deref(), &output)
            })
            .await
            .context("evaluation task panicked")??;

            println!("Test Results:");
            println!("  Initial value: {:.2}", report.initial_value);
            println!("  Final value: {:.2}", report.final_value);
            println!("  Return: {:.2}%", report.return_pct);
            println!("  Trades: {}", report.num_trades());
        }
        Commands::Generate { .. } => {}
    }

    Ok(())
}
