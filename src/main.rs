mod api;
mod cli;
mod config;
mod error;
mod indicators;
mod models;
mod pipeline;
mod report;

use clap::Parser;
use cli::{prompts, App, CitiesArgs, Cli, Commands, SensorsArgs};
use colored::*;
use config::Config;
use dialoguer::{theme::ColorfulTheme, Select};
use error::{AppError, Result};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_NAME: &str = "openaq-city-brief.log";

/// Stderr logging (`RUST_LOG`, default `warn`) plus, when `AQ_LOG_DIR` is set,
/// a daily-rotated JSON file. The returned guard must live until exit.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    let (json_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(writer)
                .with_filter(EnvFilter::new("openaq_city_brief=debug,info"));
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}

fn prompt_cities_args() -> Result<CitiesArgs> {
    let country = prompts::prompt_country()?
        .ok_or_else(|| AppError::Cli("A country code is needed to list cities.".to_string()))?;
    let pollutant = prompts::prompt_pollutant()?;
    Ok(CitiesArgs { country, pollutant })
}

fn prompt_sensors_args() -> Result<SensorsArgs> {
    let country = prompts::prompt_country()?;
    let pollutant = prompts::prompt_pollutant()?;
    let city = prompts::prompt_city(&[])?;
    Ok(SensorsArgs {
        city,
        country,
        pollutant,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("{} {}", "Error:".red(), e);
            return Err(e);
        },
    };
    let _log_guard = init_tracing(&config);
    config.log_config();

    let cli = Cli::parse();
    let app = App::new(config)?;

    if let Some(command) = cli.command {
        if let Err(e) = app.run_command(command).await {
            error!("Command execution failed: {:?}", e);
            println!("{} {}", "Error:".red(), e.to_string().red());
            return Err(e);
        }
        return Ok(());
    }

    info!("No subcommand given, starting interactive menu");
    println!("{}", "Welcome to OpenAQ City Brief!".cyan().bold());

    // Main interactive loop
    loop {
        let options = &[
            "Generate a city report",
            "List cities reporting a pollutant",
            "List sensors in a city",
            "Exit",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(options)
            .default(0)
            .interact_opt()?
            .unwrap_or(options.len() - 1);

        println!("\n---\n");

        let command_result = match selection {
            0 => app.interactive_report().await,
            1 => match prompt_cities_args() {
                Ok(args) => app.run_command(Commands::Cities(args)).await,
                Err(e) => {
                    println!("{} {}", "Failed to get input:".red(), e);
                    continue;
                },
            },
            2 => match prompt_sensors_args() {
                Ok(args) => app.run_command(Commands::Sensors(args)).await,
                Err(e) => {
                    println!("{} {}", "Failed to get input:".red(), e);
                    continue;
                },
            },
            _ => {
                println!("{}", "Exiting. Goodbye!".green());
                break;
            },
        };

        if let Err(e) = command_result {
            error!("Command execution failed: {:?}", e);
            println!("{} {}", "Error:".red(), e.to_string().red());
        }

        println!("\n---\n");
    }

    Ok(())
}
