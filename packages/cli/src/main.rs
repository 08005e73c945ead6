#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the police call dashboard.
//!
//! `serve` starts the API server, `report` prints the dashboard (or one
//! view) as JSON, and `info` summarizes the call database. Without a
//! subcommand the user picks a tool interactively.

mod report;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use police_calls_analytics_models::ViewName;

use crate::report::ReportArgs;

#[derive(Parser)]
#[command(name = "police_calls_cli", about = "Police call dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard API server
    Serve,
    /// Print the dashboard as JSON
    Report {
        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Last day of the window (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: String,
        /// Comma-separated priorities to include (e.g. "1,2")
        #[arg(long)]
        priorities: Option<String>,
        /// Reference time for recency (YYYY-MM-DDTHH:MM:SS)
        #[arg(long)]
        as_of: Option<String>,
        /// Only print this view (e.g. `incident_chains`)
        #[arg(long)]
        view: Option<ViewName>,
    },
    /// Show record count and date range of the call database
    Info,
}

/// Top-level tool selection.
enum Tool {
    Server,
    Report,
    Info,
}

impl Tool {
    const ALL: &[Self] = &[Self::Server, Self::Report, Self::Info];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Server => "Start server",
            Self::Report => "Print dashboard report",
            Self::Info => "Show database info",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive().await;
    };

    match command {
        Commands::Serve => serve(false).await?,
        Commands::Report {
            start,
            end,
            priorities,
            as_of,
            view,
        } => {
            let args = ReportArgs {
                start,
                end,
                priorities,
                as_of,
            };
            report::run(&args, view).await?;
        }
        Commands::Info => report::info().await?,
    }

    Ok(())
}

async fn interactive() -> Result<(), Box<dyn std::error::Error>> {
    println!("Police Call Dashboard");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Server => serve(true).await?,
        Tool::Report => {
            let start: String = Input::new()
                .with_prompt("Start date (YYYY-MM-DD)")
                .interact_text()?;
            let end: String = Input::new()
                .with_prompt("End date (YYYY-MM-DD)")
                .interact_text()?;
            let priorities: String = Input::new()
                .with_prompt("Priorities (comma-separated, blank for all)")
                .allow_empty(true)
                .interact_text()?;

            let mut views: Vec<String> = vec!["All views".to_string()];
            views.extend(ViewName::all().iter().map(|v| v.title().to_string()));
            let view_idx = Select::new()
                .with_prompt("Which view?")
                .items(&views)
                .default(0)
                .interact()?;
            let view = view_idx
                .checked_sub(1)
                .and_then(|i| ViewName::all().get(i).copied());

            let args = ReportArgs {
                start,
                end,
                priorities: Some(priorities),
                as_of: None,
            };
            report::run(&args, view).await?;
        }
        Tool::Info => report::info().await?,
    }

    Ok(())
}

async fn serve(prompt: bool) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so run it in a blocking task
    // to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(async move {
            if prompt {
                police_calls_server::interactive::run().await
            } else {
                police_calls_server::run_server().await
            }
        })
    })
    .await??;

    Ok(())
}
