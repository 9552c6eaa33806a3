mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use scicloud_core::date_range::parse_date;
use scicloud_core::{CalendarView, Category, EventFilter, TimeOfDay};
use tracing_subscriber::EnvFilter;

use crate::app::App;

#[derive(Parser)]
#[command(name = "scicloud")]
#[command(about = "Manage laboratory calendar events")]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// First date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,

    #[arg(short, long)]
    category: Option<Category>,

    #[arg(long)]
    limit: Option<usize>,

    #[arg(long)]
    offset: Option<usize>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> EventFilter {
        EventFilter {
            start_date: self.from,
            end_date: self.to,
            category: self.category,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Editable event fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
struct EventFields {
    #[arg(short, long)]
    description: Option<String>,

    /// Start time (HH:MM)
    #[arg(short, long)]
    start: Option<TimeOfDay>,

    /// End time (HH:MM), defaults to one hour after start
    #[arg(short, long)]
    end: Option<TimeOfDay>,

    #[arg(short, long)]
    category: Option<Category>,

    #[arg(short, long)]
    location: Option<String>,

    /// Hex color overriding the category color
    #[arg(long)]
    color: Option<String>,

    /// Repeat for several attendees
    #[arg(short, long = "attendee")]
    attendees: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List events, ordered by date and start time
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Search titles and descriptions
    Search {
        query: String,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show one event
    Show { id: String },
    /// Create an event
    Add {
        title: String,

        /// Event date (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long)]
        all_day: bool,

        #[command(flatten)]
        fields: EventFields,
    },
    /// Change fields of an event
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Make the event all-day (true) or timed (false)
        #[arg(long)]
        all_day: Option<bool>,

        #[command(flatten)]
        fields: EventFields,
    },
    /// Reschedule an event, keeping its duration
    Move {
        id: String,

        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// New start time (HH:MM)
        #[arg(long)]
        start: TimeOfDay,
    },
    /// Delete an event
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the current day or week, grouped by date
    Agenda {
        #[arg(long)]
        view: Option<CalendarView>,

        /// Anchor date (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Show the next few events from today on
    Upcoming,
    /// Export events as iCalendar
    Export {
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,

        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Inspect or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the config and data paths
    Path,
    /// Print the effective configuration
    Show,
    /// Set the identity used by the CLI
    SetOwner { owner: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::List { filter } => {
            let app = App::load()?;
            commands::list::run(&app, filter.to_filter(), filter.json).await
        }
        Commands::Search { query, filter } => {
            let app = App::load()?;
            commands::list::search(&app, &query, filter.to_filter(), filter.json).await
        }
        Commands::Show { id } => {
            let app = App::load()?;
            commands::show::run(&app, &id).await
        }
        Commands::Add {
            title,
            date,
            all_day,
            fields,
        } => {
            let app = App::load()?;
            commands::add::run(&app, title, date, all_day, fields).await
        }
        Commands::Edit {
            id,
            title,
            date,
            all_day,
            fields,
        } => {
            let app = App::load()?;
            commands::edit::run(&app, &id, title, date, all_day, fields).await
        }
        Commands::Move { id, date, start } => {
            let app = App::load()?;
            commands::move_event::run(&app, &id, date, start).await
        }
        Commands::Delete { id, yes } => {
            let app = App::load()?;
            commands::delete::run(&app, &id, yes).await
        }
        Commands::Agenda { view, date } => {
            let app = App::load()?;
            let view = view.unwrap_or(app.config.default_view);
            commands::agenda::run(&app, view, date).await
        }
        Commands::Upcoming => {
            let app = App::load()?;
            commands::agenda::upcoming(&app).await
        }
        Commands::Export { from, to, output } => {
            let app = App::load()?;
            commands::export::run(&app, from, to, output.as_deref()).await
        }
        Commands::Config { command } => match command.unwrap_or(ConfigCommand::Path) {
            ConfigCommand::Path => commands::config::path(),
            ConfigCommand::Show => commands::config::show(),
            ConfigCommand::SetOwner { owner } => commands::config::set_owner(&owner),
        },
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    Ok(())
}
