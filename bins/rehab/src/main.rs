//! rehab - command-line client for the rehab directory backend
//!
//! Browses centers and articles, manages the session and bookings, and
//! probes the backend, all through the cached data-access layer.

use clap::{Parser, Subcommand};
use rehab_telemetry::{LogFormat, TelemetryConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

use commands::{articles, bookings, centers, health, session, Connection};
use output::Format;

/// Command-line client for the rehab directory
#[derive(Parser)]
#[command(name = "rehab")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "REHAB_API_URL")]
    api_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose output, including a metrics summary on exit
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write log lines to stderr as JSON objects
    #[arg(long, global = true)]
    log_json: bool,

    /// File holding the session token (defaults to the user data directory)
    #[arg(long, global = true, env = "REHAB_SESSION_FILE")]
    session: Option<PathBuf>,

    /// Attempts per request when the backend cannot be reached
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the backend is reachable
    Health,

    /// Browse rehabilitation centers
    Centers {
        #[command(subcommand)]
        action: CentersAction,
    },

    /// Browse articles
    Articles {
        #[command(subcommand)]
        action: ArticlesAction,
    },

    /// Sign in and store the session token
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, env = "REHAB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and drop the local session
    Logout,

    /// Show the signed-in user's profile
    Profile,

    /// Manage your bookings
    Bookings {
        #[command(subcommand)]
        action: BookingsAction,
    },
}

#[derive(Subcommand)]
enum CentersAction {
    /// List centers
    List {
        /// Filter by city
        #[arg(long)]
        city: Option<String>,

        /// Filter by center type
        #[arg(long = "type")]
        center_type: Option<String>,

        /// Full-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Page number
        #[arg(long)]
        page: Option<u32>,

        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Show one center
    Show {
        /// Center ID
        id: String,
    },

    /// Show the reviews of a center
    Reviews {
        /// Center ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ArticlesAction {
    /// List articles
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Full-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Page number
        #[arg(long)]
        page: Option<u32>,

        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Show one article
    Show {
        /// Article ID
        id: String,
    },
}

#[derive(Subcommand)]
enum BookingsAction {
    /// List your bookings
    #[command(alias = "mine")]
    List,

    /// Show one booking
    Show {
        /// Booking ID
        id: String,
    },

    /// Book a stay at a center
    Create {
        /// Center ID
        center_id: String,

        /// Check-in date (YYYY-MM-DD)
        date: String,

        /// Notes for the center
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Cancel a booking
    Cancel {
        /// Booking ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut telemetry = if cli.verbose {
        TelemetryConfig::verbose()
    } else {
        TelemetryConfig::default()
    };
    if cli.log_json {
        telemetry.format = LogFormat::Json;
    }
    if let Err(e) = rehab_telemetry::init_with_config(telemetry) {
        output::Status::warning(&format!("Logging disabled: {e}"));
    }

    let format = cli.format;
    let verbose = cli.verbose;
    let result = run(cli).await;
    if verbose {
        tracing::debug!(metrics = %rehab_telemetry::metrics().export_json(), "Session metrics");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::report_error(&err, format);
            ExitCode::from(output::exit_code(&err))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let connection = Connection {
        api_url: cli.api_url,
        session: cli.session,
        retries: cli.retries,
        timeout: cli.timeout,
    };
    let ctx = connection.open(cli.format)?;

    match cli.command {
        Commands::Health => health::run(&ctx).await,

        Commands::Centers { action } => match action {
            CentersAction::List {
                city,
                center_type,
                search,
                page,
                limit,
            } => {
                let filters = rehab_api_client::prelude::CenterFilters {
                    city,
                    center_type,
                    search,
                    page,
                    limit,
                };
                centers::list(&ctx, &filters).await
            }
            CentersAction::Show { id } => centers::show(&ctx, &id).await,
            CentersAction::Reviews { id } => centers::reviews(&ctx, &id).await,
        },

        Commands::Articles { action } => match action {
            ArticlesAction::List {
                category,
                search,
                page,
                limit,
            } => {
                let filters = rehab_api_client::prelude::ArticleFilters {
                    category,
                    search,
                    page,
                    limit,
                };
                articles::list(&ctx, &filters).await
            }
            ArticlesAction::Show { id } => articles::show(&ctx, &id).await,
        },

        Commands::Login { email, password } => session::login(&ctx, &email, &password).await,
        Commands::Logout => session::logout(&ctx).await,
        Commands::Profile => session::profile(&ctx).await,

        Commands::Bookings { action } => match action {
            BookingsAction::List => bookings::list(&ctx).await,
            BookingsAction::Show { id } => bookings::show(&ctx, &id).await,
            BookingsAction::Create {
                center_id,
                date,
                notes,
            } => bookings::create(&ctx, &center_id, &date, notes).await,
            BookingsAction::Cancel { id } => bookings::cancel(&ctx, &id).await,
        },
    }
}
