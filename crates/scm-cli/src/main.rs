use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "scm")]
#[command(about = "Slack channel membership reconciler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a channel against a desired roster and print the report
    Reconcile {
        /// Channel id (e.g. C0123456)
        #[arg(long)]
        channel: String,

        /// Comma-separated desired emails
        #[arg(long, conflicts_with = "emails_file", required_unless_present = "emails_file")]
        emails: Option<String>,

        /// File holding comma-separated desired emails
        #[arg(long)]
        emails_file: Option<String>,

        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Also deliver the report as an ephemeral message to this user
        #[arg(long)]
        notify_user: Option<String>,

        /// Print the whole run as JSON instead of the text report
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Parse a comma-separated roster and print one email per line
    ParseRoster {
        roster: String,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience).
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Reconcile {
            channel,
            emails,
            emails_file,
            config_paths,
            notify_user,
            json,
        } => {
            let roster = commands::load_roster(emails, emails_file)?;
            commands::reconcile::run(commands::reconcile::ReconcileArgs {
                channel,
                roster,
                config_paths,
                notify_user,
                json,
            })
            .await?;
        }

        Commands::ParseRoster { roster } => {
            for email in scm_roster::DesiredRoster::parse(&roster).emails {
                println!("{email}");
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = scm_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
