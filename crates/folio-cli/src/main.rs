mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Permission directory and inspection tool for the Folio document archive")]
#[command(version)]
struct Cli {
    /// Path to the Folio config directory (default: ~/.folio)
    #[arg(long, global = true, env = "FOLIO_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config file and directory database, and seed defaults
    Init,

    /// Show current configuration
    Config,

    /// List permission codes
    Codes {
        /// Only list codes of this resource kind
        #[arg(long)]
        kind: Option<String>,
    },

    /// Decode a permission code into its action and resource kind
    Decode {
        code: String,
    },

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Manage groups
    #[command(subcommand)]
    Group(GroupCommand),

    /// Check whether a user may perform an action
    Check {
        username: String,
        /// add, view, change or delete
        action: String,
        /// Resource kind, e.g. document or saved_view
        kind: String,
        /// JSON file with an object to check object-level rights against
        #[arg(long)]
        object: Option<PathBuf>,
    },

    /// Verify a user's password and print their session
    Login {
        username: String,
        /// Password (or set FOLIO_PASSWORD). Prompted if absent.
        #[arg(long, env = "FOLIO_PASSWORD")]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user
    Add {
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        superuser: bool,
        /// Password (or set FOLIO_PASSWORD). Prompted if absent.
        #[arg(long, env = "FOLIO_PASSWORD")]
        password: Option<String>,
    },
    /// List users
    List,
    /// Add a user to a group
    Join { username: String, group: String },
    /// Remove a user from a group
    Leave { username: String, group: String },
    /// Grant a permission code directly to a user
    Grant { username: String, code: String },
    /// Revoke a directly granted permission code
    Revoke { username: String, code: String },
    /// Disable a user's logins
    Deactivate { username: String },
    /// Remove a user with their memberships and direct grants
    Delete { username: String },
}

#[derive(Subcommand)]
pub enum GroupCommand {
    /// Create a group
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List groups and their permission codes
    List,
    /// Grant a permission code to a group
    Grant { group: String, code: String },
    /// Revoke a permission code from a group
    Revoke { group: String, code: String },
    /// Delete a (non-system) group
    Delete { name: String },
}

/// Get a password from the CLI arg, env var, or interactive prompt.
pub fn get_password(cli_password: &Option<String>) -> anyhow::Result<String> {
    if let Some(p) = cli_password {
        return Ok(p.clone());
    }
    use std::io::{self, Write};
    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base_dir = match cli.config_dir {
        Some(ref dir) => dir.clone(),
        None => folio_core::config::FolioConfig::default_base_dir()?,
    };

    // RUST_LOG wins over the config file's log_filter.
    let (filter, filter_warning) = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => commands::config_filter(&commands::log_directive(&base_dir)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Some(warning) = filter_warning {
        tracing::warn!("{warning}");
    }

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Init => rt.block_on(commands::init::run(&base_dir)),
        Commands::Config => commands::config::run(&base_dir),
        Commands::Codes { ref kind } => commands::codes::list(&base_dir, kind.as_deref()),
        Commands::Decode { ref code } => commands::codes::decode(&base_dir, code),
        Commands::User(cmd) => rt.block_on(commands::user::run(&base_dir, cmd)),
        Commands::Group(cmd) => rt.block_on(commands::group::run(&base_dir, cmd)),
        Commands::Check {
            ref username,
            ref action,
            ref kind,
            ref object,
        } => rt.block_on(commands::check::run(
            &base_dir,
            username,
            action,
            kind,
            object.as_deref(),
        )),
        Commands::Login {
            ref username,
            ref password,
        } => rt.block_on(commands::login::run(&base_dir, username, password)),
    }
}
