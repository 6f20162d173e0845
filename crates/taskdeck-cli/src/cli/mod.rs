//! CLI entry and dispatch.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use taskdeck_core::config::{self, Config};
use taskdeck_core::tasks::TaskView;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(version)]
#[command(about = "Manage your tasks from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter (e.g. `debug`, `taskdeck_core=trace`); overrides the config
    #[arg(long, global = true, env = config::LOG_ENV, value_name = "FILTER")]
    log_level: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        names: String,

        #[arg(long)]
        lastnames: String,

        #[arg(long)]
        age: u32,

        #[arg(long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,

        /// Image file uploaded as the profile picture
        #[arg(long, value_name = "PATH")]
        profile_image: Option<PathBuf>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum TaskCommands {
    /// List tasks
    List {
        /// Only tasks whose title or description contains this text
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum, default_value_t = ViewArg::All)]
        view: ViewArg,
    },
    /// Show one task
    Show {
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Create a task
    Add {
        #[arg(value_name = "TITLE")]
        title: String,

        #[arg(long, default_value = "")]
        description: String,
    },
    /// Change a task's title, description or status
    Update {
        #[arg(value_name = "TASK_ID")]
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Mark as completed
        #[arg(long, conflicts_with = "undone")]
        done: bool,

        /// Mark as pending
        #[arg(long)]
        undone: bool,
    },
    /// Delete a task
    Rm {
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Show task counts per category
    Stats,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ViewArg {
    All,
    Today,
    Completed,
    Pending,
}

impl From<ViewArg> for TaskView {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::All => TaskView::All,
            ViewArg::Today => TaskView::Today,
            ViewArg::Completed => TaskView::Completed,
            ViewArg::Pending => TaskView::Pending,
        }
    }
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // config commands must work even when the config file is broken
    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        };
    }

    let config = Config::load().context("load config")?;
    let _log_guard = init_logging(cli.log_level.as_deref(), &config)?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli.command, &config).await })
}

/// Installs the stderr subscriber plus an optional file layer.
///
/// The returned guard flushes the file writer on drop.
fn init_logging(cli_filter: Option<&str>, config: &Config) -> Result<Option<WorkerGuard>> {
    let directive = cli_filter.unwrap_or(&config.log_level);
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("log_file has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    let client = commands::Client::open(config)?;

    let result = match command {
        Commands::Login { email, password } => {
            commands::auth::login(&client, &email, password).await
        }
        Commands::Register {
            names,
            lastnames,
            age,
            email,
            password,
            profile_image,
        } => {
            let form = commands::auth::RegisterForm {
                names,
                lastnames,
                age,
                email,
                password,
                profile_image,
            };
            commands::auth::register(&client, form).await
        }
        Commands::Logout => commands::auth::logout(&client).await,
        Commands::Whoami => commands::auth::whoami(&client, config).await,

        Commands::Tasks { command } => match command {
            TaskCommands::List { search, view } => {
                commands::tasks::list(&client, search.as_deref(), view.into()).await
            }
            TaskCommands::Show { id } => commands::tasks::show(&client, &id).await,
            TaskCommands::Add { title, description } => {
                commands::tasks::add(&client, &title, &description).await
            }
            TaskCommands::Update {
                id,
                title,
                description,
                done,
                undone,
            } => {
                let completed = match (done, undone) {
                    (true, _) => Some(true),
                    (false, true) => Some(false),
                    (false, false) => None,
                };
                commands::tasks::update(&client, &id, title, description, completed).await
            }
            TaskCommands::Rm { id } => commands::tasks::remove(&client, &id).await,
            TaskCommands::Stats => commands::tasks::stats(&client).await,
        },

        Commands::Config { .. } => Ok(()),
    };

    // persist whatever the server set, even when the command failed
    client.save()?;
    result
}
