//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dropzone_config::{ClientConfig, ConfigLoader, ConfigPatch};
use dropzone_telemetry::{LogFormat, LoggingConfig, command_span, init_logging, with_command_context};
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{AppContext, CliError, CliResult};
use crate::commands::{access, bookmarks, catalog, session};
use crate::opener::LaunchMode;

/// Parses CLI arguments, executes the requested command, and prints its
/// output. Returns the process exit code.
pub async fn run() -> i32 {
    execute(Cli::parse()).await
}

pub(crate) async fn execute(cli: Cli) -> i32 {
    let command_name = cli.command.label();
    let request_id = Uuid::new_v4().to_string();
    let span = command_span(command_name, &request_id);

    let result = with_command_context(
        request_id.clone(),
        command_name,
        dispatch(cli, request_id).instrument(span),
    )
    .await;

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            0
        }
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, request_id: String) -> CliResult<String> {
    let config = load_config(&cli)?;
    install_logging(&config);
    let ctx = AppContext::new(&config, &request_id, cli.output, cli.command.launch_mode())?;
    tracing::debug!(command = cli.command.label(), "dispatching command");
    run_command(&ctx, cli.command).await
}

pub(crate) async fn run_command(ctx: &AppContext, command: Command) -> CliResult<String> {
    match command {
        Command::Dashboard => catalog::handle_dashboard(ctx).await,
        Command::Bookmarks => catalog::handle_bookmarks(ctx).await,
        Command::Show(args) => catalog::handle_show(ctx, args).await,
        Command::Bookmark(args) => bookmarks::handle_bookmark(ctx, args).await,
        Command::Download(args) => access::handle_download(ctx, args).await,
        Command::Open(args) => access::handle_open(ctx, args).await,
        Command::Whoami => session::handle_whoami(ctx),
        Command::Health => session::handle_health(ctx).await,
    }
}

fn load_config(cli: &Cli) -> CliResult<ClientConfig> {
    let mut loader = ConfigLoader::new().overrides(cli.overrides());
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    loader
        .load()
        .map_err(|err| CliError::validation(err.describe()))
}

fn install_logging(config: &ClientConfig) {
    let logging = LoggingConfig {
        level: &config.log_level,
        format: LogFormat::from_config(config.log_format.as_deref()),
        build_sha: option_env!("DROPZONE_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }
}

#[derive(Parser)]
#[command(
    name = "dropzone",
    about = "Browse, bookmark, and download DropZone drops"
)]
pub(crate) struct Cli {
    #[arg(long, global = true, help = "API origin (overrides DROPZONE_API_URL)")]
    pub(crate) api_url: Option<String>,
    #[arg(long, global = true, help = "Bearer token (overrides DROPZONE_TOKEN)")]
    pub(crate) token: Option<String>,
    #[arg(long, global = true, help = "Request timeout in seconds")]
    pub(crate) timeout: Option<u64>,
    #[arg(long, global = true, help = "JSON configuration file")]
    pub(crate) config: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        env = "DROPZONE_OUTPUT",
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

impl Cli {
    fn overrides(&self) -> ConfigPatch {
        let download_dir = match &self.command {
            Command::Download(args) => args.dir.clone(),
            _ => None,
        };
        ConfigPatch {
            api_url: self.api_url.clone(),
            access_token: self.token.clone(),
            timeout_secs: self.timeout,
            download_dir,
            ..ConfigPatch::default()
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Released drops, a preview of your bookmarks, and upcoming drops.
    Dashboard,
    /// Every bookmarked drop.
    Bookmarks,
    /// One drop in detail.
    Show(DropArgs),
    /// Toggle the bookmark on a drop.
    Bookmark(DropArgs),
    /// Download a drop's file.
    Download(DownloadArgs),
    /// Open a repository drop's link.
    Open(OpenArgs),
    /// Display name carried by the access token.
    Whoami,
    /// Probe the API health endpoint.
    Health,
}

impl Command {
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Bookmarks => "bookmarks",
            Self::Show(_) => "show",
            Self::Bookmark(_) => "bookmark",
            Self::Download(_) => "download",
            Self::Open(_) => "open",
            Self::Whoami => "whoami",
            Self::Health => "health",
        }
    }

    const fn launch_mode(&self) -> LaunchMode {
        match self {
            Self::Open(args) if !args.print => LaunchMode::Browser,
            _ => LaunchMode::Print,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub(crate) struct DropArgs {
    /// Drop identifier.
    pub(crate) id: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub(crate) struct DownloadArgs {
    /// Drop identifier.
    pub(crate) id: String,
    /// Directory to save into (overrides DROPZONE_DOWNLOAD_DIR).
    #[arg(long)]
    pub(crate) dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenArgs {
    /// Drop identifier.
    pub(crate) id: String,
    /// Print the link instead of launching a browser.
    #[arg(long)]
    pub(crate) print: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}
