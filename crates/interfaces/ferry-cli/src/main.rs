use clap::{Parser, Subcommand};
use ferry_cli::{commands, split_sources_and_destination};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the account session used by every other command
    Init {
        #[arg(long)]
        api_url: String,
        #[arg(long)]
        token: String,
    },
    /// Upload files or directories; the last argument is the remote folder
    Upload {
        #[arg(required = true, num_args = 1..)]
        args: Vec<String>,
        #[arg(short, long, help = "Upload even when identical content already exists")]
        force: bool,
        #[arg(long, help = "Replace a remote file occupying the target path")]
        overwrite: bool,
    },
    /// Report how local files relate to the remote mirror; the last
    /// argument is the remote folder
    Exists {
        #[arg(required = true, num_args = 1..)]
        args: Vec<String>,
    },
    /// Inspect or adjust persisted settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    Show,
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("default subscriber");

    match cli.command {
        Commands::Init { api_url, token } => commands::cmd_init(api_url, token)?,
        Commands::Upload {
            args,
            force,
            overwrite,
        } => {
            let (sources, dest) = split_sources_and_destination(args)?;
            commands::cmd_upload(sources, dest, force, overwrite).await?;
        }
        Commands::Exists { args } => {
            let (sources, dest) = split_sources_and_destination(args)?;
            commands::cmd_exists(sources, dest).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::cmd_config_show()?,
            ConfigCommands::Set { key, value } => commands::cmd_config_set(&key, &value)?,
        },
    }

    Ok(())
}
