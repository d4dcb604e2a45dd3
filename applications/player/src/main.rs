/// Vibe Player - command-line music player
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vibe_library::LibraryStore;
use vibe_player::{commands, AdminSession, PlayerConfig};

#[derive(Parser)]
#[command(name = "vibe-player")]
#[command(about = "Vibe Player: library, equalizer and visualizer in the terminal", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Admin username
    #[arg(long, global = true, env = "VIBE_ADMIN_USER")]
    admin_user: Option<String>,

    /// Admin password
    #[arg(long, global = true, env = "VIBE_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the track library
    Library {
        #[command(subcommand)]
        command: LibraryCommands,
    },
    /// Analyze the library and print its vibe report
    Vibe,
    /// Show the equalizer presets
    Presets,
    /// Play through the library with EQ and visualizer
    Play {
        /// Track id to start with (defaults to the first track)
        #[arg(short, long)]
        track: Option<String>,
        /// Equalizer preset
        #[arg(short, long)]
        preset: Option<String>,
    },
}

#[derive(Subcommand)]
enum LibraryCommands {
    /// Print the library
    List,
    /// Print the library on every change
    Watch,
    /// Upload a local audio file (admin)
    Add {
        /// Audio file
        path: PathBuf,
        /// Title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
        /// Artist (defaults to "Local Artist")
        #[arg(long)]
        artist: Option<String>,
    },
    /// Delete a track (admin)
    Remove {
        /// Track id
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vibe_player=info,vibe_library=info,vibe_audio=info,vibe_playback=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = PlayerConfig::load(cli.config.as_deref())?;

    if let Commands::Presets = cli.command {
        return commands::insight::presets();
    }

    let session = AdminSession::login(
        &config.admin,
        cli.admin_user.as_deref(),
        cli.admin_password.as_deref(),
    );
    let store = LibraryStore::connect(config.local_config(), config.remote_config());
    tracing::info!(mode = %store.mode(), "Library store ready");

    match cli.command {
        Commands::Library { command } => match command {
            LibraryCommands::List => commands::library::list(&store).await?,
            LibraryCommands::Watch => commands::library::watch(&store).await?,
            LibraryCommands::Add {
                path,
                title,
                artist,
            } => commands::library::add(&store, session, &path, title, artist).await?,
            LibraryCommands::Remove { id } => {
                commands::library::remove(&store, session, &id).await?;
            }
        },
        Commands::Vibe => commands::insight::vibe(&config, &store).await?,
        Commands::Presets => {}
        Commands::Play { track, preset } => {
            commands::play::play(&config, &store, track, preset).await?;
        }
    }

    Ok(())
}
