use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use squeezelite::{PlayerConfig, Result, Squeezelite};

/// Launch and control a squeezelite player against a Logitech Media
/// Server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the squeezelite binary
    #[arg(long, value_name = "PATH", default_value = squeezelite::config::DEFAULT_BINARY)]
    binary: PathBuf,

    /// Player name announced to the server
    #[arg(short, long, default_value = squeezelite::config::DEFAULT_NAME)]
    name: String,

    /// Player MAC address
    #[arg(short, long, default_value = squeezelite::config::DEFAULT_MAC)]
    mac: String,

    /// Server address; omit to locate the server via discovery
    #[arg(short, long)]
    server: Option<String>,

    /// Server web port, used to filter discovery responses
    #[arg(long, default_value_t = squeezelite::config::DEFAULT_SERVER_PORT)]
    server_port: u16,

    /// Server control (CLI) port
    #[arg(long, default_value_t = squeezelite::config::DEFAULT_CONTROL_PORT)]
    control_port: u16,

    /// Discovery listen window in seconds
    #[arg(long, default_value_t = 2)]
    discovery_timeout: u64,

    /// Extra argument passed to squeezelite verbatim (repeatable)
    #[arg(long = "arg", value_name = "ARG")]
    extra_args: Vec<String>,

    /// Verbose protocol logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the player (connects to the server first)
    Start,
    /// Terminate all running instances of the player binary
    Kill,
    /// Show what the player is currently playing
    Status,
    /// Toggle play/pause
    PlayPause,
    /// Stop playback
    Stop,
    /// Skip to the next track
    Next,
    /// Skip to the previous track
    Prev,
    /// Query a single now-playing attribute by name
    Info {
        /// Attribute name, e.g. "title" or "artist"
        attribute: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut builder = PlayerConfig::builder()
        .binary(cli.binary)
        .name(cli.name)
        .mac(cli.mac)
        .server_port(cli.server_port)
        .control_port(cli.control_port)
        .discovery_timeout(Duration::from_secs(cli.discovery_timeout))
        .extra_args(cli.extra_args);
    if let Some(server) = cli.server {
        builder = builder.server(server);
    }
    let config = builder.build()?;

    let mut player = Squeezelite::new(config);

    match cli.command {
        Commands::Start => {
            player.start()?;
            println!("player started against {}", player.server().unwrap_or("?"));
        }
        Commands::Kill => {
            let killed = player.kill()?;
            println!("killed {} process(es)", killed);
        }
        Commands::Status => {
            player.connect()?;
            let now_playing = player.now_playing()?;
            print_field("title", now_playing.title.as_deref());
            print_field("artist", now_playing.artist.as_deref());
            print_field("album", now_playing.album.as_deref());
            print_seconds("duration", now_playing.duration);
            print_seconds("elapsed", now_playing.elapsed);
        }
        Commands::PlayPause => {
            player.connect()?;
            player.play_pause()?;
        }
        Commands::Stop => {
            player.connect()?;
            player.stop()?;
        }
        Commands::Next => {
            player.connect()?;
            player.next_track()?;
        }
        Commands::Prev => {
            player.connect()?;
            player.prev_track()?;
        }
        Commands::Info { attribute } => {
            player.connect()?;
            match player.player_info(&attribute)? {
                Some(value) => println!("{}", value),
                None => println!("unavailable"),
            }
        }
    }

    Ok(())
}

fn print_field(label: &str, value: Option<&str>) {
    println!("{:>8}: {}", label, value.unwrap_or("-"));
}

fn print_seconds(label: &str, value: Option<f64>) {
    match value {
        Some(seconds) => println!("{:>8}: {:.0}s", label, seconds),
        None => println!("{:>8}: -", label),
    }
}
