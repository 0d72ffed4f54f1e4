//! VPAID CLI - Headless host harness for the creative controller
//!
//! Features:
//! - AdParameters resolution
//! - Scripted host lifecycles against a headless creative
//! - Creative-initiated event firing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod script;

use commands::{InitOptions, SignalArgs};
use output::OutputFormat;

/// VPAID CLI - Ad creative toolkit
#[derive(Parser)]
#[command(name = "vpaid-cli")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Headless VPAID creative host", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments the host passes to `initAd`
#[derive(clap::Args)]
struct InitArgs {
    /// Path to the AdParameters JSON
    params: PathBuf,

    /// Creative configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Slot width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Slot height in pixels
    #[arg(long, default_value = "360")]
    height: u32,

    /// View mode (normal, thumbnail, fullscreen)
    #[arg(long, default_value = "normal")]
    view_mode: String,

    /// Desired bitrate in kbps
    #[arg(long, default_value = "256")]
    bitrate: u32,

    /// Allow the video slot to autoplay
    #[arg(long)]
    autoplay: bool,
}

impl From<InitArgs> for InitOptions {
    fn from(args: InitArgs) -> Self {
        Self {
            params: args.params,
            config: args.config,
            width: args.width,
            height: args.height,
            view_mode: args.view_mode,
            bitrate: args.bitrate,
            autoplay: args.autoplay,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the media file named by AdParameters
    Resolve {
        /// Path to the AdParameters JSON
        params: PathBuf,
    },

    /// Initialize a creative and replay a host script
    Run {
        #[command(flatten)]
        init: InitArgs,

        /// Comma-separated host ops (start, stop, pause, resume, volume=N,
        /// resize=WxH[:mode], expand, collapse, skip, loaded)
        #[arg(short, long, default_value = "")]
        script: String,
    },

    /// Initialize a creative and fire a creative-initiated event
    Trigger {
        #[command(flatten)]
        init: InitArgs,

        /// Event name, e.g. AdClickThru or AdLog
        event: String,

        /// Click-through URL
        #[arg(long, default_value = "")]
        url: String,

        /// Click-through or interaction id
        #[arg(long, default_value = "")]
        id: String,

        /// Whether the player opens the click-through itself
        #[arg(long)]
        player_handles: bool,

        /// Error or log message
        #[arg(short, long, default_value = "")]
        message: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    vpaid_core::init();
    let format = OutputFormat::from(cli.format.as_str());

    match cli.command {
        Commands::Resolve { params } => {
            commands::resolve(&params, format)?;
        }
        Commands::Run { init, script } => {
            commands::run(&init.into(), &script, format)?;
        }
        Commands::Trigger {
            init,
            event,
            url,
            id,
            player_handles,
            message,
        } => {
            let args = SignalArgs {
                url,
                id,
                player_handles,
                message,
            };
            commands::trigger(&init.into(), &event, args, format)?;
        }
    }

    Ok(())
}
