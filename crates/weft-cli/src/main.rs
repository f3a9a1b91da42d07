use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use weft_bridge::{Messenger, memory_pair};
use weft_common::telemetry::{self, TelemetryConfig};
use weft_common::{Config, FileStore};
use weft_editor_webview::EditorSession;
use weft_host::{ContentSynchronizer, EditorRemote, SourceFileUpdateEvent, UpdateOutcome, host_interface};

mod script;

use script::Step;

#[derive(Parser)]
#[command(version, about = "weft - drive the embedded editor control from the command line", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a config file (.toml or .json)
    #[arg(long, env = "WEFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an editor over an in-memory bridge, apply steps, print the result
    Edit {
        /// Initial document. Reads stdin when neither this nor --file is given.
        #[arg(long, short)]
        text: Option<String>,

        /// Read the initial document from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Steps, applied in order: insert:TEXT, exec:NAME[:JSON], key:CHORD,
        /// cursor:LINE:COL, select:ANCHOR:HEAD, undo, redo, clear-history
        steps: Vec<Step>,

        /// Print editor events as they arrive
        #[arg(long)]
        events: bool,
    },
    /// Write an HTML file where the webview would load it and print the source
    Publish {
        /// HTML file to publish
        html: PathBuf,
    },
    /// Print the effective configuration as TOML
    Config {
        /// Also write it to the config path
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = load_config(&config_path).await?;
    telemetry::init(TelemetryConfig::from_env("weft-cli").with_settings(&config.telemetry));

    match cli.command {
        Commands::Edit {
            text,
            file,
            steps,
            events,
        } => {
            let initial = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => std::fs::read_to_string(file).into_diagnostic()?,
                (None, None) => std::io::read_to_string(std::io::stdin()).into_diagnostic()?,
            };
            let value = edit(&config, &initial, &steps, events).await?;
            print!("{value}");
        }
        Commands::Publish { html } => publish(&config, &html).await?,
        Commands::Config { write } => {
            println!("{}", toml::to_string_pretty(&config).into_diagnostic()?);
            if write {
                config.save(&FileStore::new(&config_path)).await?;
                eprintln!("Config written to {}", config_path.display());
            }
        }
    }

    Ok(())
}

/// Run the editor page and the host in-process, joined by an in-memory bridge.
async fn edit(config: &Config, initial: &str, steps: &[Step], print_events: bool) -> Result<String> {
    let (host_end, page_end) = memory_pair();

    let page = EditorSession::new(
        config.webview.instance_id.as_str(),
        initial,
        config.editor.clone(),
        page_end.port,
    );
    page.spawn_serve(page_end.inbound);

    let messenger = Messenger::new(config.webview.instance_id.as_str(), host_end.port);
    messenger.set_local_interface(host_interface(move |event| {
        if print_events {
            match serde_json::to_string(&event) {
                Ok(json) => eprintln!("{json}"),
                Err(e) => tracing::warn!(error = %e, "could not print event"),
            }
        }
    }));
    messenger.spawn_serve(host_end.inbound);
    let remote = EditorRemote::new(messenger);

    for step in steps {
        tracing::debug!(?step, "applying");
        step.run(&remote, &page).await?;
    }
    Ok(remote.get_value().await?)
}

async fn publish(config: &Config, html: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(html).into_diagnostic()?;
    let sync = ContentSynchronizer::with_file_update_callback(
        weft_host::FsStore,
        config.webview.instance_id.as_str(),
        &config.webview.base_directory,
        |event: &SourceFileUpdateEvent| {
            tracing::info!(path = %event.file_path.display(), "content file updated");
        },
    );
    match sync.update(&contents).await? {
        UpdateOutcome::Published(source) => {
            println!("{}", serde_json::to_string_pretty(&source).into_diagnostic()?);
        }
        UpdateOutcome::Cleared => println!("null"),
        UpdateOutcome::Superseded => {}
    }
    Ok(())
}

async fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    Ok(Config::load(&FileStore::new(path)).await?)
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("weft")
        .join("config.toml")
}

fn init_miette() {
    let installed = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    if installed.is_err() {
        eprintln!("couldn't set the miette hook");
    }
    miette::set_panic_hook();
}
