mod cli;
mod commands;
mod render;
mod settings;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use huddle_common::{ConfigError, HuddleError};
use huddle_config::HuddleConfig;
use huddle_sync::{
    ChatSession, FileUpload, HttpUploader, InMemoryStore, RealtimeChannel, WsChannel,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::commands::{parse_line, Command, HELP};
use crate::render::{format_roster, Printer};
use crate::settings::Settings;

const DEFAULT_LOG_DIRECTIVE: &str = "huddle=info";

fn load_config(path: Option<&Path>) -> (HuddleConfig, Option<ConfigError>) {
    let loaded = match path {
        Some(path) => huddle_config::load_config_from(path),
        None => huddle_config::load_config(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (HuddleConfig::default(), Some(e)),
    }
}

fn init_logging(directive: &str) {
    let directive: Directive = directive.parse().unwrap_or_else(|_| {
        DEFAULT_LOG_DIRECTIVE
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Config first so its log level can seed the subscriber.
    let (config, config_error) = load_config(args.config.as_deref());
    let settings = Settings::resolve(&config, &args);
    init_logging(&settings.log_directive);

    tracing::info!("Huddle v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(e) = config_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    match run(settings).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("huddle: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> huddle_common::Result<()> {
    let channel: Arc<dyn RealtimeChannel> = Arc::new(WsChannel::new(settings.realtime.clone()));
    let store = Arc::new(InMemoryStore::new());
    let uploader = Arc::new(HttpUploader::new(settings.upload.clone())?);

    let mut session = ChatSession::new(
        settings.identity.clone(),
        settings.timings,
        channel,
        store,
        uploader,
    );
    session.start().await?;
    println!(
        "* joined {} as {}. {HELP}",
        settings.realtime.url, settings.identity.display_name
    );

    let mut printer = Printer::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = parse_line(&line) else { continue };
                // Stdin arrives a line at a time, so a finished line is the
                // only keystroke the composer can report.
                if command.is_composed() {
                    if let Err(e) = session.on_input().await {
                        tracing::debug!("Typing signal skipped: {e}");
                    }
                }
                if !handle_command(&mut session, command).await {
                    break;
                }
            }
            update = session.next_update() => {
                let Some(update) = update else { break };
                for line in printer.render(&update, session.messages(), session.presence()) {
                    println!("{line}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    session.teardown();
    Ok(())
}

/// Apply one composer command. Returns `false` when the user asked to quit.
async fn handle_command(session: &mut ChatSession, command: Command) -> bool {
    let result: Result<(), HuddleError> = match command {
        Command::Say(text) => session.send_message(&text, None).await.map(drop).map_err(Into::into),
        Command::File { path, caption } => send_file(session, &path, &caption).await,
        Command::Who => {
            for line in format_roster(session.identity(), session.presence()) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => return false,
        Command::Unknown(name) => {
            println!("! unknown command /{name}. {HELP}");
            Ok(())
        }
    };
    if let Err(e) = result {
        println!("! {e}");
    }
    true
}

async fn send_file(session: &mut ChatSession, path: &Path, caption: &str) -> Result<(), HuddleError> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| HuddleError::Other(format!("{} is not a file", path.display())))?;
    let upload = FileUpload::new(name, bytes);
    println!("* uploading {} ({} bytes)", upload.name, upload.len());
    session.send_file(caption, upload).await?;
    Ok(())
}
