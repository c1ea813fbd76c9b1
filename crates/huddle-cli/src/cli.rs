use std::path::PathBuf;

use clap::Parser;

/// Huddle: a terminal client for a shared realtime chat room.
#[derive(Parser, Debug)]
#[command(name = "huddle", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. `huddle=debug`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Display name to join with.
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Stable user id. A fresh one is generated when unset.
    #[arg(long)]
    pub user_id: Option<String>,

    /// Room WebSocket URL.
    #[arg(long)]
    pub url: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
