//! CLI definitions

use clap::Parser;
use std::path::PathBuf;

/// FaceRelis backend server
#[derive(Debug, Parser)]
#[command(
    name = "fr",
    about = "HTTP backend for the FaceRelis photo clustering app",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the configured listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the configured listen port
    #[arg(long)]
    pub port: Option<u16>,
}
