use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::board::DEFAULT_LINES;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Parser, Debug)]
#[command(name = "lineup-board")]
#[command(about = "Line and roster builder for team coaches", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the lines and roster pages
    Serve(ServeArgs),
    /// Print a lineup read from a roster CSV
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "LINEUP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Roster CSV loaded at start-up
    #[arg(long, env = "LINEUP_ROSTER")]
    pub roster: Option<PathBuf>,

    /// File holding the saved line colors
    #[arg(long, env = "LINEUP_PREFS", default_value = "data/colors.json")]
    pub prefs: PathBuf,

    /// Directory lineup exports are written to
    #[arg(long, env = "LINEUP_EXPORT_DIR", default_value = "exports")]
    pub export_dir: PathBuf,

    /// Number of lines on the lines page
    #[arg(long, default_value_t = DEFAULT_LINES, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub lines: u8,

    /// Password for roster uploads
    #[arg(long, env = "ADMIN_PASSWORD", default_value = DEFAULT_ADMIN_PASSWORD, hide_env_values = true)]
    pub admin_password: String,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Roster CSV, its slot column gives the lineup
    #[arg(long)]
    pub roster: PathBuf,

    /// Also write the lineup to this file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Number of lines
    #[arg(long, default_value_t = DEFAULT_LINES, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub lines: u8,
}
