use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "modlike-server", about = "Student event management backend")]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the bind address from the config file.
    #[arg(long)]
    pub bind: Option<String>,
}
