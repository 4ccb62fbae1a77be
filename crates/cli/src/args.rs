use std::path::PathBuf;

use clap::Parser;

/// Convert QuickTime .mov files into .mp4 files with ffmpeg.
#[derive(Parser, Debug)]
#[command(name = "movshift", author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file (TOML)
    #[arg(short, long, env = "MOVSHIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the converted files are saved into
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Files to convert; files without the source extension are skipped
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}
