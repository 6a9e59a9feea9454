use std::path::PathBuf;

use clap::Parser;

/// Interactive host for the roomcast furniture rearranger.
#[derive(Parser, Debug, Default)]
#[command(
    about = "Rearrange a room's furniture with natural-language instructions",
    version
)]
pub struct Args {
    /// JSON config file (api_key, model, timings, catalog, assets_root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON furniture catalog replacing the built-in room
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Directory glTF model references are resolved against
    #[arg(long)]
    pub assets_root: Option<PathBuf>,

    /// Reasoning model name passed to the Gemini endpoint
    #[arg(long)]
    pub model: Option<String>,

    /// Furniture tween duration in milliseconds
    #[arg(long)]
    pub animation_ms: Option<u64>,

    /// Frame tick period in milliseconds
    #[arg(long)]
    pub frame_ms: Option<u64>,

    /// Write the final room state JSON here on exit
    #[arg(long)]
    pub state_json: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}
