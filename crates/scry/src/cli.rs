use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "scry",
    author,
    version,
    about = "Full-screen photo slideshow viewed through a drifting crystal-ball lens",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Directory containing the photos (jpg/jpeg/png, non-recursive).
    #[arg(value_name = "PHOTO_DIR")]
    pub photos: PathBuf,

    /// Optional settings file (TOML); CLI flags override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How long each photo is held before the next dissolve (e.g. `15s`).
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub display: Option<Duration>,

    /// Dissolve length (e.g. `2s`).
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub fade: Option<Duration>,

    /// Frame cap on top of vsync; `0` disables the cap.
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Disable the backlight oscillation thread.
    #[arg(long)]
    pub no_brightness: bool,

    /// Interval between one-percent brightness steps (e.g. `100ms`).
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub step: Option<Duration>,

    /// Render in a desktop window instead of borderless fullscreen.
    #[arg(long)]
    pub windowed: bool,

    /// Keep the cursor visible over the slideshow.
    #[arg(long)]
    pub cursor: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
