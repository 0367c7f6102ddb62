use std::path::PathBuf;

use clap::Parser;

use crate::model::transform::sanitize_speed;

pub const DEFAULT_IMAGE: &str = "images/img.png";
pub const WINDOW_SIZE: u32 = 800;
pub const FRAMES_PER_SECOND: u32 = 25;

/// Rotate and zoom an image on the GPU.
///
/// Left/Right change rotation speed, Down/Up change zoom speed, Space stops both.
#[derive(Parser, Debug)]
#[command(name = "rotozoom", version, about)]
pub struct Args {
    /// Image to display.
    #[arg(default_value = DEFAULT_IMAGE)]
    pub image_path: PathBuf,

    /// Starting rotation speed in degrees per frame; ignored unless within [-180, 180].
    #[arg(default_value_t = 0.0, allow_negative_numbers = true)]
    pub initial_speed: f64,
}

/// Fixed runtime settings resolved from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub image_path: PathBuf,
    pub initial_speed: f64,
    pub window_width: u32,
    pub window_height: u32,
    pub frames_per_second: u32,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Self {
            image_path: args.image_path,
            initial_speed: sanitize_speed(args.initial_speed),
            window_width: WINDOW_SIZE,
            window_height: WINDOW_SIZE,
            frames_per_second: FRAMES_PER_SECOND,
        }
    }
}

pub fn parse() -> Settings {
    Args::parse().into()
}
