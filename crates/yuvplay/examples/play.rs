//! Play a raw YUV file in a window.
//!
//! ```text
//! cargo run --example play -- clip.yuv 960x540 25 yuv420p
//! ```
//!
//! Only the path is required. Resolution defaults to 960x540, the frame rate
//! to 25, and the pixel format to yuv420p. Set `RUST_LOG=debug` to watch
//! resources being created and released.

use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use yuvplay::prelude::*;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = args.first() else {
        eprintln!("usage: play <file.yuv> [WxH] [fps] [pixfmt]");
        return ExitCode::FAILURE;
    };

    match run(path, &args[1..]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("play: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str, rest: &[String]) -> Result<()> {
    let mut config = PlayerConfig::default();
    if let Some(resolution) = rest.first() {
        config.resolution = resolution.parse()?;
        config.surface_size = config.resolution;
    }
    if let Some(fps) = rest.get(1) {
        config.frame_rate = fps
            .parse()
            .map_err(|_| Error::InvalidOption(format!("frame rate \"{fps}\" is not a number")))?;
    }
    if let Some(pixfmt) = rest.get(2) {
        config.renderer = config.renderer.with_format(pixfmt.parse::<PixelFormat>()?);
    }

    log::info!(
        "playing {path}: {} {} at {} fps, {} bytes per frame",
        config.resolution,
        config.renderer.pixfmt.resolve()?,
        config.frame_rate,
        config.frame_len()?
    );

    let file = File::open(path)?;
    play(config, BufReader::new(file))
}
