//! Live Kinect depth/color viewer

use color_eyre::{eyre::eyre, Result};
use tracing::info;

use depthview::capture::KinectCapture;
use depthview::display::{Sdl2Display, ViewMode};
use depthview::Config;

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("depthview=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("viewer launching...");
    let config = Config::default();

    let capture = KinectCapture::start(&config.capture)?;

    let sdl_context = sdl2::init().map_err(|e| eyre!(e))?;
    let mut app = Sdl2Display::new(
        &sdl_context,
        "Kinect Viewer",
        config.display.width,
        config.display.height,
    )?;
    app.run(&sdl_context, &capture, None, ViewMode::Depth)?;

    capture.stop();
    info!("viewer shutting down");
    Ok(())
}
