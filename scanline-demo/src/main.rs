use anyhow::{Context, Result};
use scanline_core::Surface;
use scanline_demo::{DemoConfig, Dial, FramePacer, util};
use std::time::Instant;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    util::init_tracing();
    util::install_panic_hook();

    let config = DemoConfig::from_env().context("invalid demo configuration")?;
    tracing::info!("=== Scanline Demo Starting === {:?}", config);

    let mut surface = config
        .open_options()
        .open()
        .context("failed to open framebuffer")?;

    let frames = run(&mut surface, &config).await;
    surface.close();

    tracing::info!("drew {} frames", frames);
    Ok(())
}

/// Animate until the configured duration elapses or Ctrl+C arrives.
async fn run(surface: &mut Surface, config: &DemoConfig) -> u64 {
    let (w, h) = surface.size();
    let mut dial = Dial::fit(w, h);

    let start = Instant::now();
    let mut pacer = FramePacer::new(config.frame_interval(), start);
    let mut frames = 0u64;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while start.elapsed() < config.duration {
        dial.render(surface);
        surface.present();
        frames += 1;

        let now = Instant::now();
        let deadline = pacer.frame_done(now).unwrap_or(now);

        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Ctrl+C received, stopping");
                break;
            }
            _ = tokio::time::sleep_until(deadline.into()) => {}
        }
    }

    frames
}
