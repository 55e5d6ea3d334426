use anyhow::{anyhow, Context, Result};
use clap::Parser;
use overlay::{LogSurface, Overlay, OverlayConfig, OverlaySurface, TerminalSurface};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use volume_ctrl::logging::{self, LogOutput, LoggingConfig, LoggingMode};
use volume_ctrl::{
    discovery_loop, fake_volume_loop, shutdown_on, volume_loop, Args, DeviceSlot, NetworkFinder,
    RenderingControlFactory, SurfaceKind, VolumeDisplay,
};

/// Terminal cell the overlay text is drawn at.
const TEXT_COLUMN: u16 = 5;
const TEXT_ROW: u16 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate().map_err(|e| anyhow!(e))?;

    let relay = args
        .relay_url
        .as_deref()
        .map(|url| {
            log_relay::client::relay(
                url,
                &args.relay_identifier,
                logging::relay_level(args.log_level.as_deref()),
            )
        })
        .transpose()
        .context("failed to set up log relay")?;
    let (relay_layer, relay_forwarder) = match relay {
        Some((layer, forwarder)) => (Some(layer), Some(forwarder)),
        None => (None, None),
    };

    let output = match args.surface {
        SurfaceKind::Terminal => LogOutput::File(args.log_file.clone()),
        SurfaceKind::Log => LogOutput::Stderr,
    };
    logging::init_logging(LoggingConfig {
        mode: logging::mode_from_env(LoggingMode::Development),
        output,
        level: args.log_level.clone(),
        relay: relay_layer,
    })
    .context("failed to initialize logging")?;

    if let Some(forwarder) = relay_forwarder {
        info!(endpoint = forwarder.endpoint(), "forwarding logs to relay");
        tokio::spawn(forwarder.run());
    }

    match args.surface {
        SurfaceKind::Terminal => {
            let surface = TerminalSurface::stdout(TEXT_COLUMN, TEXT_ROW)
                .context("failed to set up terminal overlay")?;
            run(args, surface).await
        }
        SurfaceKind::Log => run(args, LogSurface).await,
    }
}

async fn run<S: OverlaySurface>(args: Args, surface: S) -> Result<()> {
    let overlay = Overlay::spawn(surface, OverlayConfig::default());
    let mut display = VolumeDisplay::new(overlay.handle(), args.display_duration());
    let on_volume = move |volume| display.on_volume(volume);

    let tasks: Vec<JoinHandle<()>> = if args.fake {
        info!("using random volumes");
        vec![tokio::spawn(fake_volume_loop(args.refresh_interval(), on_volume))]
    } else {
        let slot = DeviceSlot::new();
        let finder = Arc::new(NetworkFinder {
            filter: args.filter(),
            options: args.discovery_options(),
        });
        let factory = Arc::new(RenderingControlFactory {
            timeout: args.discovery_timeout(),
        });
        info!(vendor = %args.vendor, "searching for device");

        let discovery = tokio::spawn({
            let slot = slot.clone();
            let interval = args.discovery_interval();
            async move {
                if let Err(e) = discovery_loop(finder, slot, interval).await {
                    error!(error = %e, "discovery stopped");
                }
            }
        });
        let polling = tokio::spawn({
            let interval = args.refresh_interval();
            async move {
                if let Err(e) = volume_loop(factory, slot, interval, on_volume).await {
                    error!(error = %e, "volume polling stopped");
                }
            }
        });
        vec![discovery, polling]
    };

    shutdown_on(overlay, tasks, tokio::signal::ctrl_c()).await
}
