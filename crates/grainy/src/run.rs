use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use renderer::window::{run_preview, PreviewConfig};
use renderer::{Callbacks, GrainRenderer};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ExportArgs, InspectArgs, PreviewArgs};
use crate::settings::{self, Settings};

pub fn run(cli: Cli) -> Result<()> {
    let settings = settings::resolve(&cli.render)?;
    tracing::debug!(source = ?settings.source, options = ?settings.options, "resolved settings");
    match cli.command {
        None => preview(settings, PreviewArgs::default()),
        Some(Command::Preview(args)) => preview(settings, args),
        Some(Command::Export(args)) => export(settings, args),
        Some(Command::Inspect(args)) => inspect(settings, args),
    }
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn preview(settings: Settings, args: PreviewArgs) -> Result<()> {
    let Settings {
        source,
        mut options,
    } = settings;
    options.paused |= args.paused;
    tracing::info!(size = %args.size, "opening preview window");

    let mut config = PreviewConfig::new(source, options);
    config.size = args.size;
    config.callbacks = Callbacks::default()
        .on_ready(|| tracing::debug!("first frame presented"))
        .on_context_error(|err| {
            tracing::error!(reason = err.reason(), "preview has no GPU; the window stays blank")
        });
    run_preview(config)
}

fn export(settings: Settings, args: ExportArgs) -> Result<()> {
    let Settings { source, options } = settings;
    let image = if args.cpu {
        renderer::cpu::render_cpu(&source, &options, args.size, args.time)
            .context("failed to evaluate gradient")?
    } else {
        let failure = Rc::new(RefCell::new(None));
        let callbacks = Callbacks::default().on_context_error({
            let failure = failure.clone();
            move |err| *failure.borrow_mut() = Some(err.clone())
        });
        let mut renderer = GrainRenderer::headless(args.size, source, options, callbacks);
        if let Some(err) = failure.borrow_mut().take() {
            return Err(anyhow::Error::new(err).context("GPU export failed; retry with --cpu"));
        }
        if let Some(profile) = renderer.adapter() {
            tracing::debug!(adapter = %profile.name, backend = ?profile.backend, "exporting on GPU");
        }
        renderer
            .render_to_image(args.time)
            .context("failed to render frame")?
    };

    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    tracing::info!(
        path = %args.output.display(),
        width = image.width(),
        height = image.height(),
        "exported frame"
    );
    Ok(())
}

fn inspect(settings: Settings, args: InspectArgs) -> Result<()> {
    let params = renderer::frame_parameters(&settings.source, &settings.options, args.size, args.time)
        .context("failed to evaluate gradient")?;
    let json = serde_json::to_string_pretty(&params).context("failed to serialize frame")?;
    println!("{json}");
    Ok(())
}
