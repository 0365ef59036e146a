use anyhow::{anyhow, Context, Result};
use grainconfig::{GrainConfig, PowerPreference, SeedValue};
use renderer::{
    GpuBackend, GpuPowerPreference, GradientCycle, GradientSource, NoiseSeed, RenderOptions,
};

use crate::cli::RenderArgs;
use crate::paths::AppPaths;

pub const DEFAULT_GRADIENT: &str = "linear-gradient(to bottom right, #1d2b64, #f8cdda)";

/// What to draw and how, after merging config file and flags.
#[derive(Debug)]
pub struct Settings {
    pub source: GradientSource,
    pub options: RenderOptions,
}

/// Loads the configuration (explicit path, or the default location if it
/// exists) and layers the command-line overrides on top.
pub fn resolve(args: &RenderArgs) -> Result<Settings> {
    let config = match &args.config {
        Some(path) => Some(
            GrainConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
        ),
        None => {
            let paths = AppPaths::discover()?;
            let path = paths.config_file();
            let config = GrainConfig::load_optional(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            if config.is_some() {
                tracing::debug!(path = %path.display(), "loaded default config");
            }
            config
        }
    };
    merge(config.as_ref(), args)
}

pub fn merge(config: Option<&GrainConfig>, args: &RenderArgs) -> Result<Settings> {
    let mut options = RenderOptions::default();
    let mut source = GradientSource::from(DEFAULT_GRADIENT);

    if let Some(config) = config {
        apply_config(config, &mut options, &mut source)?;
    }

    if let Some(gradient) = &args.gradient {
        source = GradientSource::from(gradient.as_str());
    }
    if let Some(speed) = args.shimmer_speed {
        options.shimmer_speed = speed;
    }
    if let Some(seed) = &args.seed {
        options.noise_seed = NoiseSeed::from(seed.as_str());
    }
    if let Some(size) = args.noise_size {
        options.noise_texture_size = size;
    }
    if let Some(scale) = args.resolution_scale {
        options.resolution_scale = scale;
    }
    if args.pixelated {
        options.pixelated = true;
    }
    if args.stretch {
        options.preserve_aspect = false;
    }
    if args.fallback_adapter {
        options.context.force_fallback_adapter = true;
    }
    if let Some(backend) = args.backend {
        options.context.backends = backend;
    }

    Ok(Settings {
        source,
        options: options.normalized(),
    })
}

fn apply_config(
    config: &GrainConfig,
    options: &mut RenderOptions,
    source: &mut GradientSource,
) -> Result<()> {
    if let Some(gradient) = &config.gradient {
        *source = GradientSource::from(gradient.as_str());
    } else if let Some(cycle) = &config.cycle {
        *source = GradientSource::Cycle(GradientCycle::new(
            cycle.gradients.clone(),
            cycle.period.as_secs_f64() * 1000.0,
        ));
    }

    if let Some(speed) = config.shimmer_speed {
        options.shimmer_speed = speed;
    }
    if let Some(preserve) = config.preserve_aspect {
        options.preserve_aspect = preserve;
    }
    if let Some(pixelated) = config.pixelated {
        options.pixelated = pixelated;
    }
    if let Some(paused) = config.paused {
        options.paused = paused;
    }
    if let Some(scale) = config.resolution_scale {
        options.resolution_scale = scale;
    }
    if let Some(initial) = config.initial_time_ms() {
        options.initial_time_ms = initial;
    }
    if let Some(font_size) = config.root_font_size {
        options.root_font_size = font_size;
    }

    if let Some(size) = config.noise.texture_size {
        options.noise_texture_size = size;
    }
    match &config.noise.seed {
        Some(SeedValue::Text(text)) => options.noise_seed = NoiseSeed::from(text.as_str()),
        Some(SeedValue::Number(value)) => options.noise_seed = NoiseSeed::from(*value),
        None => {}
    }

    let context = &config.context;
    if let Some(force) = context.force_fallback_adapter {
        options.context.force_fallback_adapter = force;
    }
    if let Some(preference) = context.power_preference {
        options.context.power_preference = match preference {
            PowerPreference::Low => GpuPowerPreference::Low,
            PowerPreference::High => GpuPowerPreference::High,
        };
    }
    if let Some(backend) = &context.backend {
        options.context.backends = backend
            .parse::<GpuBackend>()
            .map_err(|err| anyhow!("context.backend: {err}"))?;
    }
    Ok(())
}
