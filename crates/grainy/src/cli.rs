use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use renderer::{GpuBackend, Size};

#[derive(Parser, Debug)]
#[command(
    name = "grainy",
    author,
    version,
    about = "Render CSS linear gradients with a dithered grain",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub render: RenderArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Overrides applied on top of the configuration file.
#[derive(Args, Debug, Default, Clone)]
pub struct RenderArgs {
    /// Configuration file; defaults to `grainy.toml` in the user config directory.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Gradient description, e.g. `linear-gradient(90deg, #000, #fff)`.
    #[arg(long, value_name = "CSS", global = true)]
    pub gradient: Option<String>,

    /// Noise drift speed; 0 keeps the grain still.
    #[arg(long = "shimmer", value_name = "SPEED", global = true, allow_negative_numbers = true)]
    pub shimmer_speed: Option<f32>,

    /// Noise seed text.
    #[arg(long, value_name = "SEED", global = true)]
    pub seed: Option<String>,

    /// Side length of the square noise texture.
    #[arg(long, value_name = "PIXELS", global = true)]
    pub noise_size: Option<u32>,

    /// Resolution scale applied to the surface size (min 0.1).
    #[arg(long = "scale", value_name = "FACTOR", global = true)]
    pub resolution_scale: Option<f32>,

    /// Point-sample the noise texture.
    #[arg(long, global = true)]
    pub pixelated: bool,

    /// Stretch the gradient to the surface instead of following its aspect ratio.
    #[arg(long, global = true)]
    pub stretch: bool,

    /// Prefer a software adapter.
    #[arg(long, global = true)]
    pub fallback_adapter: bool,

    /// Restrict the GPU backend: `auto`, `vulkan`, `metal`, `dx12` or `gl`.
    #[arg(long, value_name = "BACKEND", global = true, value_parser = parse_backend)]
    pub backend: Option<GpuBackend>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open an interactive preview window (the default).
    Preview(PreviewArgs),
    /// Render one frame to a PNG file.
    Export(ExportArgs),
    /// Print the evaluated frame parameters as JSON.
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// Initial window size.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "960x540")]
    pub size: Size,

    /// Start with the animation paused.
    #[arg(long)]
    pub paused: bool,
}

impl Default for PreviewArgs {
    fn default() -> Self {
        Self {
            size: Size::new(960, 540),
            paused: false,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Destination PNG path.
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,

    /// Output size before the resolution scale.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "1920x1080")]
    pub size: Size,

    /// Elapsed milliseconds to evaluate the frame at.
    #[arg(long, value_name = "MS", default_value_t = 0.0)]
    pub time: f64,

    /// Render on the CPU instead of the GPU.
    #[arg(long)]
    pub cpu: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Surface size to evaluate for.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "400x200")]
    pub size: Size,

    /// Elapsed milliseconds to evaluate the frame at.
    #[arg(long, value_name = "MS", default_value_t = 0.0)]
    pub time: f64,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<Size, String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WIDTHxHEIGHT, e.g. 1920x1080".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{}'", width.trim()))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{}'", height.trim()))?;
    if width == 0 || height == 0 {
        return Err("dimensions must be greater than zero".into());
    }
    Ok(Size::new(width, height))
}

fn parse_backend(value: &str) -> Result<GpuBackend, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1920x1080").unwrap(), Size::new(1920, 1080));
        assert_eq!(parse_size(" 64 X 32 ").unwrap(), Size::new(64, 32));
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("wide").is_err());
        assert!(parse_size("10x").is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "grainy",
            "export",
            "--output",
            "out.png",
            "--size",
            "32x16",
            "--gradient",
            "linear-gradient(red, blue)",
            "--shimmer",
            "-1.5",
            "--cpu",
        ])
        .unwrap();
        assert_eq!(
            cli.render.gradient.as_deref(),
            Some("linear-gradient(red, blue)")
        );
        assert_eq!(cli.render.shimmer_speed, Some(-1.5));
        let Some(Command::Export(export)) = cli.command else {
            panic!("expected export command");
        };
        assert!(export.cpu);
        assert_eq!(export.size, Size::new(32, 16));
        assert_eq!(export.time, 0.0);
    }

    #[test]
    fn preview_is_optional() {
        let cli = Cli::try_parse_from(["grainy", "--backend", "gl"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.render.backend, Some(GpuBackend::Gl));
        assert!(Cli::try_parse_from(["grainy", "--backend", "glide"]).is_err());
    }
}
