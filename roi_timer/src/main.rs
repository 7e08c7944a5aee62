mod capture;
mod display;

use anyhow::{Context, Result, bail};
use capture::VideoFileSource;
use clap::{Parser, ValueEnum};
use display::HighGuiRenderer;
use roi_vision::{ImageSequenceSource, OccupancyMode, OccupancyPipeline, PipelineConfig, Roi};
use std::path::PathBuf;

/// Reports when a moving subject is fully inside a rectangle of a recorded video.
#[derive(Parser, Debug)]
#[command(name = "roi_timer")]
struct Args {
    /// Video file, or a directory of still frames (requires --fps).
    video: PathBuf,

    /// Region of interest as X Y WIDTH HEIGHT. All four or none.
    #[arg(value_name = "X Y WIDTH HEIGHT")]
    roi: Vec<u32>,

    /// Show each frame with the ROI and timers. ESC stops early.
    #[arg(short = 'V', long)]
    display: bool,

    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Overrides the frame rate reported by the video.
    #[arg(long)]
    fps: Option<f64>,

    /// TOML file with pipeline settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Smallest motion blob, in pixels, that can be the subject.
    #[arg(long)]
    min_area: Option<u32>,

    #[arg(long)]
    var_threshold: Option<f32>,

    #[arg(long)]
    binarize_threshold: Option<u8>,

    /// Frames of history for the background model.
    #[arg(long)]
    history: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Report only the first full entry.
    FirstEntry,
    /// Report every entry with its duration.
    Intervals,
}

impl From<Mode> for OccupancyMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::FirstEntry => OccupancyMode::FirstEntry,
            Mode::Intervals => OccupancyMode::Intervals,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = build_config(&args)?;
    let pipeline = OccupancyPipeline::new(config).context("invalid pipeline configuration")?;

    let summary = if args.video.is_dir() {
        let fps = args
            .fps
            .context("--fps is required when VIDEO is a directory of frames")?;
        if args.display {
            log::warn!("--display is only supported for video files; continuing without it");
        }
        let mut source = ImageSequenceSource::open(&args.video, fps)
            .with_context(|| format!("failed to read frames from {}", args.video.display()))?;
        pipeline.run(&mut source)?
    } else {
        let mut source = VideoFileSource::open(&args.video, args.fps)?;
        if args.display {
            let mut renderer = HighGuiRenderer::new();
            pipeline.run_with_renderer(&mut source, &mut renderer)?
        } else {
            pipeline.run(&mut source)?
        }
    };

    if summary.cancelled {
        log::info!("stopped by user after {} frames", summary.frames_processed);
    }
    println!("{}", summary.report);
    Ok(())
}

/// Layers the config file and command-line flags over the built-in defaults.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    config.roi = resolve_roi(&args.roi, config.roi)?;
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(min_area) = args.min_area {
        config.min_candidate_area = min_area;
    }
    if let Some(var_threshold) = args.var_threshold {
        config.motion.var_threshold = var_threshold;
    }
    if let Some(binarize_threshold) = args.binarize_threshold {
        config.motion.binarize_threshold = binarize_threshold;
    }
    if let Some(history) = args.history {
        config.motion.history = history;
    }
    Ok(config)
}

/// The ROI arguments are all-or-nothing. A partial set falls back to `fallback`.
fn resolve_roi(values: &[u32], fallback: Roi) -> Result<Roi> {
    match values {
        [] => Ok(fallback),
        &[x, y, width, height] => Ok(Roi::new(x, y, width, height)?),
        partial if partial.len() < 4 => {
            log::warn!(
                "expected 4 ROI values (X Y WIDTH HEIGHT) but got {}; using ROI {}",
                partial.len(),
                fallback
            );
            Ok(fallback)
        }
        extra => bail!("expected at most 4 ROI values, got {}", extra.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn full_roi_replaces_fallback() {
        let roi = resolve_roi(&[10, 20, 30, 40], Roi::default()).unwrap();
        assert_eq!(roi, Roi::new(10, 20, 30, 40).unwrap());
    }

    #[test]
    fn partial_roi_falls_back_entirely() {
        assert_eq!(resolve_roi(&[], Roi::default()).unwrap(), Roi::default());
        assert_eq!(resolve_roi(&[10], Roi::default()).unwrap(), Roi::default());
        assert_eq!(resolve_roi(&[10, 20, 30], Roi::default()).unwrap(), Roi::default());
    }

    #[test]
    fn too_many_or_zero_sized_roi_values_are_errors() {
        assert!(resolve_roi(&[1, 2, 3, 4, 5], Roi::default()).is_err());
        assert!(resolve_roi(&[1, 2, 0, 4], Roi::default()).is_err());
    }

    #[test]
    fn parses_positionals_and_flags() {
        let args = parse(&["roi_timer", "clip.mp4", "5", "6", "70", "80", "-V", "--mode", "first-entry"]);
        assert_eq!(args.video, PathBuf::from("clip.mp4"));
        assert_eq!(args.roi, vec![5, 6, 70, 80]);
        assert!(args.display);
        assert_eq!(args.mode, Some(Mode::FirstEntry));

        let config = build_config(&args).unwrap();
        assert_eq!(config.roi, Roi::new(5, 6, 70, 80).unwrap());
        assert_eq!(config.mode, OccupancyMode::FirstEntry);
    }

    #[test]
    fn defaults_without_flags() {
        let config = build_config(&parse(&["roi_timer", "clip.mp4"])).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "mode = \"first-entry\"\n[candidates]\nmin_area = 42\n[motion]\nhistory = 100"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let args = parse(&[
            "roi_timer",
            "clip.mp4",
            "--config",
            path,
            "--min-area",
            "7",
            "--binarize-threshold",
            "9",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.mode, OccupancyMode::FirstEntry);
        assert_eq!(config.min_candidate_area, 7);
        assert_eq!(config.motion.history, 100);
        assert_eq!(config.motion.binarize_threshold, 9);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Args::try_parse_from(["roi_timer", "clip.mp4", "--mode", "sometimes"]).is_err());
    }
}
