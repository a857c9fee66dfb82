// Example runner: feeds a generated floor scene through the touch pipeline and
// logs every detected touch. Real sensors plug in through `FrameSource`.

use anyhow::Context;
use clap::Parser;
use floor_touch::{
    FrameSource, ParallelPipeline, PipelineConfig, SourceError, SyntheticFloorSource, TouchError,
    TouchPipeline,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "floor_touch")]
#[command(about = "Detect floor touches in a stream of depth frames")]
#[command(version)]
struct Cli {
    /// Number of frames to generate, including the empty calibration frame
    #[arg(short, long, default_value = "30")]
    frames: u64,

    /// JSON file with pipeline settings (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Raw depth reading of the empty floor, in sensor units
    #[arg(long, default_value = "1000")]
    floor: u16,

    /// Height of the simulated foot above the floor, in sensor units
    #[arg(long, default_value = "60")]
    hover: u16,

    /// Radius of the simulated foot, in pixels
    #[arg(long, default_value = "50")]
    radius: u32,

    /// Process frames on a worker pool instead of one at a time
    #[arg(short, long)]
    parallel: bool,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=floor_touch=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let source = SyntheticFloorSource::new(config.image_width, config.image_height)
        .with_floor_depth(cli.floor)
        .with_foot(cli.hover, cli.radius)
        .with_frame_count(cli.frames);

    if cli.parallel {
        run_parallel(config, source)
    } else {
        run_sequential(config, source)
    }
}

fn run_sequential(config: PipelineConfig, mut source: SyntheticFloorSource) -> anyhow::Result<()> {
    let mut pipeline = TouchPipeline::new(config)?;
    let mut touches = 0u64;

    loop {
        match pipeline.process_next(&mut source) {
            Ok(Some(frame)) => {
                if let Some(touch) = frame.analysis.touch {
                    touches += 1;
                    info!(
                        frame = frame.analysis.frame_index,
                        x = touch.x,
                        y = touch.y,
                        confidence = touch.confidence(),
                        "Touch"
                    );
                }
            }
            Ok(None) => continue,
            Err(TouchError::Source(SourceError::Exhausted)) => break,
            Err(e) => return Err(e.into()),
        }
    }

    report(pipeline.frames_processed(), touches);
    Ok(())
}

fn run_parallel(config: PipelineConfig, mut source: SyntheticFloorSource) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(async move {
        let pipeline = ParallelPipeline::new(config)?;

        // The first frame is processed on its own so that it becomes the baseline.
        let mut frames = Vec::new();
        loop {
            match source.next_frame() {
                Ok(Some(frame)) => frames.push(frame.depth),
                Ok(None) => continue,
                Err(SourceError::Exhausted) => break,
                Err(e) => return Err(TouchError::from(e).into()),
            }
        }
        let Some((first, rest)) = frames.split_first() else {
            warn!("Frame source produced no frames");
            return Ok(());
        };
        pipeline.process_frame(first).await?;

        let mut touches = 0u64;
        for result in pipeline.process_batch(rest).await {
            let analysis = result?;
            if let Some(touch) = analysis.touch {
                touches += 1;
                info!(
                    frame = analysis.frame_index,
                    x = touch.x,
                    y = touch.y,
                    confidence = touch.confidence(),
                    "Touch"
                );
            }
        }

        report(frames.len() as u64, touches);
        Ok::<(), anyhow::Error>(())
    })
}

fn report(frames: u64, touches: u64) {
    info!(frames, touches, "Processing complete");
}
