use crate::cli::{Args, OutputFormat};
use crate::output::FrameOutput;
use crate::scenario::{Scenario, ScenarioPlayer};
use dimmer_core::animation::{AnimationThread, AnimationThreadConfig};
use dimmer_core::config::documented_yaml;
use dimmer_core::frame::FrameDriver;
use dimmer_core::mock::{HeadlessCompositor, HeadlessHost};
use dimmer_core::{
    CommandTransaction, Compositor, Config, Dimmer, DimmerError, DimmerResult, DimmerSettings,
};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

mod cli;
mod logger;
mod output;
mod scenario;

const DEMO_SCENARIO: &str = include_str!("../../demos/handover.yaml");

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Dimmer(#[from] DimmerError),
    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error("Failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("Failed to start frame loop: {0}")]
    Runtime(#[from] std::io::Error),
}

fn main() -> Result<(), CliError> {
    let args = cli::parse_args();
    logger::init_logger(args.quiet, args.verbose)?;

    let config = load_config(&args)?;
    if args.print_config {
        print!("{}", documented_yaml(&config)?);
        return Ok(());
    }

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::parse(DEMO_SCENARIO)?,
    };

    if args.dry_run {
        info!(
            "Configuration and scenario are valid ({} frames)",
            scenario.frame_count()
        );
        return Ok(());
    }

    info!("Starting dimmer {}", dimmer_core::version());

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received Ctrl+C, stopping playback...");
        shutdown_clone.store(true, Ordering::SeqCst);
    })?;

    run(&config, scenario, args.format, shutdown)?;

    info!("Dimmer stopped");
    Ok(())
}

fn load_config(args: &Args) -> DimmerResult<Config> {
    if args.use_defaults {
        info!("Using default configuration");
        return Ok(Config::default());
    }

    let config = Config::load(args.config_path.as_deref(), true)?;
    if let Some(path) = &config.config_path {
        info!("Loaded config from {}", path.display());
    }
    Ok(config)
}

fn lock(compositor: &Mutex<HeadlessCompositor>) -> MutexGuard<'_, HeadlessCompositor> {
    compositor.lock().unwrap_or_else(|e| e.into_inner())
}

fn run(
    config: &Config,
    scenario: Scenario,
    format: OutputFormat,
    shutdown: Arc<AtomicBool>,
) -> Result<(), CliError> {
    let compositor = Arc::new(Mutex::new(HeadlessCompositor::new()));
    let mut player = ScenarioPlayer::new(scenario, &mut lock(&compositor));

    let animation_thread = AnimationThread::new(
        AnimationThreadConfig::from_config(config),
        compositor.clone(),
    );
    let mut dimmer = Dimmer::with_settings(
        HeadlessHost::new(player.host_bounds(), compositor.clone()),
        Box::new(animation_thread.factory()),
        DimmerSettings::from_config(config),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let driver = FrameDriver::new(config.animation_fps, shutdown);
    let mut output = FrameOutput::new(format);

    let frames = runtime.block_on(driver.run(|frame| {
        let mut transaction = CommandTransaction::new();
        let playing = player.play_frame(&mut dimmer, &mut transaction);
        if !playing {
            // Scenario is over, only land the animations still in flight
            dimmer.process_animation_events(&mut transaction);
        }

        let mut compositor = lock(&compositor);
        let dim_alpha = dimmer
            .get_dim_layer()
            .and_then(|dim| compositor.surface(dim))
            .map(|surface| surface.alpha);
        output.frame(frame, &transaction, dim_alpha);
        compositor.apply(transaction);

        playing || dimmer.is_animating()
    }));

    output.summary(frames, &lock(&compositor));
    Ok(())
}
