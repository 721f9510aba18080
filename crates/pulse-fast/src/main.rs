use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pulse_fast::cli::{self, CliArgs, DetectorChoice, RoiChoice};
use pulse_fast::dump::FrameDump;
use pulse_fast::pipeline::{run_measurement, FrameCallback, PipelineOptions};
use pulse_fast::session::MeasurementSession;
use pulse_fast::settings::{resolve_settings, EffectiveSettings};
use pulse_fast_detector::{build_detector, DetectorConfig, DetectorKind, RegionSelector};
use pulse_fast_detector::{BlinkWindow, FaceDetector, ScriptedDetector};
use pulse_fast_estimator::EstimatorConfig;
use pulse_fast_source::{Backend, Configuration};
use pulse_fast_types::{PulseError, RoiLayout};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let (args, sources) = cli::parse_cli();

    if args.list_backends {
        print_available_backends();
        return ExitCode::SUCCESS;
    }

    let settings = match resolve_settings(&args, &sources) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    match run(&args, &settings).await {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &CliArgs, settings: &EffectiveSettings) -> Result<bool, PulseError> {
    let mut config = Configuration::from_env().unwrap_or_default();
    if let Some(backend) = settings.backend.as_deref() {
        config.backend = Backend::from_str(backend)?;
    }
    config.camera_index = settings.camera_index;
    if let Some(capacity) = settings.channel_capacity.and_then(NonZeroUsize::new) {
        config.channel_capacity = Some(capacity);
    }

    let available = Configuration::available_backends();
    if !available.contains(&config.backend) {
        return Err(PulseError::unsupported(config.backend.as_str()));
    }

    if config.backend == Backend::Mock {
        // Let the mock scene cover the whole measurement window.
        let fps = config.scene.fps;
        config.scene.frame_count = (settings.duration_secs * fps).ceil() as usize + 1;
    }

    let detector = build_session_detector(settings, &config)?;
    let selector = RegionSelector::new(match settings.roi {
        RoiChoice::Forehead => RoiLayout::Forehead,
        RoiChoice::LowerFace => RoiLayout::LowerFace,
    });

    let provider = config.create_provider()?;
    let mut estimator = EstimatorConfig::default();
    if let Some(fps) = provider.nominal_fps() {
        estimator.fallback_fps = fps;
    }

    let mut session = MeasurementSession::new(detector, selector, estimator);

    let stop_requested = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop_requested);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop_flag.store(true, Ordering::Relaxed);
        }
    });

    let display = match args.dump_dir.clone() {
        Some(dir) => Some(dump_callback(FrameDump::new(dir)?)),
        None => None,
    };

    let progress = countdown_bar(settings.duration_secs);
    eprintln!(
        "look at the camera and blink; measuring for {:.0} seconds (Ctrl-C stops early)",
        settings.duration_secs
    );

    let outcome = run_measurement(
        provider,
        &mut session,
        PipelineOptions {
            duration_secs: Some(settings.duration_secs),
            progress: Some(progress),
            display,
            stop_requested: Some(stop_requested),
        },
    )
    .await;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&outcome)
    } else {
        serde_json::to_string(&outcome)
    }
    .map_err(|err| PulseError::configuration(format!("failed to render outcome: {err}")))?;
    println!("{rendered}");

    Ok(outcome.is_success())
}

fn dump_callback(mut dump: FrameDump) -> FrameCallback {
    let mut failed = false;
    Box::new(move |frame, annotation| {
        if failed {
            return;
        }
        if let Err(err) = dump.push(frame, annotation) {
            eprintln!("frame dump stopped: {err}");
            failed = true;
        }
    })
}

fn build_session_detector(
    settings: &EffectiveSettings,
    config: &Configuration,
) -> Result<Arc<dyn FaceDetector>, PulseError> {
    let mut detector_config = DetectorConfig {
        script: None,
        model_path: settings.detector_model.clone(),
    };
    let kind = match settings.detector {
        DetectorChoice::Scripted => DetectorKind::Scripted,
        DetectorChoice::Rustface => DetectorKind::Rustface,
    };

    if kind == DetectorKind::Scripted && config.backend == Backend::Mock {
        // Pair the scripted detector with the mock scene so a mock run is a
        // complete demonstration: the face matches the rendered one and a
        // short blink happens right at the start.
        detector_config.script = Some(ScriptedDetector::new(
            config.scene.face,
            vec![BlinkWindow::new(0.0, 0.2)],
        ));
    }

    let detector = build_detector(kind, detector_config)
        .map_err(|err| PulseError::configuration(err.to_string()))?;
    Ok(Arc::from(detector))
}

fn countdown_bar(duration_secs: f64) -> ProgressBar {
    let bar = ProgressBar::new(duration_secs.ceil() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{bar:40.cyan/blue} {percent:>3}% {pos}/{len}s [{elapsed_precise}]",
        )
        .unwrap(),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn print_available_backends() {
    let names: Vec<&'static str> = Configuration::available_backends()
        .iter()
        .map(Backend::as_str)
        .collect();
    if names.is_empty() {
        println!("available backends: (none compiled)");
    } else {
        println!("available backends: {}", names.join(", "));
    }
}
