mod settings;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;
use crossbeam_channel::Receiver;

use farmguard_core::alerting::domain::alert_policy::AlertPolicy;
use farmguard_core::alerting::domain::alert_sink::AlertSink;
use farmguard_core::alerting::infrastructure::command_alert_sound::load_alert_sounds;
use farmguard_core::detection::domain::target_classes::TargetClasses;
use farmguard_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_MIN_CONFIDENCE,
};
use farmguard_core::pipeline::monitor_use_case::MonitorUseCase;
use farmguard_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use farmguard_core::recognition::domain::authorization_gate::AuthorizationGate;
use farmguard_core::recognition::domain::face_matcher::FaceMatcher;
use farmguard_core::recognition::domain::identity_gallery::IdentityGallery;
use farmguard_core::recognition::infrastructure::json_gallery_store::JsonGalleryStore;
use farmguard_core::recognition::infrastructure::onnx_arcface_encoder::OnnxArcFaceEncoder;
use farmguard_core::recognition::infrastructure::onnx_yolo_face_locator::{
    self, OnnxYoloFaceLocator,
};
use farmguard_core::shared::clock::{Clock, SystemClock};
use farmguard_core::shared::constants::{
    AUTHORIZED_DIR_NAME, DETECTIONS_DIR_NAME, EMBEDDING_MODEL_NAME, FACE_MODEL_NAME,
    GALLERY_FILE_NAME, OBJECT_MODEL_NAME,
};
use farmguard_core::shared::model_resolver;
use farmguard_core::video::infrastructure::ffmpeg_camera_source::FfmpegCameraSource;
use farmguard_core::video::infrastructure::image_file_writer::ImageFileWriter;

use settings::Settings;

/// Watches a camera for people, animals and birds and raises alerts.
///
/// While running, type a command and press Enter: `a` adds an authorized
/// user, `q` quits.
#[derive(Parser)]
#[command(name = "farmguard")]
struct Cli {
    /// Capture device, stream URL or video file.
    #[arg(long)]
    device: Option<String>,

    /// Input format for the device, e.g. v4l2, avfoundation or dshow.
    #[arg(long)]
    input_format: Option<String>,

    /// Requested capture width.
    #[arg(long)]
    width: Option<u32>,

    /// Requested capture height.
    #[arg(long)]
    height: Option<u32>,

    /// Directory for detection snapshots and authorized users.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory holding the ONNX models.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Directory holding human_alert.wav, animal_alert.wav and bird_alert.wav.
    #[arg(long)]
    sounds_dir: Option<PathBuf>,

    /// Seconds between alerts, shared by all detection types.
    #[arg(long)]
    cooldown: Option<f64>,

    /// Seconds between face recognition passes.
    #[arg(long)]
    face_check_interval: Option<f64>,

    /// Face match tolerance (smaller is stricter).
    #[arg(long)]
    tolerance: Option<f64>,

    /// Detection confidence threshold (0.0-1.0, exclusive).
    #[arg(long)]
    confidence: Option<f64>,

    /// Disable face recognition; every person triggers an alert.
    #[arg(long)]
    no_face_recognition: bool,

    /// Do not mirror the camera image.
    #[arg(long)]
    no_mirror: bool,

    /// Settings file (default: <config dir>/FarmGuard/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = merge(load_settings(&cli), &cli);
    settings.validate()?;

    let detections_dir = settings.data_dir.join(DETECTIONS_DIR_NAME);
    let authorized_dir = settings.data_dir.join(AUTHORIZED_DIR_NAME);
    create_dir(&detections_dir)?;
    create_dir(&authorized_dir)?;

    let model_dir = settings.model_dir.as_deref();
    let detector_path = resolve_model(OBJECT_MODEL_NAME, model_dir)?;
    let detector = OnnxYoloDetector::new(
        &detector_path,
        settings.confidence.min(DEFAULT_MIN_CONFIDENCE),
    )?;
    let matcher = if settings.face_recognition {
        Some(build_matcher(model_dir, settings.tolerance)?)
    } else {
        log::info!("Face recognition disabled");
        None
    };

    let gallery = IdentityGallery::load_or_empty(Box::new(JsonGalleryStore::new(
        settings.data_dir.join(GALLERY_FILE_NAME),
    )));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sink = AlertSink::new(
        load_alert_sounds(&settings.sounds_dir()),
        Box::new(ImageFileWriter::new()),
        detections_dir,
    );

    let mut camera = FfmpegCameraSource::new(
        settings.device.clone(),
        Some((settings.width, settings.height)),
    );
    if let Some(format) = &settings.input_format {
        camera = camera.with_input_format(format.clone());
    }

    let mut monitor = MonitorUseCase::new(
        Box::new(camera),
        Box::new(detector),
        TargetClasses::coco(settings.confidence),
        matcher,
        gallery,
        AuthorizationGate::new(settings.face_check_interval()?, clock.clone()),
        AlertPolicy::new(settings.cooldown()?, clock),
        sink,
        Box::new(ImageFileWriter::new()),
        authorized_dir,
        settings.mirror,
        Box::new(StdoutPipelineLogger::default()),
    );

    let summary = monitor.run(&spawn_input_reader())?;
    log::info!(
        "Processed {} frames, fired {} alerts, enrolled {} users",
        summary.frames,
        summary.alerts,
        summary.enrolled
    );
    Ok(())
}

fn load_settings(cli: &Cli) -> Settings {
    cli.settings
        .clone()
        .or_else(Settings::default_path)
        .map(|path| Settings::load_from(&path))
        .unwrap_or_default()
}

/// Command-line values take precedence over the settings file.
fn merge(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(device) = &cli.device {
        settings.device = device.clone();
    }
    if let Some(format) = &cli.input_format {
        settings.input_format = Some(format.clone());
    }
    if let Some(width) = cli.width {
        settings.width = width;
    }
    if let Some(height) = cli.height {
        settings.height = height;
    }
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.model_dir {
        settings.model_dir = Some(dir.clone());
    }
    if let Some(dir) = &cli.sounds_dir {
        settings.sounds_dir = Some(dir.clone());
    }
    if let Some(cooldown) = cli.cooldown {
        settings.cooldown_secs = cooldown;
    }
    if let Some(interval) = cli.face_check_interval {
        settings.face_check_interval_secs = interval;
    }
    if let Some(tolerance) = cli.tolerance {
        settings.tolerance = tolerance;
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    if cli.no_face_recognition {
        settings.face_recognition = false;
    }
    if cli.no_mirror {
        settings.mirror = false;
    }
    settings
}

fn resolve_model(name: &str, model_dir: Option<&Path>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    Ok(model_resolver::resolve(name, model_dir)?)
}

fn build_matcher(
    model_dir: Option<&Path>,
    tolerance: f64,
) -> Result<FaceMatcher, Box<dyn std::error::Error>> {
    let locator = OnnxYoloFaceLocator::new(
        &resolve_model(FACE_MODEL_NAME, model_dir)?,
        onnx_yolo_face_locator::DEFAULT_CONFIDENCE,
    )?;
    let encoder = OnnxArcFaceEncoder::new(&resolve_model(EMBEDDING_MODEL_NAME, model_dir)?)?;
    Ok(FaceMatcher::new(
        Box::new(locator),
        Box::new(encoder),
        tolerance,
    ))
}

fn create_dir(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(path)
        .map_err(|e| format!("Cannot create directory {}: {e}", path.display()).into())
}

/// Forwards stdin lines to the monitor loop, which polls without blocking.
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
