use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::alerting::domain::alert_policy::AlertPolicy;
use crate::alerting::domain::alert_sink::AlertSink;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::detection::domain::target_classes::TargetClasses;
use crate::enrollment::enrollment_flow::{CaptureOutcome, EnrollmentFlow, EnrollmentState};
use crate::recognition::domain::authorization_gate::{Authorization, AuthorizationGate};
use crate::recognition::domain::face_matcher::FaceMatcher;
use crate::recognition::domain::identity_gallery::IdentityGallery;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::image_writer::ImageWriter;

use super::pipeline_logger::PipelineLogger;

/// What happened on one monitored frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub frame_index: usize,
    /// `None` when face recognition is disabled.
    pub authorization: Option<Authorization>,
    pub detections: Vec<Detection>,
    /// Snapshot paths of the alerts fired on this frame.
    pub alerts: Vec<PathBuf>,
}

impl FrameReport {
    pub fn authorized_present(&self) -> bool {
        self.authorization
            .as_ref()
            .is_some_and(Authorization::is_authorized)
    }
}

/// Totals for one `run`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: usize,
    pub alerts: usize,
    pub enrolled: usize,
}

/// The frame loop: authorize, detect, decide, alert.
///
/// Operator lines arrive on a channel and are polled once per frame, so the
/// loop never blocks on input. While an enrollment is in progress frames are
/// still read (keeping the camera drained) but not monitored.
pub struct MonitorUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn ObjectDetector>,
    targets: TargetClasses,
    matcher: Option<FaceMatcher>,
    gallery: IdentityGallery,
    gate: AuthorizationGate,
    policy: AlertPolicy,
    sink: AlertSink,
    image_writer: Box<dyn ImageWriter>,
    authorized_dir: PathBuf,
    mirror: bool,
    logger: Box<dyn PipelineLogger>,
    enrollment: Option<EnrollmentFlow>,
    summary: RunSummary,
}

impl MonitorUseCase {
    /// `matcher` is `None` when face recognition is disabled; every frame is
    /// then treated as having no authorized person.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn ObjectDetector>,
        targets: TargetClasses,
        matcher: Option<FaceMatcher>,
        gallery: IdentityGallery,
        gate: AuthorizationGate,
        policy: AlertPolicy,
        sink: AlertSink,
        image_writer: Box<dyn ImageWriter>,
        authorized_dir: PathBuf,
        mirror: bool,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            source,
            detector,
            targets,
            matcher,
            gallery,
            gate,
            policy,
            sink,
            image_writer,
            authorized_dir,
            mirror,
            logger,
            enrollment: None,
            summary: RunSummary::default(),
        }
    }

    pub fn gallery(&self) -> &IdentityGallery {
        &self.gallery
    }

    pub fn enrollment(&self) -> Option<&EnrollmentFlow> {
        self.enrollment.as_ref()
    }

    /// Opens the source and monitors until the operator quits or a frame
    /// cannot be read. The source is released on every path out.
    pub fn run(&mut self, input: &Receiver<String>) -> Result<RunSummary, Box<dyn std::error::Error>> {
        if let Err(e) = self.source.open() {
            self.source.release();
            return Err(e.into());
        }
        self.logger
            .info("Farm security monitor started. Commands: 'a' add authorized user, 'q' quit");
        self.summary = RunSummary::default();

        loop {
            let raw = match self.source.read() {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Stopping: {e}");
                    break;
                }
            };
            let frame = self.prepare(raw);

            if self.enrollment.is_none() {
                self.process_frame(&frame);
            }

            match input.try_recv() {
                Ok(line) => {
                    if self.handle_input(&line, &frame).is_break() {
                        break;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
            }
        }

        self.source.release();
        self.logger.summary();
        log::info!(
            "Monitor stopped after {} frames, {} alerts",
            self.summary.frames,
            self.summary.alerts
        );
        Ok(self.summary)
    }

    fn prepare(&self, raw: Frame) -> Frame {
        if self.mirror {
            raw.mirrored()
        } else {
            raw
        }
    }

    /// Runs one monitored frame through authorization, detection and the
    /// alert policy. Collaborator failures are logged and the frame goes on
    /// with a safe default (not authorized, no detections).
    pub fn process_frame(&mut self, frame: &Frame) -> FrameReport {
        let mut report = FrameReport {
            frame_index: frame.index(),
            ..Default::default()
        };

        if let Some(matcher) = self.matcher.as_mut() {
            let t0 = Instant::now();
            let outcome = match self.gate.check(frame, &self.gallery, matcher) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("Authorization check failed: {e}");
                    Authorization::NoMatch
                }
            };
            self.logger
                .timing("authorize", t0.elapsed().as_secs_f64() * 1000.0);
            report.authorization = Some(outcome);
        }
        let authorized_present = report.authorized_present();

        let t0 = Instant::now();
        report.detections = match self.detector.infer(frame) {
            Ok(raw) => self.targets.classify_all(&raw),
            Err(e) => {
                log::warn!("Object detection failed: {e}");
                Vec::new()
            }
        };
        self.logger
            .timing("detect", t0.elapsed().as_secs_f64() * 1000.0);

        let t0 = Instant::now();
        for detection in &report.detections {
            if !self.policy.should_alert(detection, authorized_present) {
                continue;
            }
            let at = self
                .policy
                .state()
                .last_alert_time
                .unwrap_or_else(chrono::Local::now);
            self.summary.alerts += 1;
            match self.sink.fire(detection, frame, at) {
                Ok(path) => report.alerts.push(path),
                Err(e) => log::warn!("Could not save detection image: {e}"),
            }
        }
        self.logger
            .timing("alert", t0.elapsed().as_secs_f64() * 1000.0);

        self.summary.frames += 1;
        self.logger
            .metric("detections", report.detections.len() as f64);
        self.logger.metric("alerts", report.alerts.len() as f64);
        self.logger.progress(self.summary.frames);
        report
    }

    /// Applies one operator line to the current mode.
    pub fn handle_input(&mut self, line: &str, frame: &Frame) -> ControlFlow<()> {
        let command = line.trim();
        if self.enrollment.is_none() {
            return self.handle_monitor_command(command);
        }

        let awaiting_capture = self
            .enrollment
            .as_ref()
            .is_some_and(|flow| *flow.state() == EnrollmentState::AwaitingCapture);
        if awaiting_capture {
            match command {
                "q" => {
                    if let Some(flow) = self.enrollment.as_mut() {
                        let _ = flow.cancel();
                    }
                }
                "c" => self.capture_face(frame),
                other => log::debug!("Ignoring {other:?} during enrollment"),
            }
        } else if let Some(flow) = self.enrollment.as_mut() {
            match flow.submit_name(line, &mut self.gallery, self.image_writer.as_ref()) {
                Ok(_) => self.summary.enrolled += 1,
                Err(e) => log::warn!("Could not enroll: {e}"),
            }
        }

        if let Some(saved) = self.enrollment.as_ref().and_then(EnrollmentFlow::outcome) {
            let message = if saved {
                "Authorized user added, resuming monitoring"
            } else {
                "Enrollment cancelled, resuming monitoring"
            };
            self.logger.info(message);
            self.enrollment = None;
        }
        ControlFlow::Continue(())
    }

    fn handle_monitor_command(&mut self, command: &str) -> ControlFlow<()> {
        match command {
            "q" => {
                self.logger.info("Quit requested");
                return ControlFlow::Break(());
            }
            "a" => self.start_enrollment(),
            "" => {}
            other => log::debug!("Ignoring unknown command {other:?}"),
        }
        ControlFlow::Continue(())
    }

    fn capture_face(&mut self, frame: &Frame) {
        let (Some(flow), Some(matcher)) = (self.enrollment.as_mut(), self.matcher.as_mut()) else {
            return;
        };
        match flow.capture(frame, matcher) {
            Ok(CaptureOutcome::NoFace) => self.logger.info("No face detected. Please try again."),
            Ok(CaptureOutcome::FaceCaptured(_)) => {
                self.logger.info("Face captured. Enter a name for this user:")
            }
            Err(e) => log::warn!("Capture failed: {e}"),
        }
    }

    fn start_enrollment(&mut self) {
        if self.matcher.is_none() {
            log::warn!("Face recognition is disabled; cannot add authorized users");
            return;
        }
        self.enrollment = Some(EnrollmentFlow::new(self.authorized_dir.clone()));
        self.logger
            .info("Adding authorized user. Commands: 'c' capture face, 'q' cancel");
    }
}
