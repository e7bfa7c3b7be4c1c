/// Camera frame source backed by ffmpeg-next (libavdevice + libavcodec).
///
/// Local cameras are opened through the platform capture format (V4L2,
/// AVFoundation or DirectShow); stream URLs and recorded files are left to
/// libavformat's probing. Each decoded frame is converted to RGB24 and
/// wrapped in a [`Frame`].
use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, FrameSourceError};

/// libavdevice capture format for local cameras on this platform.
pub const PLATFORM_CAPTURE_FORMAT: Option<&str> = if cfg!(target_os = "linux") {
    Some("v4l2")
} else if cfg!(target_os = "macos") {
    Some("avfoundation")
} else if cfg!(target_os = "windows") {
    Some("dshow")
} else {
    None
};

/// First camera in the platform's device naming scheme.
pub const DEFAULT_DEVICE: &str = if cfg!(target_os = "macos") {
    "0"
} else if cfg!(target_os = "windows") {
    "video=Integrated Camera"
} else {
    "/dev/video0"
};

/// Picks the input format to force when opening `device`.
///
/// An explicit format always wins. URLs and existing files return `None` so
/// libavformat probes them; anything else is a local camera name.
pub fn resolve_input_format(device: &str, explicit: Option<&str>) -> Option<String> {
    if let Some(format) = explicit {
        return Some(format.to_string());
    }
    if device.contains("://") || Path::new(device).is_file() {
        return None;
    }
    PLATFORM_CAPTURE_FORMAT.map(str::to_string)
}

pub struct FfmpegCameraSource {
    device: String,
    size: Option<(u32, u32)>,
    input_format: Option<String>,
    camera: Option<OpenCamera>,
    frame_index: usize,
}

struct OpenCamera {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    stream_index: usize,
    draining: bool,
}

// Safety: the source is owned and driven by a single thread at a time.
// The raw pointers inside ffmpeg types are never shared.
unsafe impl Send for FfmpegCameraSource {}

impl FfmpegCameraSource {
    /// `size` is requested from capture devices; files and streams ignore it.
    pub fn new(device: impl Into<String>, size: Option<(u32, u32)>) -> Self {
        Self {
            device: device.into(),
            size,
            input_format: None,
            camera: None,
            frame_index: 0,
        }
    }

    /// Forces a libavdevice input format (e.g. `avfoundation`) instead of
    /// the platform default.
    pub fn with_input_format(mut self, format: impl Into<String>) -> Self {
        self.input_format = Some(format.into());
        self
    }

    fn open_input(
        &self,
        options: ffmpeg_next::Dictionary,
    ) -> Result<ffmpeg_next::format::context::Input, FrameSourceError> {
        let Some(name) = resolve_input_format(&self.device, self.input_format.as_deref()) else {
            return ffmpeg_next::format::input_with_dictionary(&self.device, options)
                .map_err(|e| self.unavailable(e));
        };
        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == name)
            .ok_or_else(|| self.unavailable(format!("capture format {name} is not available")))?;
        log::debug!("Opening {} with input format {name}", self.device);
        let ctx = ffmpeg_next::format::open_with(
            &self.device,
            &ffmpeg_next::format::Format::Input(format),
            options,
        )
        .map_err(|e| self.unavailable(e))?;
        Ok(ctx.input())
    }

    fn unavailable(&self, reason: impl ToString) -> FrameSourceError {
        FrameSourceError::DeviceUnavailable {
            device: self.device.clone(),
            reason: reason.to_string(),
        }
    }
}

impl FrameSource for FfmpegCameraSource {
    fn open(&mut self) -> Result<(), FrameSourceError> {
        ffmpeg_next::init().map_err(|e| self.unavailable(e))?;
        ffmpeg_next::device::register_all();

        let mut options = ffmpeg_next::Dictionary::new();
        if let Some((w, h)) = self.size {
            options.set("video_size", &format!("{w}x{h}"));
        }

        let ictx = self.open_input(options)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| self.unavailable("no video stream"))?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| self.unavailable(e))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| self.unavailable(e))?;

        log::info!(
            "Opened {} ({}x{})",
            self.device,
            decoder.width(),
            decoder.height()
        );

        self.camera = Some(OpenCamera {
            ictx,
            decoder,
            scaler: None,
            stream_index,
            draining: false,
        });
        self.frame_index = 0;
        Ok(())
    }

    fn read(&mut self) -> Result<Frame, FrameSourceError> {
        let camera = self.camera.as_mut().ok_or(FrameSourceError::NotOpened)?;

        loop {
            if let Some(pixels) = camera.try_receive()? {
                let (data, width, height) = pixels;
                let frame = Frame::new(data, width, height, 3, self.frame_index);
                self.frame_index += 1;
                return Ok(frame);
            }

            if camera.draining {
                return Err(FrameSourceError::Capture("end of stream".into()));
            }

            let Some((stream, packet)) = camera.ictx.packets().next() else {
                let _ = camera.decoder.send_eof();
                camera.draining = true;
                continue;
            };
            if stream.index() != camera.stream_index {
                continue;
            }
            if let Err(e) = camera.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
            }
        }
    }

    fn release(&mut self) {
        if self.camera.take().is_some() {
            log::info!("Released {}", self.device);
        }
    }
}

impl Drop for FfmpegCameraSource {
    fn drop(&mut self) {
        self.release();
    }
}

impl OpenCamera {
    /// Pulls one decoded frame, if the decoder has one ready.
    fn try_receive(&mut self) -> Result<Option<(Vec<u8>, u32, u32)>, FrameSourceError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let width = decoded.width();
        let height = decoded.height();
        let stale = self
            .scaler
            .as_ref()
            .map_or(true, |s| s.input().width != width || s.input().height != height);
        if stale {
            let scaler = ffmpeg_next::software::scaling::Context::get(
                decoded.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )
            .map_err(|e| FrameSourceError::Capture(e.to_string()))?;
            self.scaler = Some(scaler);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler
                .run(&decoded, &mut rgb_frame)
                .map_err(|e| FrameSourceError::Capture(e.to_string()))?;
        }

        Ok(Some((
            extract_rgb_pixels(&rgb_frame, width, height),
            width,
            height,
        )))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may pad each row (stride > width*3); the padding is dropped.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
