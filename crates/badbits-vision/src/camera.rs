//! Webcam acquisition with retry and reconnection.
//!
//! [`FrameSource`] owns exactly one open [`CameraDevice`] at a time. Each
//! [`FrameSource::capture`] makes up to [`CAPTURE_ATTEMPTS`] reads; whenever
//! the device reports closed it walks the candidate ids (primary first, then
//! backups) to reconnect. The device is released when the source is dropped.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use badbits_core::error::{BadbitsError, Result};
use image::{ImageFormat, RgbImage};
use tracing::{debug, info, warn};

pub const CAPTURE_ATTEMPTS: u32 = 3;

/// Ids scanned when diagnosing a failed capture.
pub const SCAN_RANGE: std::ops::Range<i32> = 0..5;

// ── Seams ─────────────────────────────────────────────────────────────────────

pub trait CameraDevice {
    fn is_open(&self) -> bool;
    fn read(&mut self) -> Result<RgbImage>;
}

pub trait CameraBackend {
    type Device: CameraDevice;

    fn open(&self, id: i32) -> Result<Self::Device>;

    /// Whether an opened device reporting open means a camera is attached.
    /// When false, [`scan_available`] reports nothing.
    fn detects_presence(&self) -> bool {
        true
    }
}

/// Ids in [`SCAN_RANGE`] that can currently be opened.
pub fn scan_available<B: CameraBackend>(backend: &B) -> Vec<i32> {
    if !backend.detects_presence() {
        return Vec::new();
    }
    SCAN_RANGE
        .filter(|id| backend.open(*id).map(|d| d.is_open()).unwrap_or(false))
        .collect()
}

// ── FrameSource ───────────────────────────────────────────────────────────────

pub struct FrameSource<B: CameraBackend> {
    backend: B,
    candidates: Vec<i32>,
    device: Option<B::Device>,
    active_id: Option<i32>,
    retry_delay: Duration,
}

impl<B: CameraBackend> FrameSource<B> {
    /// Open the first candidate that works.
    pub fn open(backend: B, candidates: Vec<i32>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(BadbitsError::Config("no camera ids given".to_string()));
        }
        let mut source = Self {
            backend,
            candidates,
            device: None,
            active_id: None,
            retry_delay: Duration::from_secs(1),
        };
        if !source.reconnect() {
            return Err(source.unavailable());
        }
        Ok(source)
    }

    /// Pause between failed attempts; zero disables sleeping.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn active_id(&self) -> Option<i32> {
        self.active_id
    }

    pub fn candidates(&self) -> &[i32] {
        &self.candidates
    }

    /// Grab one frame, reconnecting through the candidates as needed.
    pub fn capture(&mut self) -> Result<RgbImage> {
        for attempt in 1..=CAPTURE_ATTEMPTS {
            if !self.device.as_ref().is_some_and(|d| d.is_open()) {
                warn!(attempt, "camera connection lost, reconnecting");
                self.reconnect();
            }

            if let Some(device) = self.device.as_mut() {
                match device.read() {
                    Ok(frame) => return Ok(frame),
                    Err(e) => warn!(attempt, camera_id = ?self.active_id, error = %e, "frame capture failed"),
                }
            }

            if attempt < CAPTURE_ATTEMPTS && !self.retry_delay.is_zero() {
                std::thread::sleep(self.retry_delay);
            }
        }
        Err(self.unavailable())
    }

    /// Drop the current device and open the first candidate that reports
    /// open. Returns whether one did.
    fn reconnect(&mut self) -> bool {
        self.device = None;
        self.active_id = None;

        for &id in &self.candidates {
            debug!(camera_id = id, "trying camera");
            match self.backend.open(id) {
                Ok(device) if device.is_open() => {
                    info!(camera_id = id, "camera connected");
                    self.device = Some(device);
                    self.active_id = Some(id);
                    return true;
                }
                Ok(_) => debug!(camera_id = id, "camera did not open"),
                Err(e) => debug!(camera_id = id, error = %e, "camera open failed"),
            }
        }
        false
    }

    fn unavailable(&self) -> BadbitsError {
        BadbitsError::DeviceUnavailable {
            candidates: self.candidates.clone(),
            available: scan_available(&self.backend),
        }
    }
}

impl<B: CameraBackend> Drop for FrameSource<B> {
    fn drop(&mut self) {
        if self.device.take().is_some() {
            debug!(camera_id = ?self.active_id, "camera released");
        }
    }
}

// ── FfmpegCamera ──────────────────────────────────────────────────────────────

/// Grabs single frames by running `ffmpeg` against the platform capture API.
#[derive(Debug, Clone)]
pub struct FfmpegCamera {
    program: String,
    os: &'static str,
}

impl Default for FfmpegCamera {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegCamera {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            os: std::env::consts::OS,
        }
    }

    /// Target a specific platform's capture API instead of the host's.
    pub fn for_os(mut self, os: &'static str) -> Self {
        self.os = os;
        self
    }
}

#[derive(Debug)]
pub struct FfmpegDevice {
    program: String,
    format: &'static str,
    input: String,
}

impl CameraBackend for FfmpegCamera {
    type Device = FfmpegDevice;

    fn open(&self, id: i32) -> Result<FfmpegDevice> {
        if id < 0 {
            return Err(BadbitsError::Capture(format!("invalid camera id {id}")));
        }
        let (format, input) = match self.os {
            "linux" => ("v4l2", format!("/dev/video{id}")),
            "macos" => ("avfoundation", format!("{id}:none")),
            other => {
                return Err(BadbitsError::Capture(format!(
                    "camera capture is not supported on {other}"
                )))
            }
        };
        let device = FfmpegDevice {
            program: self.program.clone(),
            format,
            input,
        };
        if !device.is_open() {
            return Err(BadbitsError::Capture(format!(
                "camera {id} not found at {}",
                device.input
            )));
        }
        Ok(device)
    }

    /// Only v4l2 exposes device nodes; avfoundation ids cannot be checked
    /// without starting a capture.
    fn detects_presence(&self) -> bool {
        self.os == "linux"
    }
}

impl CameraDevice for FfmpegDevice {
    fn is_open(&self) -> bool {
        match self.format {
            "v4l2" => Path::new(&self.input).exists(),
            _ => true,
        }
    }

    fn read(&mut self) -> Result<RgbImage> {
        let output = Command::new(&self.program)
            .args(["-hide_banner", "-loglevel", "error", "-f", self.format])
            .args(["-i", &self.input])
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| BadbitsError::Capture(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BadbitsError::Capture(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        decode_frame(&output.stdout)
    }
}

/// Decode one PNG frame into RGB.
pub fn decode_frame(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(BadbitsError::Capture("camera returned an empty frame".to_string()));
    }
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| BadbitsError::Capture(format!("could not decode frame: {e}")))?;
    Ok(img.to_rgb8())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
