//! Image, photo and signature capture.
//!
//! Every capture path ends in an [`ImagePayload`]: a validated
//! `data:image/...;base64,` URI that the forms store as an opaque string.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_CANVAS_SIDE: u32 = 4096;
pub const MAX_STROKE_WIDTH: f32 = 64.0;
pub const MAX_DRAWING_POINTS: usize = 50_000;

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    Empty,
    TooLarge(usize),
    NotDataUri,
    NotBase64,
    InvalidBase64(String),
    UnsupportedFormat(String),
    InvalidCanvas(String),
    Encode(String),
    PermissionDenied,
    NoDevice,
    Device(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Empty => write!(f, "No image was captured"),
            CaptureError::TooLarge(n) => {
                write!(f, "Image is too large ({n} bytes, limit {MAX_IMAGE_BYTES})")
            }
            CaptureError::NotDataUri => write!(f, "Image is not a data URI"),
            CaptureError::NotBase64 => write!(f, "Image data URI is not base64 encoded"),
            CaptureError::InvalidBase64(e) => write!(f, "Image data is not valid base64: {e}"),
            CaptureError::UnsupportedFormat(fmt) => write!(f, "Unsupported image format: {fmt}"),
            CaptureError::InvalidCanvas(e) => write!(f, "Invalid drawing: {e}"),
            CaptureError::Encode(e) => write!(f, "Could not encode image: {e}"),
            CaptureError::PermissionDenied => write!(f, "Camera permission was denied"),
            CaptureError::NoDevice => write!(f, "No camera is available"),
            CaptureError::Device(e) => write!(f, "Camera error: {e}"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// A validated, normalised image data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Build a payload from raw image bytes; the format is sniffed from the
    /// content, not taken from any declared type.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CaptureError> {
        if bytes.is_empty() {
            return Err(CaptureError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(CaptureError::TooLarge(bytes.len()));
        }
        let format = image::guess_format(bytes)
            .map_err(|_| CaptureError::UnsupportedFormat("unknown".to_string()))?;
        let mime = match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            other => return Err(CaptureError::UnsupportedFormat(format!("{other:?}"))),
        };
        Ok(Self(format!("data:{mime};base64,{}", B64.encode(bytes))))
    }

    /// Validate and normalise a data URI produced by a browser canvas or
    /// file reader.
    pub fn parse(uri: &str) -> Result<Self, CaptureError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(CaptureError::Empty);
        }
        let rest = uri.strip_prefix("data:").ok_or(CaptureError::NotDataUri)?;
        let (meta, data) = rest.split_once(',').ok_or(CaptureError::NotDataUri)?;
        let mime = meta.strip_suffix(";base64").ok_or(CaptureError::NotBase64)?;
        if !mime.starts_with("image/") {
            return Err(CaptureError::UnsupportedFormat(mime.to_string()));
        }
        let bytes = B64
            .decode(data.as_bytes())
            .map_err(|e| CaptureError::InvalidBase64(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn mime(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime)
            .unwrap_or("")
    }

    pub fn decode(&self) -> Result<Vec<u8>, CaptureError> {
        let (_, data) = self.0.split_once(',').ok_or(CaptureError::NotDataUri)?;
        B64.decode(data.as_bytes())
            .map_err(|e| CaptureError::InvalidBase64(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ImagePayload {
    type Error = CaptureError;

    fn try_from(uri: String) -> Result<Self, Self::Error> {
        ImagePayload::parse(&uri)
    }
}

impl From<ImagePayload> for String {
    fn from(payload: ImagePayload) -> Self {
        payload.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

fn default_stroke_width() -> f32 {
    3.0
}

/// Freehand drawing from a signature pad or sketch canvas.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    pub strokes: Vec<Vec<Point>>,
}

impl Drawing {
    /// Rasterise the strokes in black on a white canvas and encode as PNG.
    pub fn render(&self) -> Result<ImagePayload, CaptureError> {
        if self.width == 0 || self.height == 0 || self.width > MAX_CANVAS_SIDE || self.height > MAX_CANVAS_SIDE {
            return Err(CaptureError::InvalidCanvas(format!(
                "canvas must be between 1x1 and {MAX_CANVAS_SIDE}x{MAX_CANVAS_SIDE}"
            )));
        }
        if self.strokes.iter().all(|s| s.is_empty()) {
            return Err(CaptureError::Empty);
        }
        if !self.stroke_width.is_finite() || self.stroke_width <= 0.0 || self.stroke_width > MAX_STROKE_WIDTH {
            return Err(CaptureError::InvalidCanvas(format!(
                "stroke width must be greater than 0 and at most {MAX_STROKE_WIDTH}"
            )));
        }
        let points: usize = self.strokes.iter().map(Vec::len).sum();
        if points > MAX_DRAWING_POINTS {
            return Err(CaptureError::InvalidCanvas(format!(
                "{points} points exceeds the limit of {MAX_DRAWING_POINTS}"
            )));
        }
        if self.strokes.iter().flatten().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(CaptureError::InvalidCanvas("coordinates must be finite numbers".to_string()));
        }

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, Rgba([255, 255, 255, 255]));
        let radius = (self.stroke_width / 2.0).max(0.5);

        for stroke in &self.strokes {
            match stroke.as_slice() {
                [] => {}
                [only] => stamp(&mut canvas, only.x, only.y, radius),
                points => {
                    for pair in points.windows(2) {
                        segment(&mut canvas, pair[0], pair[1], radius);
                    }
                }
            }
        }

        let mut png = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        ImagePayload::from_bytes(&png)
    }
}

fn stamp(canvas: &mut RgbaImage, cx: f32, cy: f32, radius: f32) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    let r = radius.ceil() as i64;
    let (cxi, cyi) = (cx.round() as i64, cy.round() as i64);
    for y in (cyi - r)..=(cyi + r) {
        for x in (cxi - r)..=(cxi + r) {
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let (dx, dy) = (x as f32 - cx, y as f32 - cy);
            if dx * dx + dy * dy <= radius * radius {
                canvas.put_pixel(x as u32, y as u32, Rgba([0, 0, 0, 255]));
            }
        }
    }
}

/// Clip `a..b` to the canvas grown by `margin` on every side (Liang-Barsky).
/// Returns `None` when no part of the segment can touch a pixel.
fn clip_segment(a: Point, b: Point, width: f32, height: f32, margin: f32) -> Option<(Point, Point)> {
    let (x0, y0) = (a.x as f64, a.y as f64);
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let (min_x, max_x) = (-margin as f64, (width + margin) as f64);
    let (min_y, max_y) = (-margin as f64, (height + margin) as f64);

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x0 - min_x), (dx, max_x - x0), (-dy, y0 - min_y), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| Point { x: (x0 + dx * t) as f32, y: (y0 + dy * t) as f32 };
    Some((at(t0), at(t1)))
}

fn segment(canvas: &mut RgbaImage, a: Point, b: Point, radius: f32) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let Some((a, b)) = clip_segment(a, b, w, h, radius + 1.0) else {
        return;
    };
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length = (dx * dx + dy * dy).sqrt();
    let steps = (length / 0.5).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp(canvas, a.x + dx * t, a.y + dy * t, radius);
    }
}

/// A live camera stream. `stop` releases the device.
pub trait CameraStream {
    fn grab_frame(&mut self) -> Result<Vec<u8>, CaptureError>;
    fn stop(&mut self);
}

pub trait Camera {
    type Stream: CameraStream;

    fn open(&mut self) -> Result<Self::Stream, CaptureError>;
}

/// Stops the wrapped stream when dropped, on success, error or early return.
pub struct StreamGuard<S: CameraStream> {
    stream: S,
}

impl<S: CameraStream> StreamGuard<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn grab_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.stream.grab_frame()
    }
}

impl<S: CameraStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.stream.stop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    Camera,
    Upload,
    Drawing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Captured {
    pub payload: ImagePayload,
    pub source: CaptureSource,
}

/// Capture from the camera when one is available and permitted, otherwise
/// fall back to the upload path.
pub fn capture_with_fallback<C, U>(camera: Option<&mut C>, upload: U) -> Result<Captured, CaptureError>
where
    C: Camera,
    U: FnOnce() -> Result<Vec<u8>, CaptureError>,
{
    if let Some(camera) = camera {
        match camera.open() {
            Ok(stream) => {
                let mut guard = StreamGuard::new(stream);
                let frame = guard.grab_frame()?;
                drop(guard);
                return Ok(Captured {
                    payload: ImagePayload::from_bytes(&frame)?,
                    source: CaptureSource::Camera,
                });
            }
            Err(e @ (CaptureError::PermissionDenied | CaptureError::NoDevice)) => {
                log::warn!("Camera unavailable ({e}), falling back to upload");
            }
            Err(e) => return Err(e),
        }
    }

    let bytes = upload()?;
    Ok(Captured {
        payload: ImagePayload::from_bytes(&bytes)?,
        source: CaptureSource::Upload,
    })
}
