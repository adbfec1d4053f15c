//! Capture tests: payload validation, drawing rasterisation, and the
//! camera/upload fallback with stream release.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use fieldops::capture::{
    Camera, CameraStream, CaptureError, CaptureSource, Drawing, ImagePayload, MAX_DRAWING_POINTS,
    MAX_IMAGE_BYTES, MAX_STROKE_WIDTH, Point, StreamGuard, capture_with_fallback,
};
use common::*;

struct FakeStream {
    frame: Result<Vec<u8>, CaptureError>,
    stopped: Rc<Cell<u32>>,
}

impl CameraStream for FakeStream {
    fn grab_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.frame.clone()
    }

    fn stop(&mut self) {
        self.stopped.set(self.stopped.get() + 1);
    }
}

struct FakeCamera {
    open_result: Option<CaptureError>,
    frame: Result<Vec<u8>, CaptureError>,
    stopped: Rc<Cell<u32>>,
}

impl FakeCamera {
    fn working(frame: Vec<u8>) -> Self {
        Self { open_result: None, frame: Ok(frame), stopped: Rc::new(Cell::new(0)) }
    }

    fn failing(err: CaptureError) -> Self {
        Self { open_result: Some(err), frame: Ok(Vec::new()), stopped: Rc::new(Cell::new(0)) }
    }
}

impl Camera for FakeCamera {
    type Stream = FakeStream;

    fn open(&mut self) -> Result<FakeStream, CaptureError> {
        if let Some(err) = self.open_result.clone() {
            return Err(err);
        }
        Ok(FakeStream { frame: self.frame.clone(), stopped: Rc::clone(&self.stopped) })
    }
}

fn upload_png() -> Result<Vec<u8>, CaptureError> {
    Ok(png_bytes(3, 3))
}

#[test]
fn test_from_bytes_sniffs_png() {
    let payload = ImagePayload::from_bytes(&png_bytes(2, 2)).expect("payload");
    assert_eq!(payload.mime(), "image/png");
    assert!(payload.as_str().starts_with("data:image/png;base64,"));
    assert_eq!(payload.decode().expect("decode"), png_bytes(2, 2));
}

#[test]
fn test_from_bytes_rejects_empty_and_non_images() {
    assert_eq!(ImagePayload::from_bytes(&[]), Err(CaptureError::Empty));
    assert!(matches!(
        ImagePayload::from_bytes(b"just some text"),
        Err(CaptureError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_oversized_images_are_rejected() {
    let mut big = png_bytes(1, 1);
    big.resize(MAX_IMAGE_BYTES + 1, 0);
    assert_eq!(ImagePayload::from_bytes(&big), Err(CaptureError::TooLarge(MAX_IMAGE_BYTES + 1)));
}

#[test]
fn test_parse_normalises_declared_type() {
    // Declared as JPEG, but the bytes are PNG.
    let uri = png_data_uri(2, 2).replacen("image/png", "image/jpeg", 1);
    let payload = ImagePayload::parse(&uri).expect("parse");
    assert_eq!(payload.mime(), "image/png");
}

#[test]
fn test_parse_rejects_malformed_uris() {
    assert_eq!(ImagePayload::parse(""), Err(CaptureError::Empty));
    assert_eq!(ImagePayload::parse("http://example.com/a.png"), Err(CaptureError::NotDataUri));
    assert_eq!(ImagePayload::parse("data:image/png,rawdata"), Err(CaptureError::NotBase64));
    assert!(matches!(ImagePayload::parse("data:text/plain;base64,aGk="), Err(CaptureError::UnsupportedFormat(_))));
    assert!(matches!(ImagePayload::parse("data:image/png;base64,@@@"), Err(CaptureError::InvalidBase64(_))));
}

#[test]
fn test_payload_deserializes_only_when_valid() {
    let good = serde_json::json!(png_data_uri(1, 1));
    assert!(serde_json::from_value::<ImagePayload>(good).is_ok());
    assert!(serde_json::from_value::<ImagePayload>(serde_json::json!("nope")).is_err());
}

#[test]
fn test_drawing_renders_a_png_with_ink() {
    let drawing = Drawing {
        width: 40,
        height: 20,
        stroke_width: 3.0,
        strokes: vec![vec![Point { x: 2.0, y: 10.0 }, Point { x: 38.0, y: 10.0 }]],
    };

    let payload = drawing.render().expect("render");
    assert_eq!(payload.mime(), "image/png");

    let img = image::load_from_memory(&payload.decode().expect("decode")).expect("load").to_rgba8();
    assert_eq!(img.dimensions(), (40, 20));
    assert_eq!(img.get_pixel(20, 10).0, [0, 0, 0, 255]);
    assert_eq!(img.get_pixel(20, 1).0, [255, 255, 255, 255]);
}

#[test]
fn test_empty_drawing_is_rejected() {
    let drawing = Drawing { width: 10, height: 10, stroke_width: 3.0, strokes: vec![vec![]] };
    assert_eq!(drawing.render(), Err(CaptureError::Empty));
}

#[test]
fn test_canvas_bounds_are_enforced() {
    let drawing = Drawing {
        width: 0,
        height: 10,
        stroke_width: 3.0,
        strokes: vec![vec![Point { x: 1.0, y: 1.0 }]],
    };
    assert!(matches!(drawing.render(), Err(CaptureError::InvalidCanvas(_))));
}

#[test]
fn test_far_off_canvas_stroke_is_clipped() {
    let drawing = Drawing {
        width: 10,
        height: 10,
        stroke_width: 3.0,
        strokes: vec![vec![Point { x: 0.0, y: 5.0 }, Point { x: 1e12, y: 5.0 }]],
    };

    let payload = drawing.render().expect("render");
    let img = image::load_from_memory(&payload.decode().expect("decode")).expect("load").to_rgba8();
    assert_eq!(img.get_pixel(9, 5).0, [0, 0, 0, 255]);
    assert_eq!(img.get_pixel(5, 0).0, [255, 255, 255, 255]);

    let missed = Drawing {
        width: 10,
        height: 10,
        stroke_width: 3.0,
        strokes: vec![vec![Point { x: -1e12, y: -500.0 }, Point { x: 1e12, y: -500.0 }]],
    };
    let img = image::load_from_memory(&missed.render().expect("render").decode().expect("decode"))
        .expect("load")
        .to_rgba8();
    assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn test_drawing_rejects_unbounded_input() {
    let stroke = vec![vec![Point { x: 1.0, y: 1.0 }, Point { x: 5.0, y: 5.0 }]];

    for width in [0.0, -2.0, MAX_STROKE_WIDTH + 1.0, f32::NAN, f32::INFINITY] {
        let drawing = Drawing { width: 10, height: 10, stroke_width: width, strokes: stroke.clone() };
        assert!(matches!(drawing.render(), Err(CaptureError::InvalidCanvas(_))), "stroke width {width}");
    }

    let drawing = Drawing {
        width: 10,
        height: 10,
        stroke_width: 3.0,
        strokes: vec![vec![Point { x: f32::NAN, y: 1.0 }, Point { x: 5.0, y: 5.0 }]],
    };
    assert!(matches!(drawing.render(), Err(CaptureError::InvalidCanvas(_))));

    let drawing = Drawing {
        width: 10,
        height: 10,
        stroke_width: 3.0,
        strokes: vec![vec![Point { x: 1.0, y: 1.0 }; MAX_DRAWING_POINTS + 1]],
    };
    assert!(matches!(drawing.render(), Err(CaptureError::InvalidCanvas(_))));
}

#[test]
fn test_drawing_json_defaults_stroke_width() {
    let drawing: Drawing = serde_json::from_value(serde_json::json!({
        "width": 10,
        "height": 10,
        "strokes": [[{ "x": 1.0, "y": 1.0 }]],
    }))
    .expect("deserialize");
    assert_eq!(drawing.stroke_width, 3.0);
}

#[test]
fn test_stream_guard_stops_on_drop() {
    let stopped = Rc::new(Cell::new(0));
    {
        let mut guard = StreamGuard::new(FakeStream {
            frame: Err(CaptureError::Device("frame dropped".into())),
            stopped: Rc::clone(&stopped),
        });
        assert!(guard.grab_frame().is_err());
    }
    assert_eq!(stopped.get(), 1);
}

#[test]
fn test_camera_capture_releases_the_stream() {
    let mut camera = FakeCamera::working(png_bytes(4, 4));

    let captured = capture_with_fallback(Some(&mut camera), upload_png).expect("capture");

    assert_eq!(captured.source, CaptureSource::Camera);
    assert_eq!(camera.stopped.get(), 1);
}

#[test]
fn test_camera_frame_error_still_releases_the_stream() {
    let mut camera = FakeCamera::working(Vec::new());
    camera.frame = Err(CaptureError::Device("sensor fault".into()));

    let err = capture_with_fallback(Some(&mut camera), upload_png).unwrap_err();

    assert_eq!(err, CaptureError::Device("sensor fault".into()));
    assert_eq!(camera.stopped.get(), 1);
}

#[test]
fn test_permission_denied_falls_back_to_upload() {
    let mut camera = FakeCamera::failing(CaptureError::PermissionDenied);
    let captured = capture_with_fallback(Some(&mut camera), upload_png).expect("capture");
    assert_eq!(captured.source, CaptureSource::Upload);
}

#[test]
fn test_no_camera_uses_upload() {
    let captured = capture_with_fallback::<FakeCamera, _>(None, upload_png).expect("capture");
    assert_eq!(captured.source, CaptureSource::Upload);
}

#[test]
fn test_other_camera_errors_are_reported() {
    let mut camera = FakeCamera::failing(CaptureError::Device("busy".into()));
    let err = capture_with_fallback(Some(&mut camera), upload_png).unwrap_err();
    assert_eq!(err, CaptureError::Device("busy".into()));
}
