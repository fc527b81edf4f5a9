//! End-to-end capture tests: compose → capture → restore → save.
//!
//! These run fully offline. Photos are generated in memory; remote origins
//! are simulated by tagging a `RasterImage` as remote.

use image::{ImageFormat, Rgba, RgbaImage};
use std::cell::Cell;
use std::future::Future;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::task::{Context, Waker};
use vintage_newsprint::{
    capture, transform, CaptureError, CaptureObserver, CaptureOptions, Capturer, Color,
    DirectoryDownloads, DisplayList, Geometry, ImageOrigin, MemoryDownloads, NewspaperSurface,
    ObserverRef, RasterImage, Rect, SavedArtifact, Surface, Transform, CAPTURE_FAILED_NOTICE,
};

// ── Helpers ──────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Surface whose layout is scripted by the test.
struct ScriptedSurface {
    geometry: Geometry,
    list: DisplayList,
    name: Option<String>,
    seen_at_layout: Cell<Option<Geometry>>,
}

impl ScriptedSurface {
    fn new(list: DisplayList) -> Self {
        Self {
            geometry: Geometry::default(),
            list,
            name: None,
            seen_at_layout: Cell::new(None),
        }
    }
}

impl Surface for ScriptedSurface {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
    }

    fn layout(&self) -> DisplayList {
        self.seen_at_layout.set(Some(self.geometry));
        let mut list = self.list.clone();
        if let Some(w) = self.geometry.width {
            list.width = w;
        }
        list
    }

    fn suggested_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Default)]
struct RecordingObserver {
    starts: Mutex<usize>,
    saved: Mutex<Vec<SavedArtifact>>,
    notices: Mutex<Vec<String>>,
}

impl CaptureObserver for RecordingObserver {
    fn on_capture_start(&self) {
        *self.starts.lock().unwrap() += 1;
    }

    fn on_capture_complete(&self, saved: &SavedArtifact) {
        self.saved.lock().unwrap().push(saved.clone());
    }

    fn on_capture_failed(&self, notice: &str) {
        self.notices.lock().unwrap().push(notice.to_string());
    }
}

fn options(scale: f32) -> CaptureOptions {
    CaptureOptions::builder().scale(scale).build().unwrap()
}

fn photo(origin: ImageOrigin) -> RasterImage {
    RasterImage::new(RgbaImage::from_pixel(40, 30, Rgba([90, 90, 90, 255])), origin).unwrap()
}

fn decode_png(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .expect("artifact must be a valid PNG")
        .to_rgba8()
}

// ── Preprocessing ────────────────────────────────────────────────────────

#[test]
fn solid_photo_becomes_uniform_sepia() {
    let src = RgbaImage::from_pixel(4, 4, Rgba([200, 100, 50, 255]));
    let mut bytes = Vec::new();
    src.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();

    let out = transform(&bytes).unwrap();
    assert_eq!(out.dimensions(), (4, 4));
    assert!(out
        .pixels()
        .pixels()
        .all(|p| p.0 == [116, 110, 98, 255]));
}

// ── Capture ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn page_without_photo_exports_valid_png() {
    init_tracing();
    let mut page = NewspaperSurface::new();
    let downloads = MemoryDownloads::new();

    let saved = Capturer::new()
        .download(&mut page, &options(3.0), &downloads)
        .await
        .unwrap();

    assert_eq!(saved.file_name, "BijoyBarta-71.png");
    assert_eq!(saved.width, 1650);
    let files = downloads.files();
    assert_eq!(files.len(), 1);
    let png = decode_png(&files[0].1);
    assert_eq!(png.width(), 1650);
    assert_eq!(png.height(), saved.height);
    assert!(png.height() >= 2100, "minimum page height is 700 css px");
}

#[tokio::test]
async fn display_scale_does_not_leak_into_export() {
    let mut page = NewspaperSurface::new();
    page.set_reporter(Some("রহিম"));
    let on_screen = Geometry::scaled(0.65);
    page.set_geometry(on_screen);

    let artifact = capture(&mut page, &options(2.0)).await.unwrap();

    assert_eq!(artifact.width(), 1100);
    assert_eq!(artifact.file_name(), "BijoyBarta-রহিম.png");
    assert_eq!(page.geometry(), on_screen);
    assert_eq!(decode_png(artifact.png()).width(), 1100);
}

#[tokio::test]
async fn tainted_photo_fails_once_and_saves_nothing() {
    init_tracing();
    let mut page = NewspaperSurface::new();
    page.set_photo(Some(photo(ImageOrigin::Remote {
        url: "https://photos.example.org/p.jpg".into(),
        cors_granted: false,
    })));
    let on_screen = Geometry::scaled(0.8);
    page.set_geometry(on_screen);

    let observer = Arc::new(RecordingObserver::default());
    let capturer = Capturer::new().with_observer(observer.clone() as ObserverRef);
    let downloads = MemoryDownloads::new();

    let err = capturer
        .download(&mut page, &options(3.0), &downloads)
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::TaintedImage { .. }));
    assert_eq!(
        *observer.notices.lock().unwrap(),
        vec![CAPTURE_FAILED_NOTICE.to_string()]
    );
    assert!(observer.saved.lock().unwrap().is_empty());
    assert!(downloads.is_empty());
    assert_eq!(page.geometry(), on_screen);
    assert!(!capturer.is_busy());
}

#[tokio::test]
async fn granted_photo_is_exported() {
    let mut page = NewspaperSurface::new();
    page.set_photo(Some(photo(ImageOrigin::Remote {
        url: "https://photos.example.org/p.jpg".into(),
        cors_granted: true,
    })));

    let artifact = capture(&mut page, &options(1.0)).await.unwrap();
    assert_eq!(artifact.width(), 550);
}

#[tokio::test]
async fn layout_sees_canonical_geometry_and_odd_geometry_is_restored() {
    let mut list = DisplayList::new(550.0, 200.0);
    list.fill(Rect::new(10.0, 10.0, 100.0, 20.0), Color::BLACK);
    let mut surface = ScriptedSurface::new(list);
    let original = Geometry {
        transform: Some(Transform::Scale(0.5)),
        width: Some(300.0),
        margin: Some(12.0),
    };
    surface.set_geometry(original);

    let artifact = capture(&mut surface, &options(1.0)).await.unwrap();

    assert_eq!(surface.seen_at_layout.get(), Some(Geometry::canonical()));
    assert_eq!(surface.geometry(), original);
    assert_eq!((artifact.width(), artifact.height()), (550, 200));
}

#[tokio::test]
async fn dropping_capture_mid_flight_restores_geometry() {
    let mut page = NewspaperSurface::new();
    let on_screen = Geometry::scaled(0.65);
    page.set_geometry(on_screen);
    let opts = options(3.0);

    let mut pending = Box::pin(capture(&mut page, &opts));
    let mut cx = Context::from_waker(Waker::noop());
    assert!(pending.as_mut().poll(&mut cx).is_pending());
    drop(pending);

    assert_eq!(page.geometry(), on_screen);
}

#[tokio::test]
async fn dropping_download_mid_flight_frees_the_capturer() {
    let mut page = NewspaperSurface::new();
    let on_screen = Geometry::scaled(0.65);
    page.set_geometry(on_screen);
    let capturer = Capturer::new();
    let downloads = MemoryDownloads::new();
    let opts = options(3.0);

    let mut pending = Box::pin(capturer.download(&mut page, &opts, &downloads));
    let mut cx = Context::from_waker(Waker::noop());
    assert!(pending.as_mut().poll(&mut cx).is_pending());
    assert!(capturer.is_busy());
    drop(pending);

    assert!(!capturer.is_busy());
    assert_eq!(page.geometry(), on_screen);
    assert!(downloads.is_empty());
}

#[tokio::test]
async fn empty_surface_fails_and_restores() {
    let mut surface = ScriptedSurface::new(DisplayList::new(550.0, 0.0));
    let original = Geometry::scaled(0.5);
    surface.set_geometry(original);

    let err = capture(&mut surface, &options(3.0)).await.unwrap_err();
    assert!(matches!(err, CaptureError::EmptySurface { .. }));
    assert_eq!(surface.geometry(), original);
}

#[tokio::test]
async fn invalid_options_leave_surface_untouched() {
    let mut surface = ScriptedSurface::new(DisplayList::new(10.0, 10.0));
    let mut opts = CaptureOptions::default();
    opts.scale = 0.0;

    let err = capture(&mut surface, &opts).await.unwrap_err();
    assert!(matches!(err, CaptureError::InvalidOptions(_)));
    assert!(surface.seen_at_layout.get().is_none());
    assert_eq!(surface.geometry(), Geometry::default());
}

#[tokio::test]
async fn capture_is_deterministic() {
    let mut page = NewspaperSurface::new()
        .with_today(chrono::NaiveDate::from_ymd_opt(2025, 12, 16).unwrap());
    page.set_headline("বিজয়");
    let a = capture(&mut page, &options(1.0)).await.unwrap();
    let b = capture(&mut page, &options(1.0)).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn different_headlines_render_different_pixels() {
    let render = |headline: &'static str, reporter: &'static str| async move {
        let mut page = NewspaperSurface::new()
            .with_today(chrono::NaiveDate::from_ymd_opt(2025, 12, 16).unwrap());
        page.set_headline(headline);
        page.set_reporter(Some(reporter));
        let artifact = capture(&mut page, &options(1.0)).await.unwrap();
        decode_png(artifact.png())
    };

    let a = render("কখগ", "Karim").await;
    let b = render("গখক", "Rahim").await;
    assert_eq!(a.dimensions(), b.dimensions());
    assert_ne!(a.as_raw(), b.as_raw());
}

#[tokio::test]
async fn latin_headline_changes_the_headline_band_only() {
    let render = |headline: &'static str| async move {
        let mut page = NewspaperSurface::new()
            .with_today(chrono::NaiveDate::from_ymd_opt(2025, 12, 16).unwrap());
        page.set_headline(headline);
        let artifact = capture(&mut page, &options(1.0)).await.unwrap();
        decode_png(artifact.png())
    };

    let a = render("Victory").await;
    let b = render("Freedom").await;
    assert_eq!(a.dimensions(), b.dimensions());
    let differing_rows: Vec<u32> = (0..a.height())
        .filter(|&y| (0..a.width()).any(|x| a.get_pixel(x, y) != b.get_pixel(x, y)))
        .collect();
    assert!(!differing_rows.is_empty());
    // Masthead and footer are identical.
    assert!(differing_rows[0] > 100);
    assert!(*differing_rows.last().unwrap() < a.height() - 100);
}

#[tokio::test]
async fn reporter_name_is_sanitized_into_file_name() {
    let mut surface = ScriptedSurface::new(DisplayList::new(20.0, 20.0));
    surface.name = Some("../আমার  নাম".into());
    let artifact = capture(&mut surface, &options(1.0)).await.unwrap();
    assert_eq!(artifact.file_name(), "BijoyBarta-_আমার-নাম.png");
}

#[tokio::test]
async fn overlapping_download_is_rejected_without_notice() {
    init_tracing();
    let mut first = NewspaperSurface::new();
    let mut second = NewspaperSurface::new();
    let observer = Arc::new(RecordingObserver::default());
    let capturer = Capturer::new().with_observer(observer.clone() as ObserverRef);
    let downloads = MemoryDownloads::new();
    let opts = options(3.0);

    let (a, b) = tokio::join!(
        capturer.download(&mut first, &opts, &downloads),
        capturer.download(&mut second, &opts, &downloads),
    );

    assert!(a.is_ok());
    assert!(matches!(b, Err(CaptureError::CaptureInProgress)));
    assert_eq!(*observer.starts.lock().unwrap(), 1);
    assert!(observer.notices.lock().unwrap().is_empty());
    assert_eq!(downloads.len(), 1);
    assert!(!capturer.is_busy());
}

#[tokio::test]
async fn save_failure_reports_one_notice() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();
    let mut page = NewspaperSurface::new();
    let observer = Arc::new(RecordingObserver::default());
    let capturer = Capturer::new().with_observer(observer.clone() as ObserverRef);

    let err = capturer
        .download(
            &mut page,
            &options(1.0),
            &DirectoryDownloads::new(blocker.join("sub")),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::SaveFailed { .. }), "{err:?}");
    assert_eq!(
        *observer.notices.lock().unwrap(),
        vec![CAPTURE_FAILED_NOTICE.to_string()]
    );
    assert!(observer.saved.lock().unwrap().is_empty());
    assert!(!capturer.is_busy());
}

#[tokio::test]
async fn saved_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = NewspaperSurface::new();
    page.set_reporter(Some("Karim"));

    let saved = Capturer::new()
        .download(&mut page, &options(1.0), &DirectoryDownloads::new(dir.path()))
        .await
        .unwrap();

    let path = dir.path().join("BijoyBarta-Karim.png");
    assert_eq!(saved.location, path.display().to_string());
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), saved.bytes);
    assert_eq!(decode_png(&bytes).width(), 550);
}
