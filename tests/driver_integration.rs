use image::{Rgba, RgbaImage};
use picture_flipper::catalog;
use picture_flipper::driver::{DisplaySurface, Driver, Flow};
use picture_flipper::events::{Command, Frame};
use picture_flipper::rotation::{RotationEngine, RotationState};
use picture_flipper::surface::PngSurface;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Recorded {
    presented: Vec<(PathBuf, u32, u32)>,
    announced: Vec<PathBuf>,
    ignored: Vec<(Command, RotationState)>,
}

#[derive(Debug, Clone)]
struct RecordingSurface {
    viewport: (u32, u32),
    log: Arc<Mutex<Recorded>>,
}

impl RecordingSurface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            log: Arc::default(),
        }
    }
}

impl DisplaySurface for RecordingSurface {
    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn present(&mut self, frame: Frame) -> anyhow::Result<()> {
        self.log
            .lock()
            .unwrap()
            .presented
            .push((frame.path, frame.width, frame.height));
        Ok(())
    }

    fn show_file_name(&mut self, path: &Path) {
        self.log.lock().unwrap().announced.push(path.to_path_buf());
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn command_ignored(&mut self, command: &Command, state: RotationState) {
        self.log.lock().unwrap().ignored.push((command.clone(), state));
    }
}

struct Library {
    _tmp: TempDir,
    root: PathBuf,
    boss: PathBuf,
}

fn library() -> Library {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("pics");
    fs::create_dir_all(&root).unwrap();
    RgbaImage::from_pixel(40, 20, Rgba([10, 20, 30, 255]))
        .save(root.join("wide.png"))
        .unwrap();
    RgbaImage::from_pixel(20, 40, Rgba([30, 20, 10, 255]))
        .save(root.join("tall.png"))
        .unwrap();
    let boss = tmp.path().join("boss.png");
    RgbaImage::from_pixel(30, 30, Rgba([0, 0, 0, 255]))
        .save(&boss)
        .unwrap();
    Library {
        _tmp: tmp,
        root,
        boss,
    }
}

fn driver_for(lib: &Library, surface: RecordingSurface) -> Driver<RecordingSurface> {
    let pool = catalog::build(&[lib.root.clone()], &[".png".to_string()]).unwrap();
    let engine = RotationEngine::seeded(pool, 1);
    Driver::new(engine, surface, Duration::from_millis(20), lib.boss.clone())
}

#[test]
fn cycle_renders_against_the_current_viewport() {
    let lib = library();
    let surface = RecordingSurface::new(400, 300);
    let log = surface.log.clone();
    let mut driver = driver_for(&lib, surface);

    driver.cycle().unwrap();
    driver.handle(Command::Pause).unwrap();
    driver
        .handle(Command::Resize {
            width: 800,
            height: 600,
        })
        .unwrap();
    driver.cycle().unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.presented.len(), 2);
    let (first, w0, h0) = &log.presented[0];
    let (second, w1, h1) = &log.presented[1];
    assert_eq!(first, second, "paused driver must re-render the same file");
    if first.ends_with("wide.png") {
        assert_eq!((*w0, *h0), (400, 200));
        assert_eq!((*w1, *h1), (800, 400));
    } else {
        assert_eq!((*w0, *h0), (150, 300));
        assert_eq!((*w1, *h1), (300, 600));
    }
}

#[test]
fn boss_renders_immediately_and_release_keeps_it() {
    let lib = library();
    let surface = RecordingSurface::new(100, 100);
    let log = surface.log.clone();
    let mut driver = driver_for(&lib, surface);

    driver.cycle().unwrap();
    assert_eq!(driver.handle(Command::Boss).unwrap(), Flow::Continue);
    assert_eq!(driver.engine().state(), RotationState::Override);
    assert_eq!(log.lock().unwrap().presented.last().unwrap().0, lib.boss);

    driver.handle(Command::Release).unwrap();
    assert_eq!(driver.engine().state(), RotationState::Paused);
    driver.cycle().unwrap();
    driver.cycle().unwrap();
    assert!(
        log.lock()
            .unwrap()
            .presented
            .iter()
            .rev()
            .take(3)
            .all(|(p, _, _)| *p == lib.boss)
    );

    driver.handle(Command::ShowFileName).unwrap();
    assert_eq!(log.lock().unwrap().announced, vec![lib.boss.clone()]);
}

#[test]
fn broken_picture_is_surfaced_by_cycle_and_skipped_by_refresh() {
    let tmp = tempdir().unwrap();
    let bad = tmp.path().join("bad.png");
    fs::write(&bad, b"nope").unwrap();

    let surface = RecordingSurface::new(100, 100);
    let log = surface.log.clone();
    let pool = catalog::build(&[tmp.path().to_path_buf()], &[".png".to_string()]).unwrap();
    let mut driver = Driver::new(
        RotationEngine::seeded(pool, 0),
        surface,
        Duration::from_secs(1),
        bad.clone(),
    );

    match driver.cycle() {
        Err(picture_flipper::Error::ImageLoad { path, .. }) => assert_eq!(path, bad),
        other => panic!("expected ImageLoad, got {other:?}"),
    }
    driver.refresh().unwrap();
    assert!(log.lock().unwrap().presented.is_empty());
}

#[test]
fn quit_stops_the_loop() {
    let lib = library();
    let mut driver = driver_for(&lib, RecordingSurface::new(10, 10));
    assert_eq!(driver.handle(Command::Quit).unwrap(), Flow::Stop);
}

#[test]
fn commands_that_do_not_apply_are_reported() {
    let lib = library();
    let surface = RecordingSurface::new(100, 100);
    let log = surface.log.clone();
    let mut driver = driver_for(&lib, surface);
    driver.cycle().unwrap();

    assert_eq!(driver.handle(Command::Resume).unwrap(), Flow::Continue);
    assert_eq!(driver.handle(Command::Release).unwrap(), Flow::Continue);
    assert_eq!(driver.engine().state(), RotationState::Running);

    driver.handle(Command::Boss).unwrap();
    driver.handle(Command::Resume).unwrap();
    driver.handle(Command::Pause).unwrap();
    assert_eq!(driver.engine().state(), RotationState::Override);
    assert_eq!(driver.engine().current_path(), Some(lib.boss.as_path()));

    assert_eq!(
        log.lock().unwrap().ignored,
        vec![
            (Command::Resume, RotationState::Running),
            (Command::Release, RotationState::Running),
            (Command::Resume, RotationState::Override),
            (Command::Pause, RotationState::Override),
        ]
    );

    // Accepted commands are not reported.
    driver.handle(Command::Release).unwrap();
    driver.handle(Command::Resume).unwrap();
    assert_eq!(log.lock().unwrap().ignored.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn run_ticks_on_the_delay_and_obeys_pause() {
    let lib = library();
    let surface = RecordingSurface::new(50, 50);
    let log = surface.log.clone();
    let driver = driver_for(&lib, surface);

    let (tx, rx) = mpsc::channel::<Command>(4);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(driver.run(rx, cancel.clone()));

    // First picture at 0 ms, then one per 20 ms delay: 0, 20, 40, 60, 80, 100.
    tokio::time::sleep(Duration::from_millis(110)).await;
    assert_eq!(log.lock().unwrap().presented.len(), 6);
    let frozen = log.lock().unwrap().presented[5].0.clone();

    tx.send(Command::Pause).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;

    {
        let log = log.lock().unwrap();
        // 120, 140, ..., 220
        assert_eq!(log.presented.len(), 12);
        assert!(
            log.presented[6..].iter().all(|(p, _, _)| *p == frozen),
            "paused slideshow must keep re-rendering the same file"
        );
    }

    tx.send(Command::Quit).await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("driver did not stop on quit")
        .unwrap()
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn closed_command_channel_keeps_the_show_running() {
    let lib = library();
    let surface = RecordingSurface::new(50, 50);
    let log = surface.log.clone();
    let driver = driver_for(&lib, surface);

    let (tx, rx) = mpsc::channel::<Command>(1);
    drop(tx);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(driver.run(rx, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(110)).await;
    assert_eq!(log.lock().unwrap().presented.len(), 6);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(log.lock().unwrap().presented.len(), 11);
    assert!(!handle.is_finished(), "driver stopped without quit or cancel");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("driver did not stop on cancel")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn cancel_stops_the_loop_even_with_commands_closed() {
    let lib = library();
    let driver = driver_for(&lib, RecordingSurface::new(50, 50));

    let (tx, rx) = mpsc::channel::<Command>(1);
    drop(tx);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(driver.run(rx, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("driver did not stop on cancel")
        .unwrap()
        .unwrap();
}

#[test]
fn png_surface_writes_the_latest_frame() {
    let lib = library();
    let out = lib.root.parent().unwrap().join("current.png");
    let pool = catalog::build(&[lib.root.clone()], &[".png".to_string()]).unwrap();
    let mut driver = Driver::new(
        RotationEngine::seeded(pool, 4),
        PngSurface::new(out.clone(), 64, 48).with_title("Pictures"),
        Duration::from_secs(1),
        lib.boss.clone(),
    );

    assert_eq!(driver.surface().title(), "Pictures");
    driver.cycle().unwrap();
    let written = image::open(&out).unwrap();
    let shown = driver.surface().last_presented().unwrap().to_path_buf();
    if shown.ends_with("wide.png") {
        assert_eq!((written.width(), written.height()), (64, 32));
    } else {
        assert_eq!((written.width(), written.height()), (24, 48));
    }

    driver.handle(Command::Boss).unwrap();
    let written = image::open(&out).unwrap();
    assert_eq!((written.width(), written.height()), (48, 48));
    assert_eq!(driver.surface().last_presented(), Some(lib.boss.as_path()));
}
