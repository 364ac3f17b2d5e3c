use image::{ImageFormat, Rgb, RgbImage};
use imgsort::cli::{SortCommand, SortOptions, run_cli};
use imgsort::undo::{UndoManager, UndoWarning};
/// Integration tests for imgsort
///
/// These tests run complete sort, rename and undo workflows against real
/// image files in temporary directories.
///
/// Test categories:
/// 1. Listing without renaming
/// 2. Renaming in sort order
/// 3. Change log and undo
/// 4. Filtering and configuration
/// 5. Error scenarios
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory with helpers for creating images and inspecting
/// the result of a run.
struct TestFixture {
    temp_dir: TempDir,
    config_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(config_dir.path().join("empty.toml"), "").expect("Failed to write config");
        TestFixture {
            temp_dir,
            config_dir,
        }
    }

    /// An empty config file outside the image directory, so runs never pick
    /// up a local or per-user config.
    fn empty_config(&self) -> PathBuf {
        self.config_dir.path().join("empty.toml")
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes a solid-color PNG, whatever the extension of `name`.
    fn create_image(&self, name: &str, width: u32, height: u32, color: [u8; 3]) {
        RgbImage::from_pixel(width, height, Rgb(color))
            .save_with_format(self.path().join(name), ImageFormat::Png)
            .expect("Failed to write image");
    }

    fn create_text_file(&self, name: &str, content: &str) {
        fs::write(self.path().join(name), content).expect("Failed to write file");
    }

    fn assert_file_exists(&self, name: &str) {
        let path = self.path().join(name);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, name: &str) {
        let path = self.path().join(name);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Sorted names of the files in the directory, excluding `skip`.
    fn file_names_except(&self, skip: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| !skip.contains(&name.as_str()))
            .collect();
        names.sort();
        names
    }

    fn file_names(&self) -> Vec<String> {
        self.file_names_except(&[])
    }

    /// Reads a file's bytes so renamed files can be traced back.
    fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.path().join(name)).expect("Failed to read file")
    }

    fn log_path(&self) -> PathBuf {
        self.path().join("changes.txt")
    }
}

fn rename_options(log: Option<PathBuf>) -> SortOptions {
    SortOptions {
        rename: true,
        change_log: log,
        ..Default::default()
    }
}

fn run(fixture: &TestFixture, mut options: SortOptions) -> Result<(), String> {
    if options.config_path.is_none() {
        options.config_path = Some(fixture.empty_config());
    }
    run_cli(SortCommand::Sort(options), fixture.path())
}

fn undo(fixture: &TestFixture) -> Result<(), String> {
    run_cli(
        SortCommand::Undo {
            change_log: fixture.log_path(),
        },
        fixture.path(),
    )
}

// ============================================================================
// Test Suite 1: Listing
// ============================================================================

#[test]
fn test_listing_does_not_rename() {
    let fixture = TestFixture::new();
    fixture.create_image("a.png", 2, 2, [0, 0, 0]);
    fixture.create_image("b.png", 1, 1, [0, 0, 0]);

    let result = run(&fixture, SortOptions::default());

    assert!(result.is_ok());
    assert_eq!(fixture.file_names(), ["a.png", "b.png"]);
}

#[test]
fn test_empty_directory() {
    let fixture = TestFixture::new();
    assert!(run(&fixture, rename_options(None)).is_ok());
    assert!(fixture.file_names().is_empty());
}

// ============================================================================
// Test Suite 2: Renaming
// ============================================================================

#[test]
fn test_rename_follows_resolution_order() {
    let fixture = TestFixture::new();
    fixture.create_image("big.png", 8, 8, [0, 0, 0]);
    fixture.create_image("small.png", 1, 1, [0, 0, 0]);
    fixture.create_image("medium.png", 4, 4, [0, 0, 0]);

    let small = fixture.read("small.png");
    let medium = fixture.read("medium.png");
    let big = fixture.read("big.png");

    run(&fixture, rename_options(None)).expect("Rename failed");

    // Default names count from 36^3 ("1000") in steps of 5.
    assert_eq!(
        fixture.file_names(),
        ["1000_1x1.png", "1005_4x4.png", "100a_8x8.png"]
    );
    assert_eq!(fixture.read("1000_1x1.png"), small);
    assert_eq!(fixture.read("1005_4x4.png"), medium);
    assert_eq!(fixture.read("100a_8x8.png"), big);
}

#[test]
fn test_rename_by_hue_reversed() {
    let fixture = TestFixture::new();
    fixture.create_image("red.png", 1, 1, [255, 0, 0]);
    fixture.create_image("green.png", 1, 1, [0, 255, 0]);
    fixture.create_image("blue.png", 1, 1, [0, 0, 255]);
    let red = fixture.read("red.png");
    let blue = fixture.read("blue.png");

    let options = SortOptions {
        primary: Some(imgsort::SortMethod::Hue),
        reverse: true,
        start: Some(0),
        step: Some(1),
        pad_width: Some(2),
        ..rename_options(None)
    };
    run(&fixture, options).expect("Rename failed");

    assert_eq!(
        fixture.file_names(),
        ["00_1x1.png", "01_1x1.png", "02_1x1.png"]
    );
    assert_eq!(fixture.read("00_1x1.png"), blue);
    assert_eq!(fixture.read("02_1x1.png"), red);
}

#[test]
fn test_rename_skips_existing_names() {
    let fixture = TestFixture::new();
    fixture.create_image("photo.png", 3, 2, [10, 20, 30]);
    fixture.create_text_file("1000_3x2.png", "not an image, but in the way");

    run(&fixture, rename_options(None)).expect("Rename failed");

    assert_eq!(
        fs::read_to_string(fixture.path().join("1000_3x2.png")).unwrap(),
        "not an image, but in the way"
    );
    fixture.assert_file_exists("1005_3x2.png");
    fixture.assert_file_not_exists("photo.png");
}

#[test]
fn test_step_zero_and_negative_are_normalized() {
    let fixture = TestFixture::new();
    fixture.create_image("a.png", 1, 1, [0, 0, 0]);
    fixture.create_image("b.png", 2, 2, [0, 0, 0]);

    let options = SortOptions {
        start: Some(0),
        step: Some(-5),
        pad_width: Some(0),
        ..rename_options(None)
    };
    run(&fixture, options).expect("Rename failed");
    assert_eq!(fixture.file_names(), ["0_1x1.png", "5_2x2.png"]);
}

#[test]
fn test_non_images_are_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_image("photo.png", 1, 1, [0, 0, 0]);
    fixture.create_text_file("notes.txt", "hello");
    fixture.create_text_file("broken.png", "definitely not a png");

    run(&fixture, rename_options(None)).expect("Rename failed");

    assert_eq!(
        fixture.file_names(),
        ["1000_1x1.png", "broken.png", "notes.txt"]
    );
}

#[test]
fn test_dry_run_does_not_touch_files() {
    let fixture = TestFixture::new();
    fixture.create_image("a.png", 1, 1, [0, 0, 0]);
    fixture.create_image("b.png", 2, 2, [0, 0, 0]);

    let options = SortOptions {
        dry_run: true,
        list: true,
        ..rename_options(Some(fixture.log_path()))
    };
    run(&fixture, options).expect("Dry run failed");

    assert_eq!(fixture.file_names(), ["a.png", "b.png"]);
    fixture.assert_file_not_exists("changes.txt");
}

// ============================================================================
// Test Suite 3: Change log and undo
// ============================================================================

#[test]
fn test_rename_then_undo_restores_names() {
    let fixture = TestFixture::new();
    fixture.create_image("a.jpg", 3, 3, [0, 0, 0]);
    fixture.create_image("b.jpg", 1, 1, [0, 0, 0]);
    fixture.create_image("c.jpg", 2, 2, [0, 0, 0]);
    let a = fixture.read("a.jpg");

    run(&fixture, rename_options(Some(fixture.log_path()))).expect("Rename failed");

    assert_eq!(
        fixture.file_names_except(&["changes.txt"]),
        ["1000_1x1.png", "1005_2x2.png", "100a_3x3.png"]
    );
    let log = fs::read_to_string(fixture.log_path()).expect("Failed to read log");
    assert_eq!(
        log,
        "b.jpg -> 1000_1x1.png\nc.jpg -> 1005_2x2.png\na.jpg -> 100a_3x3.png\n"
    );

    undo(&fixture).expect("Undo failed");

    assert_eq!(
        fixture.file_names_except(&["changes.txt"]),
        ["a.jpg", "b.jpg", "c.jpg"]
    );
    assert_eq!(fixture.read("a.jpg"), a);
}

#[test]
fn test_escaped_space_round_trip() {
    let fixture = TestFixture::new();
    fixture.create_image("my photo.jpg", 2, 1, [1, 2, 3]);

    run(&fixture, rename_options(Some(fixture.log_path()))).expect("Rename failed");

    let log = fs::read_to_string(fixture.log_path()).expect("Failed to read log");
    assert_eq!(log, "my\\ photo.jpg -> 1000_2x1.png\n");
    fixture.assert_file_not_exists("my photo.jpg");

    undo(&fixture).expect("Undo failed");
    fixture.assert_file_exists("my photo.jpg");
    fixture.assert_file_not_exists("1000_2x1.png");
}

#[test]
fn test_backslash_names_round_trip() {
    let fixture = TestFixture::new();
    fixture.create_image("shot\\", 1, 1, [0, 0, 0]);
    fixture.create_image("a\\ b.png", 2, 2, [0, 0, 0]);

    run(&fixture, rename_options(Some(fixture.log_path()))).expect("Rename failed");

    let log = fs::read_to_string(fixture.log_path()).expect("Failed to read log");
    assert_eq!(
        log,
        "shot\\\\ -> 1000_1x1.png\na\\\\\\ b.png -> 1005_2x2.png\n"
    );

    let report = UndoManager::undo(&fixture.log_path(), fixture.path()).expect("Undo failed");
    assert!(report.is_complete_success(), "{:?}", report.warnings);
    assert_eq!(report.restored_files, 2);
    assert_eq!(
        fixture.file_names_except(&["changes.txt"]),
        ["a\\ b.png", "shot\\"]
    );
}

#[test]
fn test_empty_config_file_uses_built_in_defaults() {
    let fixture = TestFixture::new();
    fixture.create_image("a.png", 3, 1, [0, 0, 0]);

    let options = SortOptions {
        config_path: Some(fixture.empty_config()),
        ..rename_options(None)
    };
    run(&fixture, options).expect("Rename failed");

    assert_eq!(fixture.file_names(), ["1000_3x1.png"]);
}

#[test]
fn test_undo_reports_malformed_line() {
    let fixture = TestFixture::new();
    fixture.create_image("1000_1x1.png", 1, 1, [0, 0, 0]);
    fs::write(
        fixture.log_path(),
        "a.png -> 1000_1x1.png\nthis line has no separator\n",
    )
    .expect("Failed to write log");

    let report = UndoManager::undo(&fixture.log_path(), fixture.path()).expect("Undo failed");

    assert_eq!(report.restored_files, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        report.warnings[0],
        UndoWarning::MalformedLine { line_number: 2, .. }
    ));
    fixture.assert_file_exists("a.png");
}

#[test]
fn test_undo_twice_is_safe() {
    let fixture = TestFixture::new();
    fixture.create_image("a.png", 1, 1, [0, 0, 0]);

    run(&fixture, rename_options(Some(fixture.log_path()))).expect("Rename failed");
    undo(&fixture).expect("First undo failed");
    undo(&fixture).expect("Second undo should only warn");

    assert_eq!(fixture.file_names_except(&["changes.txt"]), ["a.png"]);
}

#[test]
fn test_undo_with_missing_log_fails() {
    let fixture = TestFixture::new();
    assert!(undo(&fixture).is_err());
}

// ============================================================================
// Test Suite 4: Filtering and configuration
// ============================================================================

#[test]
fn test_include_and_exclude_filters() {
    let fixture = TestFixture::new();
    fixture.create_image("keep.png", 1, 1, [0, 0, 0]);
    fixture.create_image("skip.png", 1, 1, [0, 0, 0]);
    fixture.create_image("other.gif.png", 1, 1, [0, 0, 0]);

    let options = SortOptions {
        include: Some(r"[a-z]+\.png".to_string()),
        exclude: Some("skip.*".to_string()),
        ..rename_options(None)
    };
    run(&fixture, options).expect("Rename failed");

    assert_eq!(
        fixture.file_names(),
        ["1000_1x1.png", "other.gif.png", "skip.png"]
    );
}

#[test]
fn test_config_file_sets_defaults() {
    let fixture = TestFixture::new();
    let config_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = config_dir.path().join("imgsort.toml");
    fs::write(
        &config_path,
        "[sort]\nprimary = \"dimensions\"\nstart = 10\nstep = 2\npad_width = 0\n\n[filters.exclude]\nextensions = [\"bmp\"]\n",
    )
    .expect("Failed to write config");

    fixture.create_image("wide.png", 5, 1, [0, 0, 0]);
    fixture.create_image("tall.png", 1, 5, [0, 0, 0]);
    fixture.create_image("ignored.bmp", 1, 1, [0, 0, 0]);

    let options = SortOptions {
        config_path: Some(config_path),
        ..rename_options(None)
    };
    run(&fixture, options).expect("Rename failed");

    assert_eq!(
        fixture.file_names(),
        ["a_1x5.png", "c_5x1.png", "ignored.bmp"]
    );
}

// ============================================================================
// Test Suite 5: Error scenarios
// ============================================================================

#[test]
fn test_invalid_regex_is_fatal() {
    let fixture = TestFixture::new();
    fixture.create_image("a.png", 1, 1, [0, 0, 0]);

    let options = SortOptions {
        include: Some("[unclosed".to_string()),
        ..rename_options(None)
    };
    assert!(run(&fixture, options).is_err());
    fixture.assert_file_exists("a.png");
}

#[test]
fn test_missing_directory_is_fatal() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("nope");
    let result = run_cli(SortCommand::Sort(SortOptions::default()), &missing);
    assert!(result.is_err());
}

#[test]
fn test_unwritable_change_log_aborts_before_renaming() {
    let fixture = TestFixture::new();
    fixture.create_image("a.png", 1, 1, [0, 0, 0]);

    let log = fixture.path().join("missing_dir").join("changes.txt");
    assert!(run(&fixture, rename_options(Some(log))).is_err());
    fixture.assert_file_exists("a.png");
}
