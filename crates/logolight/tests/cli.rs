use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

fn logolight(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_logolight"))
        .env("LOGOLIGHT_CONFIG_DIR", config_dir)
        .env_remove("LOGOLIGHT_CONFIG")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run logolight")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_logo(path: &Path) {
    // opaque disc on a transparent background
    let logo = RgbaImage::from_fn(32, 16, |x, y| {
        let dx = x as f32 - 15.5;
        let dy = (y as f32 - 7.5) * 2.0;
        if dx * dx + dy * dy < 100.0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    logo.save(path).unwrap();
}

#[test]
fn config_where_reports_override_dir() {
    let root = TempDir::new().unwrap();
    let output = logolight(root.path(), &["config", "where"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        root.path().join("config.toml").display().to_string()
    );
}

#[test]
fn config_show_merges_file_and_flags() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "version = 1\n[rays]\nmax_steps = 64\n[motion]\nsmoothing = 0.1\n",
    )
    .unwrap();

    let output = logolight(root.path(), &["config", "show", "--target-width", "420"]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("max_steps = 64"), "{text}");
    assert!(text.contains("smoothing = 0.1"), "{text}");
    assert!(text.contains("target_width = 420.0"), "{text}");
    assert!(text.contains("decay = 0.95"), "{text}");
}

#[test]
fn config_show_without_file_prints_defaults() {
    let root = TempDir::new().unwrap();
    let output = logolight(root.path(), &["config", "show"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("built-in defaults"), "{text}");
    assert!(text.contains("weight = 0.15"), "{text}");
}

#[test]
fn invalid_config_fails_with_message() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "[rays]\ndecay = 1.5\n").unwrap();

    let output = logolight(root.path(), &["config", "show"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rays.decay"), "{stderr}");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("missing.toml");
    let output = logolight(
        root.path(),
        &["--config", missing.to_str().unwrap(), "config", "show"],
    );
    assert!(!output.status.success());
}

#[test]
fn export_writes_png_of_requested_size() {
    let root = TempDir::new().unwrap();
    let logo = root.path().join("logo.png");
    write_logo(&logo);
    let out = root.path().join("still.png");

    let output = logolight(
        root.path(),
        &[
            logo.to_str().unwrap(),
            "--size",
            "96x54",
            "--still",
            "1.5",
            "--export",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output).trim(), out.display().to_string());

    let image = image::open(&out).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (96, 54));
    let centre = image.get_pixel(48, 27);
    assert!(centre[0] > 150, "centre pixel {centre:?} should show the logo");
}

#[test]
fn export_rejects_non_png_paths() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("still.jpg");
    let output = logolight(root.path(), &["--export", out.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(!out.exists());
}
