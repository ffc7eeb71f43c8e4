use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use lightconfig::{parse_antialias, AntialiasSetting};

#[derive(Parser, Debug)]
#[command(
    name = "logolight",
    author,
    version,
    about = "Logo lit by light rays that follow the mouse",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Raster image (PNG, JPEG, BMP or GIF) to light; transparency shapes the rays.
    #[arg(value_name = "LOGO")]
    pub logo: Option<PathBuf>,

    /// Configuration file to load instead of the default `config.toml`.
    #[arg(long, value_name = "FILE", env = "LOGOLIGHT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Window (or export) size in pixels, e.g. `1280x720`.
    #[arg(long, value_name = "WIDTHxHEIGHT", global = true)]
    pub size: Option<String>,

    /// Frame-rate cap (0 = follow the display refresh).
    #[arg(long, value_name = "FPS", global = true)]
    pub fps: Option<f64>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias, global = true)]
    pub antialias: Option<AntialiasSetting>,

    /// Logo scale in pixels (the logo is `PX * height / width` pixels tall).
    #[arg(long, value_name = "PX", global = true)]
    pub target_width: Option<f64>,

    /// Freeze time at the given number of seconds instead of animating.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub still: Option<f32>,

    /// Render one frame to the given PNG path without opening a window, then exit.
    #[arg(long, value_name = "PATH.png", value_parser = parse_export_path)]
    pub export: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect the configuration file.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the path of the configuration file that would be loaded.
    Where,
    /// Print the effective configuration (file plus flags) as TOML.
    Show,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_seconds(value: &str) -> Result<f32, String> {
    let seconds: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid time '{value}'; expected seconds"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("time must be a non-negative number, got {value}"));
    }
    Ok(seconds)
}

pub fn parse_export_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    check_png_extension(&path)?;
    Ok(path)
}

fn check_png_extension(path: &Path) -> Result<(), String> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Ok(()),
        None => Err("export path has no extension; expected .png".to_string()),
        Some(other) => Err(format!(
            "unsupported export format '.{other}'; expected .png"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "logolight",
            "logo.png",
            "--size",
            "800x600",
            "--fps",
            "30",
            "--antialias",
            "4",
            "--target-width",
            "420",
            "--still",
            "2.5",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        let run = cli.run;
        assert_eq!(run.logo, Some(PathBuf::from("logo.png")));
        assert_eq!(run.size.as_deref(), Some("800x600"));
        assert_eq!(run.fps, Some(30.0));
        assert_eq!(run.antialias, Some(AntialiasSetting::Samples4));
        assert_eq!(run.target_width, Some(420.0));
        assert_eq!(run.still, Some(2.5));
        assert!(run.export.is_none());
    }

    #[test]
    fn parses_config_subcommands() {
        let cli = Cli::try_parse_from(["logolight", "config", "where"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand {
                action: ConfigAction::Where
            }))
        ));

        let cli = Cli::try_parse_from(["logolight", "config", "show", "--size", "10x10"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand {
                action: ConfigAction::Show
            }))
        ));
        assert_eq!(cli.run.size.as_deref(), Some("10x10"));
    }

    #[test]
    fn export_requires_png_extension() {
        assert!(parse_export_path("out.png").is_ok());
        assert!(parse_export_path("OUT.PNG").is_ok());
        assert!(parse_export_path("out.jpg").is_err());
        assert!(parse_export_path("out").is_err());
    }

    #[test]
    fn rejects_bad_antialias_and_time() {
        assert!(Cli::try_parse_from(["logolight", "--antialias", "3"]).is_err());
        assert!(Cli::try_parse_from(["logolight", "--still", "-1"]).is_err());
        assert!(parse_seconds("soon").is_err());
        assert_eq!(parse_seconds(" 1.25 ").unwrap(), 1.25);
    }
}
