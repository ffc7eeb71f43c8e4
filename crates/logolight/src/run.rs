use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lightconfig::{parse_size, AntialiasSetting, EffectConfig};
use renderer::{
    Antialiasing, EffectParams, MotionParams, RenderPolicy, Renderer, RendererConfig, RunOutcome,
};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

const DEFAULT_SURFACE_SIZE: (u32, u32) = (1280, 720);

/// Configuration after merging defaults, the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub effect: EffectConfig,
    /// File the settings were read from, if one existed.
    pub source: Option<PathBuf>,
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let resolved = resolve_config(&args, &paths)?;
    tracing::debug!(
        config_dir = %paths.config_dir().display(),
        source = ?resolved.source,
        "resolved logolight configuration"
    );

    let renderer_config = renderer_config(&resolved.effect, &args)?;
    match &renderer_config.logo_path {
        Some(path) => tracing::info!(logo = %path.display(), "starting logolight"),
        None => tracing::info!("starting logolight without a logo; only rays will render"),
    }

    match Renderer::new(renderer_config).run()? {
        RunOutcome::Exported(path) => println!("{}", path.display()),
        RunOutcome::WindowClosed => tracing::info!("window closed"),
    }
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Path of the config file a run would read: `--config` if given, otherwise
/// `config.toml` in the user config directory.
pub fn config_path(args: &RunArgs, paths: &AppPaths) -> PathBuf {
    args.config.clone().unwrap_or_else(|| paths.config_file())
}

pub fn resolve_config(args: &RunArgs, paths: &AppPaths) -> Result<ResolvedConfig> {
    let path = config_path(args, paths);
    let (mut effect, source) = match fs::read_to_string(&path) {
        Ok(contents) => {
            let mut effect = EffectConfig::from_toml_str(&contents)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            anchor_logo_path(&mut effect, &path);
            (effect, Some(path))
        }
        Err(err) if err.kind() == ErrorKind::NotFound && args.config.is_none() => {
            (EffectConfig::default(), None)
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()));
        }
    };

    apply_overrides(&mut effect, args)?;
    Ok(ResolvedConfig { effect, source })
}

/// Relative logo paths in a config file are relative to that file.
fn anchor_logo_path(effect: &mut EffectConfig, config_file: &Path) {
    let Some(logo) = effect.logo.path.as_mut() else {
        return;
    };
    if logo.is_relative() {
        if let Some(parent) = config_file.parent() {
            *logo = parent.join(&*logo);
        }
    }
}

/// Layers CLI flags over the file settings and re-validates the result.
pub fn apply_overrides(effect: &mut EffectConfig, args: &RunArgs) -> Result<()> {
    if let Some(logo) = &args.logo {
        effect.logo.path = Some(logo.clone());
    }
    if let Some(size) = &args.size {
        effect.window.size = Some(size.clone());
    }
    if let Some(fps) = args.fps {
        effect.window.fps = Some(fps);
    }
    if let Some(antialias) = args.antialias {
        effect.window.antialias = Some(antialias);
    }
    if let Some(width) = args.target_width {
        effect.logo.target_width = width;
    }
    effect
        .validate()
        .context("invalid settings after applying command-line flags")?;
    Ok(())
}

pub fn renderer_config(effect: &EffectConfig, args: &RunArgs) -> Result<RendererConfig> {
    let surface_size = match &effect.window.size {
        Some(size) => parse_size(size)?,
        None => DEFAULT_SURFACE_SIZE,
    };

    let policy = match (&args.export, args.still) {
        (Some(path), time) => RenderPolicy::Export {
            time: time.unwrap_or(0.0),
            path: path.clone(),
        },
        (None, Some(time)) => RenderPolicy::Still { time },
        (None, None) => RenderPolicy::Animate {
            target_fps: effect
                .window
                .fps
                .filter(|fps| *fps > 0.0)
                .map(|fps| fps as f32),
        },
    };

    Ok(RendererConfig {
        surface_size,
        logo_path: effect.logo.path.clone(),
        antialiasing: map_antialias(effect.window.antialias),
        effect: EffectParams {
            target_width: effect.logo.target_width as f32,
            ray_weight: effect.rays.weight as f32,
            ray_decay: effect.rays.decay as f32,
            ray_step: effect.rays.step as f32,
            max_steps: effect.rays.max_steps,
            mouse_influence: effect.rays.mouse_influence as f32,
            drift_amplitude: effect.rays.drift as f32,
            ..EffectParams::default()
        },
        motion: MotionParams {
            smoothing: effect.motion.smoothing as f32,
            decay: effect.motion.decay as f32,
        },
        policy,
    })
}

fn map_antialias(setting: Option<AntialiasSetting>) -> Antialiasing {
    match setting {
        None | Some(AntialiasSetting::Auto) => Antialiasing::Auto,
        Some(AntialiasSetting::Off) => Antialiasing::Off,
        Some(other) => match other.samples() {
            Some(samples) if samples > 1 => Antialiasing::Samples(samples),
            _ => Antialiasing::Off,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn paths_in(dir: &TempDir) -> AppPaths {
        AppPaths::from_raw(dir.path().to_path_buf())
    }

    #[test]
    fn missing_default_config_uses_builtin_values() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_config(&RunArgs::default(), &paths_in(&dir)).unwrap();
        assert!(resolved.source.is_none());
        assert_eq!(resolved.effect, EffectConfig::default());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let args = RunArgs {
            config: Some(dir.path().join("nope.toml")),
            ..RunArgs::default()
        };
        assert!(resolve_config(&args, &paths_in(&dir)).is_err());
    }

    #[test]
    fn flags_override_file_which_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(&dir);
        fs::write(
            paths.config_file(),
            "[window]\nsize = \"640x480\"\nfps = 30\n[logo]\npath = \"art/logo.png\"\ntarget_width = 200\n[rays]\nmax_steps = 64\n",
        )
        .unwrap();

        let args = RunArgs {
            size: Some("320x200".into()),
            ..RunArgs::default()
        };
        let resolved = resolve_config(&args, &paths).unwrap();
        assert_eq!(resolved.source, Some(paths.config_file()));
        assert_eq!(resolved.effect.window.size.as_deref(), Some("320x200"));
        assert_eq!(resolved.effect.window.fps, Some(30.0));
        assert_eq!(resolved.effect.rays.max_steps, 64);
        assert_eq!(resolved.effect.rays.decay, 0.95);
        assert_eq!(
            resolved.effect.logo.path,
            Some(dir.path().join("art/logo.png"))
        );

        let config = renderer_config(&resolved.effect, &args).unwrap();
        assert_eq!(config.surface_size, (320, 200));
        assert_eq!(config.effect.target_width, 200.0);
        assert_eq!(config.effect.max_steps, 64);
        assert_eq!(
            config.policy,
            RenderPolicy::Animate {
                target_fps: Some(30.0)
            }
        );
    }

    #[test]
    fn cli_logo_replaces_config_logo() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(&dir);
        fs::write(paths.config_file(), "[logo]\npath = \"/srv/logo.png\"\n").unwrap();
        let args = RunArgs {
            logo: Some(PathBuf::from("mine.png")),
            ..RunArgs::default()
        };
        let resolved = resolve_config(&args, &paths).unwrap();
        assert_eq!(resolved.effect.logo.path, Some(PathBuf::from("mine.png")));
    }

    #[test]
    fn invalid_flags_are_rejected() {
        let mut effect = EffectConfig::default();
        let args = RunArgs {
            target_width: Some(0.0),
            ..RunArgs::default()
        };
        assert!(apply_overrides(&mut effect, &args).is_err());

        let mut effect = EffectConfig::default();
        let args = RunArgs {
            size: Some("wide".into()),
            ..RunArgs::default()
        };
        assert!(apply_overrides(&mut effect, &args).is_err());
    }

    #[test]
    fn policy_follows_still_and_export_flags() {
        let effect = EffectConfig::default();

        let still = RunArgs {
            still: Some(3.0),
            ..RunArgs::default()
        };
        assert_eq!(
            renderer_config(&effect, &still).unwrap().policy,
            RenderPolicy::Still { time: 3.0 }
        );

        let export = RunArgs {
            export: Some(PathBuf::from("out.png")),
            ..RunArgs::default()
        };
        assert_eq!(
            renderer_config(&effect, &export).unwrap().policy,
            RenderPolicy::Export {
                time: 0.0,
                path: PathBuf::from("out.png")
            }
        );

        let uncapped = renderer_config(&effect, &RunArgs::default()).unwrap();
        assert_eq!(uncapped.policy, RenderPolicy::Animate { target_fps: None });
        assert_eq!(uncapped.surface_size, DEFAULT_SURFACE_SIZE);
    }

    #[test]
    fn step_limit_agrees_with_renderer_clamp() {
        assert_eq!(lightconfig::MAX_RAY_STEPS, renderer::MAX_RAY_STEPS);
    }

    #[test]
    fn antialias_settings_map_to_renderer_modes() {
        assert_eq!(map_antialias(None), Antialiasing::Auto);
        assert_eq!(map_antialias(Some(AntialiasSetting::Off)), Antialiasing::Off);
        assert_eq!(
            map_antialias(Some(AntialiasSetting::Samples8)),
            Antialiasing::Samples(8)
        );
    }
}
