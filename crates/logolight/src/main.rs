mod cli;
mod paths;
mod run;

use anyhow::{Context, Result};
use cli::{Command, ConfigAction, RunArgs};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => handle_config_command(config_cmd.action, &cli.run),
        None => run::run(cli.run),
    }
}

fn handle_config_command(action: ConfigAction, args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    match action {
        ConfigAction::Where => run_config_where(&paths, args),
        ConfigAction::Show => run_config_show(&paths, args),
    }
}

fn run_config_where(paths: &AppPaths, args: &RunArgs) -> Result<()> {
    let path = run::config_path(args, paths);
    println!("{}", path.display());
    if !path.exists() {
        tracing::info!("config file does not exist yet; built-in defaults apply");
    }
    Ok(())
}

fn run_config_show(paths: &AppPaths, args: &RunArgs) -> Result<()> {
    let resolved = run::resolve_config(args, paths)?;
    let body = resolved
        .effect
        .to_toml_string()
        .context("failed to render configuration as TOML")?;
    match &resolved.source {
        Some(source) => println!("# loaded from {}", source.display()),
        None => println!("# no config file found; showing built-in defaults"),
    }
    print!("{body}");
    Ok(())
}
