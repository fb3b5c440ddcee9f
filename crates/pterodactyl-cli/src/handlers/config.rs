//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::redaction::mask_key;
use crate::output::OutputWriter;
use serde::Serialize;
use std::path::PathBuf;

/// Handle the config command
pub async fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Profiles => handle_config_profiles(config, output),
        ConfigAction::Validate => handle_config_validate(config, output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = init_path(&args)?;
    write_starter(&path, args.force, output)
}

fn init_path(args: &ConfigInitArgs) -> Result<PathBuf> {
    let file_name = format!("config.{}", args.format.extension());
    if args.user {
        Config::user_config_dir()
            .map(|dir| dir.join(file_name))
            .ok_or_else(|| Error::config("Unable to determine user config directory"))
    } else {
        Ok(PathBuf::from(format!(".pterodactyl.{}", args.format.extension())))
    }
}

fn write_starter(path: &std::path::Path, force: bool, output: &mut OutputWriter) -> Result<()> {
    if path.exists() && !force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::starter().save(path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Set panel_url and the API keys for each profile before use.")?;
    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let rendered = config.redacted().render(args.format.extension())?;
    output.writeln(rendered.trim_end())
}

#[derive(Debug, Serialize)]
struct ProfileSummary {
    index: usize,
    name: String,
    panel_url: String,
    default: bool,
    client_api_key: Option<String>,
    application_api_key: Option<String>,
}

fn profile_summaries(config: &Config) -> Vec<ProfileSummary> {
    let default_index = config.profile_index(None).ok();

    config
        .profiles
        .iter()
        .enumerate()
        .map(|(index, profile)| ProfileSummary {
            index,
            name: profile.name.clone(),
            panel_url: profile.panel_url.clone(),
            default: default_index == Some(index),
            client_api_key: profile.client_api_key.as_deref().map(mask_key),
            application_api_key: profile.application_api_key.as_deref().map(mask_key),
        })
        .collect()
}

/// Handle config profiles subcommand
fn handle_config_profiles(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let summaries = profile_summaries(config);

    if output.format() != crate::cli::OutputFormat::Human {
        return output.data(&summaries);
    }

    if summaries.is_empty() {
        return output.warning("No profiles configured. Run 'pterodactyl config init' to create one.");
    }

    output.section("Profiles")?;
    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.index.to_string(),
                if s.default { format!("{} *", s.name) } else { s.name.clone() },
                s.panel_url.clone(),
                key_state(&s.client_api_key),
                key_state(&s.application_api_key),
            ]
        })
        .collect();
    output.table(&["#", "name", "panel_url", "client key", "application key"], rows)
}

fn key_state(key: &Option<String>) -> String {
    key.clone().unwrap_or_else(|| "-".to_string())
}

/// Handle config validate subcommand
fn handle_config_validate(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let problems = config.validate();

    if problems.is_empty() {
        output.success(&format!(
            "✓ Configuration is valid ({} profile(s))",
            config.profiles.len()
        ))?;
        return Ok(());
    }

    for problem in &problems {
        output.warning(problem)?;
    }
    Err(Error::config(format!("{} problem(s) found", problems.len())))
}
