//! Profile command implementation.

use crate::cli::{ProfileAction, ProfileArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use cardsmith_llm::BackendConfig;
use std::collections::BTreeMap;
use std::path::Path;

/// Execute the profile command.
pub fn execute_profile(
    args: ProfileArgs,
    config: &mut Config,
    config_path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ProfileAction::List => list_profiles(config, formatter),
        ProfileAction::Show => show_active_profile(config, formatter),
        ProfileAction::Switch { name } => switch_profile(config, config_path, name, formatter),
        ProfileAction::SetOllama {
            name,
            model,
            endpoint,
            timeout,
        } => {
            let backend = BackendConfig::Ollama {
                endpoint,
                model,
                timeout_secs: timeout,
            };
            set_profile(config, config_path, name, backend, formatter)
        }
        ProfileAction::SetHttp {
            name,
            url,
            headers,
            timeout,
        } => {
            let backend = BackendConfig::Http {
                api_url: url,
                headers: parse_headers(&headers)?,
                payload_template: Default::default(),
                timeout_secs: timeout,
            };
            set_profile(config, config_path, name, backend, formatter)
        }
        ProfileAction::SetLocal {
            name,
            model_dir,
            eos_token,
            max_context,
        } => {
            let backend = BackendConfig::Local {
                model_dir,
                eos_token,
                max_context_tokens: max_context,
            };
            set_profile(config, config_path, name, backend, formatter)
        }
        ProfileAction::Delete { name } => delete_profile(config, config_path, name, formatter),
    }
}

/// Parse `NAME=VALUE` header arguments.
fn parse_headers(raw: &[String]) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|header| {
            let (name, value) = header.split_once('=').ok_or_else(|| {
                CliError::InvalidInput(format!("Invalid header '{}'. Expected 'NAME=VALUE'", header))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(CliError::InvalidInput(format!("Header '{}' has no name", header)));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// List all profiles.
fn list_profiles(config: &Config, formatter: &Formatter) -> Result<()> {
    if config.profiles.is_empty() {
        println!("{}", formatter.info("No profiles configured"));
        return Ok(());
    }

    println!("Available profiles:");
    for (name, backend) in &config.profiles {
        if name == &config.active_profile {
            println!("* {}", formatter.success(name));
        } else {
            println!("  {}", name);
        }
        println!("    {}", backend.summary());
    }

    Ok(())
}

/// Show the active profile.
fn show_active_profile(config: &Config, formatter: &Formatter) -> Result<()> {
    let backend = config.active_backend()?;

    println!("Active profile: {}", formatter.success(&config.active_profile));
    println!("  Kind: {}", backend.kind());
    println!("  {}", backend.summary());

    Ok(())
}

/// Switch to a different profile.
fn switch_profile(config: &mut Config, config_path: &Path, name: String, formatter: &Formatter) -> Result<()> {
    config.switch_profile(name.clone())?;
    config.save(config_path)?;
    println!(
        "{}",
        formatter.success(&format!("Switched to profile '{}'", name))
    );
    Ok(())
}

/// Create or update a profile.
fn set_profile(
    config: &mut Config,
    config_path: &Path,
    name: String,
    backend: BackendConfig,
    formatter: &Formatter,
) -> Result<()> {
    let action = if config.profiles.contains_key(&name) {
        "Updated"
    } else {
        "Created"
    };

    config.set_profile(name.clone(), backend)?;
    config.save(config_path)?;

    println!(
        "{}",
        formatter.success(&format!("{} profile '{}'", action, name))
    );

    Ok(())
}

/// Delete a profile.
fn delete_profile(config: &mut Config, config_path: &Path, name: String, formatter: &Formatter) -> Result<()> {
    if name == config.active_profile {
        return Err(CliError::NotPermitted(
            "Cannot delete the active profile".to_string(),
        ));
    }

    if config.profiles.remove(&name).is_some() {
        config.save(config_path)?;
        println!(
            "{}",
            formatter.success(&format!("Deleted profile '{}'", name))
        );
    } else {
        println!(
            "{}",
            formatter.warning(&format!("Profile '{}' does not exist", name))
        );
    }

    Ok(())
}
