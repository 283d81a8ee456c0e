use std::path::Path;

use herd_core::config::GatewayConfig;
use herd_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::commands::common::{default_config_path, load_effective_config, resolve_db_path};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    let path = default_config_path()?;
    match command {
        ConfigCommands::Init {
            api_url,
            token,
            timeout,
        } => {
            let config = run_config_init(&path, api_url, token, timeout)?;
            println!("Saved config to {}", path.display());
            println!("API URL: {}", config.api_base_url());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = load_effective_config(&path)?;
            for line in format_config_lines(&path, &config)? {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// Update the file at `path` with the given values, keeping the rest
pub fn run_config_init(
    path: &Path,
    api_url: Option<String>,
    token: Option<String>,
    timeout: Option<u64>,
) -> Result<GatewayConfig, CliError> {
    let mut config = GatewayConfig::load_from_path(path)?;

    if let Some(url) = normalize_text_option(api_url) {
        config.api_base_url = Some(url);
    }
    if let Some(token) = normalize_text_option(token) {
        config.auth_token = Some(token);
    }
    if let Some(timeout) = timeout {
        config.request_timeout_secs = timeout;
    }

    config.validate()?;
    config.save_to_path(path)?;
    GatewayConfig::load_from_path(path).map_err(CliError::from)
}

pub fn format_config_lines(path: &Path, config: &GatewayConfig) -> Result<Vec<String>, CliError> {
    let db_path = resolve_db_path(None, config)?;
    Ok(vec![
        format!("Config file: {}", path.display()),
        format!("API URL: {}", config.api_base_url()),
        format!(
            "Auth token: {}",
            if config.auth_token.is_some() {
                "set"
            } else {
                "not set"
            }
        ),
        format!("Local store: {}", db_path.display()),
        format!("Request timeout: {}s", config.request_timeout_secs),
    ])
}
