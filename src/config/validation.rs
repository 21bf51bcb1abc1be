use super::{AppConfig, ConfigError};

const VALID_LOG_LEVELS: &[&str] = &[
    "DEBUG", "INFO", "WARNING", "WARN", "ERROR", "CRITICAL", "TRACE", "DISABLED",
];

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_server_config(config)?;
    validate_llm_config(config)?;
    validate_features(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_server_config(config: &AppConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if server.host.trim().is_empty() {
        return Err(validation_err("server.host cannot be empty"));
    }
    if let Some(worker_threads) = server.runtime_worker_threads {
        if worker_threads == 0 {
            return Err(validation_err(
                "server.runtime_worker_threads must be greater than 0 when set",
            ));
        }
    }
    Ok(())
}

fn validate_llm_config(config: &AppConfig) -> Result<(), ConfigError> {
    let llm = &config.llm;
    if llm.base_url.trim().is_empty() {
        return Err(validation_err("LLM_API_BASE_URL is not set"));
    }
    let parsed = url::Url::parse(&llm.base_url)
        .map_err(|err| validation_err(format!("llm.base_url is not a valid URL: {err}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(validation_err(
            "llm.base_url must start with http:// or https://",
        ));
    }
    if llm.model.trim().is_empty() {
        return Err(validation_err("llm.model cannot be empty"));
    }
    if llm.max_tokens == 0 {
        return Err(validation_err("llm.max_tokens must be greater than 0"));
    }
    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(validation_err(format!(
            "llm.temperature must be within 0.0..=2.0, got {}",
            llm.temperature
        )));
    }
    Ok(())
}

fn validate_features(config: &AppConfig) -> Result<(), ConfigError> {
    let features = &config.features;
    let level = features.log_level.to_uppercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        return Err(validation_err(format!(
            "features.log_level '{}' is not one of: {}",
            features.log_level,
            VALID_LOG_LEVELS.join(", ")
        )));
    }
    if features.history_window == 0 {
        return Err(validation_err(
            "features.history_window must be greater than 0",
        ));
    }
    if features.system_prompt.trim().is_empty() {
        return Err(validation_err("features.system_prompt cannot be empty"));
    }
    Ok(())
}
