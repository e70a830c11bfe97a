//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::{Config, StrategySpec};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_predictor(config)?;
    validate_backstop(config)?;
    validate_selection(config)?;
    validate_policies(config)?;
    debug!("configuration validation passed");
    Ok(())
}

/// Check that a confidence threshold lies in [0, 1]
pub fn validate_threshold(field: &str, threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigError::invalid(field, format!("{} is outside [0, 1]", threshold)).into());
    }
    Ok(())
}

fn validate_predictor(config: &Config) -> Result<()> {
    let predictor = &config.predictor;
    if let Err(e) = url::Url::parse(&predictor.base_url) {
        return Err(ConfigError::invalid("predictor.base_url", e.to_string()).into());
    }

    if predictor.retry_interval_secs == 0 {
        return Err(
            ConfigError::invalid("predictor.retry_interval_secs", "must be positive").into(),
        );
    }

    if predictor.timeout_secs < predictor.retry_interval_secs {
        return Err(ConfigError::invalid(
            "predictor.timeout_secs",
            "must be at least predictor.retry_interval_secs",
        )
        .into());
    }

    Ok(())
}

fn validate_backstop(config: &Config) -> Result<()> {
    // Expanded pushes land on half the interval
    if config.backstop.push_interval < 2 {
        return Err(ConfigError::invalid("backstop.push_interval", "must be at least 2").into());
    }
    if config
        .backstop
        .remove_on_projects
        .as_ref()
        .is_some_and(|projects| projects.iter().any(String::is_empty))
    {
        return Err(ConfigError::invalid(
            "backstop.remove_on_projects",
            "project names cannot be empty",
        )
        .into());
    }
    Ok(())
}

fn validate_selection(config: &Config) -> Result<()> {
    validate_threshold("selection.default_threshold", config.selection.default_threshold)
}

fn validate_policies(config: &Config) -> Result<()> {
    if !config.policies.is_empty() {
        debug!(count = config.policies.len(), "validating policies");
    }
    for (i, policy) in config.policies.iter().enumerate() {
        if policy.project.is_empty() {
            return Err(ConfigError::invalid(
                format!("policies[{}].project", i),
                "project cannot be empty",
            )
            .into());
        }

        if policy.purpose.is_empty() {
            return Err(ConfigError::invalid(
                format!("policies[{}].purpose", i),
                "purpose cannot be empty",
            )
            .into());
        }

        if let Some(message) = empty_composite(&policy.strategy) {
            return Err(ConfigError::invalid(format!("policies[{}].strategy", i), message).into());
        }
    }

    Ok(())
}

fn empty_composite(spec: &StrategySpec) -> Option<&'static str> {
    match spec {
        StrategySpec::Named(name) if name.is_empty() => Some("strategy name cannot be empty"),
        StrategySpec::Named(_) => None,
        StrategySpec::Any { any: children } | StrategySpec::All { all: children } => {
            if children.is_empty() {
                Some("composite strategies need at least one child")
            } else {
                children.iter().find_map(empty_composite)
            }
        }
        StrategySpec::Not { not } => empty_composite(not),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::PolicyConfig;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.predictor.base_url = "not a url".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(validate_threshold("t", 0.0).is_ok());
        assert!(validate_threshold("t", 1.0).is_ok());
        assert!(validate_threshold("t", -0.1).is_err());
        assert!(validate_threshold("t", 1.5).is_err());
        assert!(validate_threshold("t", f64::NAN).is_err());
    }

    #[test]
    fn test_timeout_shorter_than_interval() {
        let mut config = Config::default();
        config.predictor.timeout_secs = 5;
        config.predictor.retry_interval_secs = 10;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_backstop_interval_must_allow_expanded_pushes() {
        let mut config = Config::default();
        config.backstop.push_interval = 1;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("backstop.push_interval"));

        config.backstop.push_interval = 2;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_remove_on_project_rejected() {
        let mut config = Config::default();
        config.backstop.remove_on_projects = Some(vec![String::new()]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_composite_rejected() {
        let mut config = Config::default();
        config.policies.push(PolicyConfig {
            project: "autoland".to_string(),
            purpose: "test".to_string(),
            strategy: StrategySpec::Not {
                not: Box::new(StrategySpec::Any { any: vec![] }),
            },
        });
        assert!(validate_config(&config).is_err());
    }
}
