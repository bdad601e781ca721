use crate::config::types::{
    Config, CrawlerConfig, DnsConfig, HttpConfig, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_http_config(&config.http)?;
    validate_dns_config(&config.dns)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_seed_domain(&config.seed_domain)?;

    if let Some(prefix) = &config.seed_prefix {
        validate_seed_prefix(prefix)?;
    }

    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.max_active_pages < 1 || config.max_active_pages > 100 {
        return Err(ConfigError::Validation(format!(
            "max_active_pages must be between 1 and 100, got {}",
            config.max_active_pages
        )));
    }

    if config.politeness_window < 100 {
        return Err(ConfigError::Validation(format!(
            "politeness_window must be >= 100ms, got {}ms",
            config.politeness_window
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    // The name doubles as the robots.txt product token
    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(version) = &config.crawler_version {
        if version.is_empty() || version.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "crawler_version must be a non-empty token, got '{}'",
                version
            )));
        }
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.port == 0 {
        return Err(ConfigError::Validation("http port cannot be 0".to_string()));
    }

    if config.timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 100ms, got {}ms",
            config.timeout
        )));
    }

    if config.max_redirects < 1 || config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be between 1 and 20, got {}",
            config.max_redirects
        )));
    }

    if config.max_response_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_response_bytes must be >= 1024, got {}",
            config.max_response_bytes
        )));
    }

    Ok(())
}

/// Validates DNS configuration
fn validate_dns_config(config: &DnsConfig) -> Result<(), ConfigError> {
    if config.port == 0 {
        return Err(ConfigError::Validation("dns port cannot be 0".to_string()));
    }

    config.nameserver_addr()?;
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if matches!(&config.database_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed domain, which may carry an explicit `:port`
fn validate_seed_domain(domain: &str) -> Result<(), ConfigError> {
    let host = match domain.rsplit_once(':') {
        Some((host, port)) => {
            port.parse::<u16>().map_err(|_| {
                ConfigError::Validation(format!("Seed domain '{}' has an invalid port", domain))
            })?;
            host
        }
        None => domain,
    };

    validate_domain_string(host)
}

/// Validates a domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Validates the seed path prefix
fn validate_seed_prefix(prefix: &str) -> Result<(), ConfigError> {
    if !prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "seed_prefix must start with '/', got '{}'",
            prefix
        )));
    }

    // Routes always start with '/', so a trailing slash would double it
    if prefix.len() > 1 && prefix.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "seed_prefix must not end with '/', got '{}'",
            prefix
        )));
    }

    Ok(())
}
