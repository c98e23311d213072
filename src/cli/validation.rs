//! `value_parser` functions for arguments clap cannot check by type alone.

use std::net::IpAddr;
use std::path::PathBuf;

const MAX_ROLLBACK_STEPS: u32 = 100;

pub fn validate_port(raw: &str) -> Result<u16, String> {
    match raw.parse::<u16>() {
        Ok(0) => Err("Port must be between 1 and 65535.".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!("Port must be a number between 1 and 65535, got '{}'.", raw)),
    }
}

/// The file must exist and be readable.
pub fn validate_config_file_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if !path.is_file() {
        return Err(format!("Configuration file does not exist: '{}'", raw));
    }
    std::fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("Cannot read configuration file '{}': {}", raw, e))
}

pub fn validate_rollback_steps(raw: &str) -> Result<u32, String> {
    let steps: u32 = raw
        .parse()
        .map_err(|_| format!("Rollback steps must be a positive number, got '{}'.", raw))?;
    if steps == 0 || steps > MAX_ROLLBACK_STEPS {
        return Err(format!("Rollback steps must be between 1 and {}.", MAX_ROLLBACK_STEPS));
    }
    Ok(steps)
}

/// Accepts IP literals, `localhost` and RFC 1123 host names.
pub fn validate_host_address(raw: &str) -> Result<String, String> {
    let host = raw.trim();
    if host.is_empty() {
        return Err("Host address cannot be empty.".to_string());
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(format!("Invalid IPv4 address: '{}'", host));
    }

    let valid_label = |label: &str| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    if host.len() > 253 || !host.split('.').all(valid_label) {
        return Err(format!("Invalid host name: '{}'", host));
    }
    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_port_range() {
        for raw in ["1", "8000", "65535"] {
            assert!(validate_port(raw).is_ok(), "{}", raw);
        }
        for raw in ["0", "65536", "-1", "http", ""] {
            assert!(validate_port(raw).is_err(), "{}", raw);
        }
    }

    #[test]
    fn test_rollback_bounds() {
        assert_eq!(validate_rollback_steps("3"), Ok(3));
        assert_eq!(validate_rollback_steps("100"), Ok(100));
        assert!(validate_rollback_steps("0").is_err());
        assert!(validate_rollback_steps("101").is_err());
        assert!(validate_rollback_steps("two").is_err());
    }

    #[test]
    fn test_host_addresses() {
        for raw in ["127.0.0.1", "0.0.0.0", "::1", "localhost", "api.scheme.mw", " db-1 "] {
            assert!(validate_host_address(raw).is_ok(), "{}", raw);
        }
        for raw in ["", "256.1.1.1", "1.2.3", "bad host", "-lead.example", "a..b"] {
            assert!(validate_host_address(raw).is_err(), "{}", raw);
        }
    }

    #[test]
    fn test_config_file_must_exist() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(validate_config_file_path(path).unwrap(), file.path());

        assert!(validate_config_file_path("/definitely/not/here.toml").is_err());
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_config_file_path(dir.path().to_str().unwrap()).is_err());
    }
}
