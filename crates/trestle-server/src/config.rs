use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub max_body_bytes: usize,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4000".to_string(),
            db_path: PathBuf::from("trestle.db"),
            max_body_bytes: 5 * 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("TRESTLE_BIND_ADDR") {
            cfg.bind_addr = v;
        }
        if let Ok(v) = env::var("TRESTLE_DB_PATH") {
            cfg.db_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("TRESTLE_MAX_BODY_BYTES") {
            if let Ok(n) = v.parse() {
                cfg.max_body_bytes = n;
            }
        }
        if let Ok(v) = env::var("TRESTLE_LOG") {
            cfg.log_level = v;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: these share process-wide env vars, so splitting them
    // would race under the parallel test runner.
    #[test]
    fn env_vars_override_defaults() {
        env::set_var("TRESTLE_BIND_ADDR", "0.0.0.0:9999");
        env::set_var("TRESTLE_DB_PATH", "/tmp/elsewhere.db");
        env::set_var("TRESTLE_MAX_BODY_BYTES", "1234");

        let cfg = ServerConfig::from_env();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9999");
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/elsewhere.db"));
        assert_eq!(cfg.max_body_bytes, 1234);

        env::set_var("TRESTLE_MAX_BODY_BYTES", "not-a-number");
        let cfg = ServerConfig::from_env();
        assert_eq!(cfg.max_body_bytes, ServerConfig::default().max_body_bytes);

        env::remove_var("TRESTLE_BIND_ADDR");
        env::remove_var("TRESTLE_DB_PATH");
        env::remove_var("TRESTLE_MAX_BODY_BYTES");
    }
}
