use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config::load_layered;
use service_core::error::AppError;
use std::time::Duration;

pub const LIVE_URL: &str = "https://oplata.md";
pub const TEST_URL: &str = "https://dev.oplata.md";

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub oplata: OplataConfig,
    pub checkout: CheckoutConfig,
    pub log_level: String,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Merchant account settings for the OPLATA.MD gateway.
#[derive(Deserialize, Clone, Debug)]
pub struct OplataConfig {
    /// Merchant account name (`projectsTitle`).
    pub project_title: String,
    pub secret_key: Secret<String>,
    /// Use the sandbox endpoint instead of production.
    pub test_mode: bool,
    pub ssl_verify: bool,
    pub live_url: String,
    pub test_url: String,
    pub request_timeout_secs: u64,
    /// Hosted page language; only `ru` and `ro` exist.
    pub language: String,
}

/// Shopper-facing text and store-level settings.
#[derive(Deserialize, Clone, Debug)]
pub struct CheckoutConfig {
    pub title: String,
    pub description: String,
    pub instructions: String,
    /// Currency the store prices in.
    pub store_currency: String,
    /// Externally reachable base URL of this service, used for receipt links.
    pub public_base_url: String,
}

impl OplataConfig {
    /// Sandbox URL in test mode, production otherwise.
    pub fn base_url(&self) -> &str {
        if self.test_mode {
            &self.test_url
        } else {
            &self.live_url
        }
    }

    pub fn language(&self) -> &'static str {
        if self.language.eq_ignore_ascii_case("ru") {
            "ru"
        } else {
            "ro"
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_configured(&self) -> bool {
        !self.project_title.is_empty() && !self.secret_key.expose_secret().is_empty()
    }
}

const DEFAULTS: &[(&str, &str)] = &[
    ("server.host", "0.0.0.0"),
    ("server.port", "3003"),
    ("oplata.project_title", "demoshop"),
    ("oplata.secret_key", ""),
    ("oplata.test_mode", "false"),
    ("oplata.ssl_verify", "true"),
    ("oplata.live_url", LIVE_URL),
    ("oplata.test_url", TEST_URL),
    ("oplata.request_timeout_secs", "30"),
    ("oplata.language", "ro"),
    ("checkout.title", "OPLATA.MD"),
    ("checkout.description", "Оплата с помощью oplata.md."),
    ("checkout.instructions", "Оплата с помощью oplata.md."),
    ("checkout.store_currency", "MDL"),
    ("checkout.public_base_url", "http://localhost:3003"),
    ("log_level", "info,oplata_service=debug"),
    ("service_name", "oplata-service"),
];

impl Config {
    /// Load from `configuration.*` and `OPLATA__*` environment variables,
    /// e.g. `OPLATA__OPLATA__SECRET_KEY` or `OPLATA__SERVER__PORT`.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("configuration", "OPLATA")
    }

    pub fn load_from(file_name: &str, env_prefix: &str) -> Result<Self, AppError> {
        load_layered(file_name, env_prefix, DEFAULTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oplata(test_mode: bool) -> OplataConfig {
        OplataConfig {
            project_title: "demoshop".to_string(),
            secret_key: Secret::new("950856916534772".to_string()),
            test_mode,
            ssl_verify: true,
            live_url: LIVE_URL.to_string(),
            test_url: TEST_URL.to_string(),
            request_timeout_secs: 30,
            language: "ru".to_string(),
        }
    }

    #[test]
    fn base_url_follows_test_flag() {
        assert_eq!(oplata(true).base_url(), "https://dev.oplata.md");
        assert_eq!(oplata(false).base_url(), "https://oplata.md");
    }

    #[test]
    fn unknown_language_falls_back_to_romanian() {
        let mut config = oplata(false);
        assert_eq!(config.language(), "ru");
        config.language = "en".to_string();
        assert_eq!(config.language(), "ro");
    }

    #[test]
    fn empty_secret_is_not_configured() {
        let mut config = oplata(false);
        assert!(config.is_configured());
        config.secret_key = Secret::new(String::new());
        assert!(!config.is_configured());
    }

    #[test]
    fn load_uses_plugin_defaults() {
        let config = Config::load_from("does-not-exist", "OPLATA_TEST_UNSET").unwrap();
        assert_eq!(config.oplata.project_title, "demoshop");
        assert!(config.oplata.ssl_verify);
        assert_eq!(config.checkout.store_currency, "MDL");
    }
}
