//! Server configuration, read from the environment at start-up.

use std::path::PathBuf;
use std::str::FromStr;

use shopfront_auth::AuthConfig;
use shopfront_core::pricing::PricingPolicy;
use shopfront_db::DbConfig;
use shopfront_payment::GatewayConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Settings the HTTP layer needs at request time.
#[derive(Debug, Clone)]
pub struct WebSettings {
    /// Base URL of the storefront, used for payment redirects and reset links.
    pub frontend_url: String,
    /// Origin allowed to make credentialed cross-origin requests.
    pub cors_origin: String,
    /// Mark auth cookies `Secure`.
    pub secure_cookies: bool,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".into(),
            cors_origin: "http://localhost:5173".into(),
            secure_cookies: false,
        }
    }
}

/// Administrator account created or promoted at start-up.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    pub pricing: PricingPolicy,
    pub web: WebSettings,
    /// Directory uploaded media is written to.
    pub upload_dir: PathBuf,
    /// Public URL prefix the upload directory is served under.
    pub media_base_url: String,
    pub admin: Option<AdminSeed>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
            db: DbConfig::default(),
            auth: AuthConfig::default(),
            gateway: GatewayConfig::default(),
            pricing: PricingPolicy::default(),
            web: WebSettings::default(),
            upload_dir: PathBuf::from("public/media"),
            media_base_url: "http://localhost:8000/media".into(),
            admin: None,
        }
    }
}

struct Env<F: Fn(&str) -> Option<String>> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, var: &str) -> Option<String> {
        (self.lookup)(var).filter(|v| !v.trim().is_empty())
    }

    fn set(&self, var: &str, target: &mut String) {
        if let Some(value) = self.string(var) {
            *target = value;
        }
    }

    fn parse<T: FromStr>(&self, var: &'static str, target: &mut T) -> Result<(), ConfigError> {
        if let Some(value) = self.string(var) {
            *target = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var, value })?;
        }
        Ok(())
    }
}

impl ServerConfig {
    /// Overlay environment variables on the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup };
        let mut config = Self::default();

        env.set("SHOPFRONT_BIND", &mut config.bind);

        env.set("SHOPFRONT_DB_URL", &mut config.db.url);
        env.set("SHOPFRONT_DB_NAMESPACE", &mut config.db.namespace);
        env.set("SHOPFRONT_DB_DATABASE", &mut config.db.database);
        env.set("SHOPFRONT_DB_USER", &mut config.db.username);
        env.set("SHOPFRONT_DB_PASSWORD", &mut config.db.password);

        config.auth.access_token_secret = env
            .string("ACCESS_TOKEN_SECRET")
            .ok_or(ConfigError::Missing("ACCESS_TOKEN_SECRET"))?;
        config.auth.refresh_token_secret = env
            .string("REFRESH_TOKEN_SECRET")
            .ok_or(ConfigError::Missing("REFRESH_TOKEN_SECRET"))?;
        env.parse("ACCESS_TOKEN_TTL_SECS", &mut config.auth.access_token_lifetime_secs)?;
        env.parse("REFRESH_TOKEN_TTL_SECS", &mut config.auth.refresh_token_lifetime_secs)?;
        config.auth.pepper = env.string("PASSWORD_PEPPER");

        env.set("GATEWAY_KEY_ID", &mut config.gateway.key_id);
        env.set("GATEWAY_KEY_SECRET", &mut config.gateway.key_secret);
        env.set("GATEWAY_BASE_URL", &mut config.gateway.base_url);
        env.set("GATEWAY_CURRENCY", &mut config.gateway.currency);

        env.parse("TAX_RATE", &mut config.pricing.tax_rate)?;
        env.parse("FREE_SHIPPING_THRESHOLD", &mut config.pricing.free_shipping_threshold)?;
        env.parse("FLAT_SHIPPING_FEE", &mut config.pricing.flat_shipping_fee)?;

        env.set("FRONTEND_URL", &mut config.web.frontend_url);
        config.web.cors_origin = env
            .string("CORS_ORIGIN")
            .unwrap_or_else(|| config.web.frontend_url.clone());
        env.parse("COOKIE_SECURE", &mut config.web.secure_cookies)?;

        if let Some(dir) = env.string("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        env.set("MEDIA_BASE_URL", &mut config.media_base_url);

        config.admin = match (env.string("ADMIN_EMAIL"), env.string("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password,
                full_name: env.string("ADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
        };

        Ok(config)
    }
}
