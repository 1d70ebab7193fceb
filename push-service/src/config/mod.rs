use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub vapid: VapidConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// VAPID sender identity material.
///
/// Both keys are required; a process without them cannot sign requests,
/// so absence is fatal at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VapidConfig {
    /// Private key: PEM PKCS#8 container or raw base64url P-256 scalar.
    pub private_key: String,
    /// Public key: base64url uncompressed P-256 point (65 bytes).
    pub public_key: String,
    /// Contact identifier embedded in every token (mailto URI).
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// PEM public key used to verify caller bearer tokens (ES256).
    pub jwt_public_key_pem: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: std::env::var("APP_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            vapid: VapidConfig {
                private_key: std::env::var("VAPID_PRIVATE_KEY")?,
                public_key: std::env::var("VAPID_PUBLIC_KEY")?,
                subject: std::env::var("VAPID_SUBJECT")
                    .unwrap_or_else(|_| "mailto:push@example.com".to_string()),
            },
            auth: AuthConfig {
                jwt_public_key_pem: std::env::var("JWT_PUBLIC_KEY_PEM")?,
            },
        })
    }
}
