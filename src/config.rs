use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Connection settings for the remote media store. `client_id` is the
/// credential sent as `Authorization: Client-ID <id>` on every request.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub base_url: String,
    pub client_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "picstash".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "picstash-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let media = MediaConfig {
            base_url: std::env::var("MEDIA_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.imgur.com".into()),
            client_id: std::env::var("MEDIA_CLIENT_ID")?,
            timeout_secs: std::env::var("MEDIA_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(8),
        };
        Ok(Self {
            database_url,
            jwt,
            media,
        })
    }
}
