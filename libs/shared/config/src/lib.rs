use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub appointments_file: String,
    pub read_only_fs: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| {
                    warn!("PORT not set or invalid, using 3000");
                    3000
                }),
            appointments_file: env::var("APPOINTMENTS_FILE")
                .unwrap_or_else(|_| "data/appointments.json".to_string()),
            read_only_fs: env::var("READ_ONLY_FS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}
