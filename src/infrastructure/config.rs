pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LOCATION_SLOTS: u32 = 45;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    /// Number of `Compartment N` locations created at startup
    pub default_location_slots: u32,
    pub seed_demo: bool,
}

impl Config {
    /// Build a config from any key lookup (env, test map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = lookup("PROFILE").unwrap_or_else(|| "default".to_string());

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            if profile == "default" {
                "sqlite://libdesk.db?mode=rwc".to_string()
            } else {
                format!("sqlite://libdesk_{}.db?mode=rwc", profile)
            }
        });

        Self {
            database_url,
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            default_location_slots: lookup("DEFAULT_LOCATION_SLOTS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(DEFAULT_LOCATION_SLOTS),
            seed_demo: lookup("SEED_DEMO").is_some(),
            profile,
        }
    }
}
