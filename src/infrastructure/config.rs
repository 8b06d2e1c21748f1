use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub providers: ProviderSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub waqi_token: String,
    pub gemini_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub capacity: usize,
}

pub fn load_service_config() -> anyhow::Result<ServiceConfig> {
    let settings = config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8000")?
        .set_default(
            "server.cors_origins",
            vec!["http://localhost:5173", "http://localhost:3000"],
        )?
        .set_default("database.url", "postgres://localhost/airwatch")?
        // WAQI's public demo token works for smoke testing only.
        .set_default("providers.waqi_token", "demo")?
        .set_default("providers.gemini_key", "")?
        .set_default("cache.ttl_secs", 600)?
        .set_default("cache.capacity", 1000)?
        .add_source(config::File::with_name("config/service").required(false))
        .add_source(config::Environment::with_prefix("AIRWATCH").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_a_config_file() {
        let config = load_service_config().unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.cache.ttl_secs, 600);
        assert_eq!(config.cache.capacity, 1000);
        assert_eq!(config.server.cors_origins.len(), 2);
    }
}
