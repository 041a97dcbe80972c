use std::env;

/// API keys for the external food services. A missing key disables the
/// providers that need it.
#[derive(Debug, Clone, Default)]
pub struct FoodConfig {
    pub spoonacular_api_key: Option<String>,
    pub logmeal_api_key: Option<String>,
    pub usda_api_key: Option<String>,
}

impl FoodConfig {
    pub fn from_env() -> Self {
        Self {
            spoonacular_api_key: read_key("SPOONACULAR_API_KEY"),
            logmeal_api_key: read_key("LOGMEAL_API_KEY"),
            usda_api_key: read_key("USDA_API_KEY"),
        }
    }

    pub fn has_any_key(&self) -> bool {
        self.spoonacular_api_key.is_some() || self.logmeal_api_key.is_some() || self.usda_api_key.is_some()
    }
}

fn read_key(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(key) if !key.trim().is_empty() => Some(key.trim().to_string()),
        _ => {
            log::warn!("{} environment variable not set, provider disabled", name);
            None
        }
    }
}
