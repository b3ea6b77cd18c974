use std::env;

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        let raw = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Self {
        let allowed_origins = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self { allowed_origins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_skips_blanks() {
        let cfg = CorsConfig::parse(" https://dash.example.com ,, http://localhost:5173");
        assert_eq!(
            cfg.allowed_origins,
            vec!["https://dash.example.com", "http://localhost:5173"]
        );
    }
}
