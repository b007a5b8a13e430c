// src/config.rs

use std::{env, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::SalesRepository,
    services::sales_service::{QueryMode, SalesService},
};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;
const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:5050";

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub server_addr: String,
    pub query_mode: QueryMode,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Separado do ambiente real para os testes não precisarem de set_var.
    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL deve ser definida")?;

        let max_connections = parse_or_default(
            "DATABASE_MAX_CONNECTIONS",
            lookup("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        );
        let acquire_timeout_secs = parse_or_default(
            "DATABASE_ACQUIRE_TIMEOUT_SECS",
            lookup("DATABASE_ACQUIRE_TIMEOUT_SECS"),
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        );

        let server_addr = lookup("SERVER_ADDR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());

        let query_mode = match lookup("SALES_QUERY_MODE").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None => QueryMode::Live,
        };

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            server_addr,
            query_mode,
        })
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} inválido ('{}'), usando {}", key, value, default);
            default
        }),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub sales_repo: SalesRepository,
    pub sales_service: SalesService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let sales_repo = SalesRepository::new();
        let sales_service = SalesService::new(sales_repo.clone(), settings.query_mode);

        Ok(Self {
            db_pool,
            sales_repo,
            sales_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_url_is_set() {
        let s = settings(&[("DATABASE_URL", "postgres://localhost/sales")]).unwrap();
        assert_eq!(s.database_url, "postgres://localhost/sales");
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.acquire_timeout, Duration::from_secs(3));
        assert_eq!(s.server_addr, "0.0.0.0:5050");
        assert_eq!(s.query_mode, QueryMode::Live);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(settings(&[]).is_err());
        assert!(settings(&[("DATABASE_URL", "  ")]).is_err());
    }

    #[test]
    fn overrides_are_read() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://db/sales"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "10"),
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("SALES_QUERY_MODE", "snapshot"),
        ])
        .unwrap();
        assert_eq!(s.max_connections, 20);
        assert_eq!(s.acquire_timeout, Duration::from_secs(10));
        assert_eq!(s.server_addr, "127.0.0.1:8080");
        assert_eq!(s.query_mode, QueryMode::Snapshot);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://db/sales"),
            ("DATABASE_MAX_CONNECTIONS", "muitas"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "-1"),
        ])
        .unwrap();
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_query_mode_is_an_error() {
        let result = settings(&[
            ("DATABASE_URL", "postgres://db/sales"),
            ("SALES_QUERY_MODE", "cached"),
        ]);
        assert!(result.is_err());
    }
}
