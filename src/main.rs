//src/main.rs

use std::path::PathBuf;

use anyhow::Context;
use axum::{
    Json, Router,
    routing::{delete, get},
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::services::import_service;

enum Command {
    Serve,
    Import(PathBuf),
}

fn parse_command(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    match args.next().as_deref() {
        None | Some("serve") => Ok(Command::Serve),
        Some("import") => {
            let path = args.next().context("uso: sales-dashboard import <arquivo.csv>")?;
            Ok(Command::Import(PathBuf::from(path)))
        }
        Some(other) => anyhow::bail!("comando desconhecido: '{}' (use 'serve' ou 'import')", other),
    }
}

fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok", "db": "postgres" })) }))
        .route("/api/sales", get(handlers::sales::get_sales))
        .route("/api/sales/filters", get(handlers::sales::get_filters))
        .route("/api/sales/cache", delete(handlers::sales::invalidate_cache))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let command = parse_command(std::env::args().skip(1))?;
    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // Migrações rodam tanto no servidor quanto na importação
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Command::Import(path) = command {
        import_service::import_file(&app_state.db_pool, &app_state.sales_repo, &path).await?;
        return Ok(());
    }

    tracing::info!("🔎 Modo de consulta: {:?}", app_state.sales_service.mode());

    let app = router(app_state);

    let listener = TcpListener::bind(&settings.server_addr)
        .await
        .with_context(|| format!("Falha ao escutar em {}", settings.server_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn no_arguments_means_serve() {
        assert!(matches!(parse_command(args(&[])).unwrap(), Command::Serve));
        assert!(matches!(parse_command(args(&["serve"])).unwrap(), Command::Serve));
    }

    #[test]
    fn import_requires_a_path() {
        match parse_command(args(&["import", "data/sales.csv"])).unwrap() {
            Command::Import(path) => assert_eq!(path, PathBuf::from("data/sales.csv")),
            Command::Serve => panic!("esperava import"),
        }
        assert!(parse_command(args(&["import"])).is_err());
        assert!(parse_command(args(&["export"])).is_err());
    }
}
