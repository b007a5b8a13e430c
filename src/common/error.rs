// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Parâmetros malformados nunca chegam aqui: o normalizador os absorve.
// Tudo o que sobra é falha de infraestrutura e vira 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro na importação: {0}")]
    ImportError(String),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::ImportError(err.to_string())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // O detalhe fica só no log, o cliente recebe uma mensagem genérica.
        tracing::error!(error = %self, "Erro Interno do Servidor");

        let body = Json(json!({ "error": "Internal server error" }));
        (status, body).into_response()
    }
}
