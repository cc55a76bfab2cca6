use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cyder_tools::log::error;
use thiserror::Error;

use crate::utils::HttpResult;

#[derive(Debug, Error)]
pub enum BaseError {
    #[error("Erro: coxo_id, Data e Usuário são obrigatórios.")]
    MissingFields,
    #[error("Erro: parâmetros inválidos.")]
    ParamInvalid,
    #[error("Erro de conexão: {0}")]
    Connection(String),
    #[error("Erro na preparação da consulta: {0}")]
    Prepare(String),
    #[error("Erro ao registrar: {0}")]
    Insert(String),
    #[error("Erro ao consultar: {0}")]
    Query(String),
    #[error("Exception: {0}")]
    Internal(String),
}

impl BaseError {
    /// Faults that escaped normal request handling and are reported as server errors.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BaseError::Internal(_))
    }

    pub fn status(&self) -> StatusCode {
        if self.is_fatal() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            // clients only look at the `success` flag
            StatusCode::OK
        }
    }
}

impl IntoResponse for BaseError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, HttpResult::failure(self.to_string())).into_response()
    }
}

/// Turns a panic caught by the boundary layer into the standard failure envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("request handler panicked: {}", detail);
    BaseError::Internal(detail).into_response()
}
