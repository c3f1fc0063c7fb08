use base64::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixCoreError {
    #[error("Valor inválido. Envie 'value' em centavos (> 0).")]
    InvalidAmount(serde_json::Value),

    #[error("Corpo da requisição inválido: {0}")]
    InvalidRequestBody(#[from] serde_json::Error),

    #[error("Base64DecodeError {0}")]
    Base64DecodeError(#[from] DecodeError),

    #[error("Invalid data url: {0}")]
    InvalidDataUrl(String),
}
