/// Erros do registro de códigos.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Código desconhecido, já consumido ou já expirado. Os três casos são
    /// indistinguíveis de propósito.
    #[error("código inválido ou expirado")]
    InvalidOrExpiredCode,
    #[error("falha na transferência: {0}")]
    TransferFailed(#[source] std::io::Error),
    #[error("espaço de códigos esgotado")]
    RegistryExhausted,
}

/// Erros de parsing da política de expiração.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("política desconhecida: {0}")]
    Unknown(String),
}

/// Result type alias.
pub type RegistryResult<T> = Result<T, RegistryError>;
