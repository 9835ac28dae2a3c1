#![forbid(unsafe_code)]

mod error;

pub use error::*;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";
pub const DEFAULT_REAP_INTERVAL_SECS: u64 = 60 * 60; // 1 hora
pub const DEFAULT_MAX_UPLOAD_MB: usize = 100;

/// Menor e maior código possível (6 dígitos).
pub const CODE_MIN: u32 = 100_000;
pub const CODE_MAX: u32 = 999_999;
/// Total de códigos distintos.
pub const CODE_SPACE: usize = (CODE_MAX - CODE_MIN + 1) as usize;
/// Tentativas de geração antes de desistir com `RegistryExhausted`.
pub const MAX_CODE_ATTEMPTS: usize = 64;

/// Janela de validade de um código `once` nunca resgatado.
pub const ONE_TIME_GRACE_HOURS: i64 = 7 * 24;
