use rand::Rng;

use zipkey_common::{CODE_MAX, CODE_MIN};

/// Gera um código numérico de 6 dígitos, uniforme em `[100000, 999999]`.
///
/// Não garante unicidade; o `Registry` re-sorteia em caso de colisão.
pub fn generate_code() -> String {
    rand::rng().random_range(CODE_MIN..=CODE_MAX).to_string()
}
