use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use tracing::warn;

use zipkey_common::{ONE_TIME_GRACE_HOURS, PolicyError};

/// Regra de expiração/consumo escolhida no upload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Downloads ilimitados por 24 horas.
    #[default]
    Hours24,
    /// Downloads ilimitados por 48 horas.
    Hours48,
    /// Um único download; expira após a janela de carência se nunca resgatado.
    OneTime,
}

impl Policy {
    /// Interpreta o valor do formulário de upload.
    ///
    /// Valor ausente ou desconhecido cai em `Hours24`, nunca num registro sem
    /// prazo.
    pub fn from_form(value: Option<&str>) -> Self {
        match value {
            Some(v) => v.parse().unwrap_or_else(|e| {
                warn!("{e}, usando {}", Policy::default());
                Policy::default()
            }),
            None => {
                warn!("política ausente, usando {}", Policy::default());
                Policy::default()
            }
        }
    }

    /// Tempo de vida a partir da criação.
    pub fn lifetime(self) -> TimeDelta {
        match self {
            Policy::Hours24 => TimeDelta::hours(24),
            Policy::Hours48 => TimeDelta::hours(48),
            Policy::OneTime => TimeDelta::hours(ONE_TIME_GRACE_HOURS),
        }
    }

    pub fn is_one_time(self) -> bool {
        matches!(self, Policy::OneTime)
    }

    /// Valor usado no formulário.
    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Hours24 => "24h",
            Policy::Hours48 => "48h",
            Policy::OneTime => "once",
        }
    }
}

impl FromStr for Policy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(Policy::Hours24),
            "48h" => Ok(Policy::Hours48),
            "once" => Ok(Policy::OneTime),
            other => Err(PolicyError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
