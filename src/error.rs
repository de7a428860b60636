//! Error types for grammar loading and frame-driver commands.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LSystemError {
    #[error("start symbol is empty")]
    EmptyStart,

    #[error("rule key `{0}` must be exactly one symbol")]
    MultiSymbolRuleKey(String),

    #[error("parameter `{0}` is not finite")]
    NonFiniteParameter(&'static str),

    #[error("particle lifetime {0} must be positive")]
    NonPositiveLifetime(f32),

    #[error("iteration count {requested} is outside 0..={max}")]
    IterationsOutOfRange { requested: i64, max: u32 },
}

pub type Result<T> = std::result::Result<T, LSystemError>;
