use thiserror::Error;

/// Rejected [crate::parameters::ParametersLiteral].
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("invalid log_n: log_n={0} not in [{min}, {max}]", min = crate::parameters::MIN_LOG_N, max = crate::parameters::MAX_LOG_N)]
    LogN(usize),

    #[error("invalid log_slots: log_slots={log_slots} > log_n-1={max}")]
    LogSlots { log_slots: usize, max: usize },

    #[error("invalid log_scale: log_scale={log_scale} not in [{min}, {max}]")]
    LogScale {
        log_scale: usize,
        min: usize,
        max: usize,
    },

    #[error("invalid log_base2k: log_base2k={0} not in [1, 30]")]
    LogBase2k(usize),

    #[error("invalid xe: xe={0} must be finite and positive")]
    Sigma(f64),

    #[error("invalid xs: xs={xs} not in [1, n={n}]")]
    HammingWeight { xs: usize, n: usize },

    #[error("unknown parameter preset `{0}`")]
    UnknownPreset(String),
}

/// Failure of an encoding or homomorphic operation.
#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("scale mismatch: lhs log_scale={lhs} != rhs log_scale={rhs}")]
    ScaleMismatch { lhs: usize, rhs: usize },

    #[error("scale overflow: log_scale={log_scale} > max={max}")]
    ScaleOverflow { log_scale: usize, max: usize },

    #[error("ring degree mismatch: expected n={expected}, got n={actual}")]
    DegreeMismatch { expected: usize, actual: usize },

    #[error("modulus mismatch: expected residues mod {expected} primes, got {actual}")]
    ModulusMismatch { expected: usize, actual: usize },

    #[error("missing rotation key for rotation {rotation} (galois element {gal_el})")]
    MissingRotationKey { rotation: i64, gal_el: usize },

    #[error("too many values: {len} > {slots} slots")]
    TooManyValues { len: usize, slots: usize },

    #[error("value {value} at slot {index} cannot be encoded at log_scale={log_scale}")]
    ValueOutOfRange {
        index: usize,
        value: f64,
        log_scale: usize,
    },
}
