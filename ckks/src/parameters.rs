use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::encoding::Encoder;
use crate::error::ParameterError;
use crate::ring_rns::RingRNS;

/// q_0 = 2^61 - 2^21 + 1, prime and 1 mod 2^21.
pub const Q0: u64 = 0x1fff_ffff_ffe0_0001;
/// q_1 = 2^61 - 2^24 + 1, prime and 1 mod 2^24.
pub const Q1: u64 = 0x1fff_ffff_ff00_0001;
/// Ciphertext modulus Q = q_0 * q_1, kept in RNS form.
pub const Q: [u64; 2] = [Q0, Q1];
/// Bit size of Q.
pub const LOG_Q: usize = 122;
pub const DEFAULT_SIGMA: f64 = 3.2;
pub(crate) const SIX_SIGMA: f64 = 6.0;

pub const MIN_LOG_N: usize = 3;
pub const MAX_LOG_N: usize = 17;
pub const MIN_LOG_SCALE: usize = 8;
/// A product of two ciphertexts is at scale 2^(2*log_scale), which leaves
/// LOG_Q - 1 - 2*log_scale >= 41 bits for the magnitude of the result.
pub const MAX_LOG_SCALE: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParametersLiteral {
    /// Ring degree n = 2^log_n.
    pub log_n: usize,
    /// Slot capacity S = 2^log_slots <= n/2.
    pub log_slots: usize,
    /// Encoding scale 2^log_scale.
    pub log_scale: usize,
    /// Gadget decomposition base of the relinearization and rotation keys.
    pub log_base2k: usize,
    /// Standard deviation of the error.
    pub xe: f64,
    /// Hamming weight of the secret.
    pub xs: usize,
}

impl ParametersLiteral {
    pub const PN12: ParametersLiteral = ParametersLiteral {
        log_n: 12,
        log_slots: 11,
        log_scale: 40,
        log_base2k: 16,
        xe: DEFAULT_SIGMA,
        xs: 192,
    };

    pub const PN13: ParametersLiteral = ParametersLiteral {
        log_n: 13,
        log_slots: 12,
        log_scale: 40,
        log_base2k: 16,
        xe: DEFAULT_SIGMA,
        xs: 192,
    };

    pub const PN14: ParametersLiteral = ParametersLiteral {
        log_n: 14,
        log_slots: 13,
        log_scale: 40,
        log_base2k: 16,
        xe: DEFAULT_SIGMA,
        xs: 192,
    };

    pub const PN15: ParametersLiteral = ParametersLiteral {
        log_n: 15,
        log_slots: 14,
        log_scale: 40,
        log_base2k: 16,
        xe: DEFAULT_SIGMA,
        xs: 192,
    };

    /// Insecure, small ring used by tests and local dry runs.
    pub const TOY: ParametersLiteral = ParametersLiteral {
        log_n: 6,
        log_slots: 5,
        log_scale: 40,
        log_base2k: 8,
        xe: DEFAULT_SIGMA,
        xs: 16,
    };

    pub fn preset(name: &str) -> Result<ParametersLiteral, ParameterError> {
        match name.to_ascii_lowercase().as_str() {
            "pn12" => Ok(Self::PN12),
            "pn13" => Ok(Self::PN13),
            "pn14" => Ok(Self::PN14),
            "pn15" => Ok(Self::PN15),
            "toy" => Ok(Self::TOY),
            _ => Err(ParameterError::UnknownPreset(name.to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        if !(MIN_LOG_N..=MAX_LOG_N).contains(&self.log_n) {
            return Err(ParameterError::LogN(self.log_n));
        }
        if self.log_slots >= self.log_n {
            return Err(ParameterError::LogSlots {
                log_slots: self.log_slots,
                max: self.log_n - 1,
            });
        }
        if !(MIN_LOG_SCALE..=MAX_LOG_SCALE).contains(&self.log_scale) {
            return Err(ParameterError::LogScale {
                log_scale: self.log_scale,
                min: MIN_LOG_SCALE,
                max: MAX_LOG_SCALE,
            });
        }
        if !(1..=30).contains(&self.log_base2k) {
            return Err(ParameterError::LogBase2k(self.log_base2k));
        }
        if !(self.xe.is_finite() && self.xe > 0.0) {
            return Err(ParameterError::Sigma(self.xe));
        }
        if self.xs == 0 || self.xs > 1 << self.log_n {
            return Err(ParameterError::HammingWeight {
                xs: self.xs,
                n: 1 << self.log_n,
            });
        }
        Ok(())
    }
}

/// Validated parameters with their precomputed ring and encoder.
///
/// Cloning is cheap: the tables are shared.
#[derive(Clone)]
pub struct Parameters {
    literal: ParametersLiteral,
    ring: Arc<RingRNS>,
    encoder: Arc<Encoder>,
}

impl Parameters {
    /// Panics on an invalid literal, see [Parameters::try_new].
    pub fn new(p: &ParametersLiteral) -> Self {
        match Self::try_new(p) {
            Ok(params) => params,
            Err(e) => panic!("invalid parameters: {}", e),
        }
    }

    pub fn try_new(p: &ParametersLiteral) -> Result<Self, ParameterError> {
        p.validate()?;
        Ok(Self {
            literal: *p,
            ring: Arc::new(RingRNS::new(p.log_n, &Q)),
            encoder: Arc::new(Encoder::new(p.log_n, p.log_slots)),
        })
    }

    pub fn literal(&self) -> &ParametersLiteral {
        &self.literal
    }

    pub fn ring(&self) -> &RingRNS {
        &self.ring
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn n(&self) -> usize {
        1 << self.literal.log_n
    }

    pub fn log_n(&self) -> usize {
        self.literal.log_n
    }

    pub fn slots(&self) -> usize {
        1 << self.literal.log_slots
    }

    pub fn log_slots(&self) -> usize {
        self.literal.log_slots
    }

    pub fn log_scale(&self) -> usize {
        self.literal.log_scale
    }

    pub fn log_base2k(&self) -> usize {
        self.literal.log_base2k
    }

    pub fn xe(&self) -> f64 {
        self.literal.xe
    }

    pub fn xs(&self) -> usize {
        self.literal.xs
    }

    /// Largest scale a ciphertext may carry.
    pub fn max_log_scale(&self) -> usize {
        2 * MAX_LOG_SCALE
    }

    /// Largest |value| a ciphertext at scale 2^log_scale can hold before it
    /// wraps around Q.
    pub fn max_magnitude(&self, log_scale: usize) -> f64 {
        ((LOG_Q - 2) as f64 - log_scale as f64).exp2()
    }

    /// Number of gadget rows of a switching key, digits of every prime.
    pub fn digits(&self) -> usize {
        self.ring.gadget_rows(self.literal.log_base2k)
    }

    /// Byte length of one serialized ciphertext.
    pub fn ciphertext_bytes(&self) -> usize {
        crate::ciphertext::Ciphertext::serialized_len(self.literal.log_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        ["pn12", "PN13", "pn14", "pn15", "toy"]
            .iter()
            .for_each(|name| assert!(ParametersLiteral::preset(name).unwrap().validate().is_ok()));
        assert_eq!(
            ParametersLiteral::preset("pn99"),
            Err(ParameterError::UnknownPreset("pn99".to_string()))
        );
    }

    #[test]
    fn rejects_invalid_literals() {
        let mut p: ParametersLiteral = ParametersLiteral::TOY;
        p.log_slots = p.log_n;
        assert!(matches!(
            Parameters::try_new(&p),
            Err(ParameterError::LogSlots { .. })
        ));

        let mut p: ParametersLiteral = ParametersLiteral::TOY;
        p.log_scale = MAX_LOG_SCALE + 1;
        assert!(matches!(
            Parameters::try_new(&p),
            Err(ParameterError::LogScale { .. })
        ));

        let mut p: ParametersLiteral = ParametersLiteral::TOY;
        p.xs = 0;
        assert!(matches!(
            Parameters::try_new(&p),
            Err(ParameterError::HammingWeight { .. })
        ));
    }

    #[test]
    fn ciphertext_bytes() {
        let params: Parameters = Parameters::new(&ParametersLiteral::TOY);
        assert_eq!(params.ciphertext_bytes(), 16 + 2 * 2 * 8 * 64);
        assert_eq!(params.digits(), 16);
        assert_eq!(params.ring().log_modulus(), LOG_Q);
    }

    #[test]
    fn product_headroom() {
        let params: Parameters = Parameters::new(&ParametersLiteral::PN12);
        assert_eq!(params.max_log_scale(), 80);
        assert_eq!(params.max_magnitude(params.max_log_scale()), (40f64).exp2());
    }
}
