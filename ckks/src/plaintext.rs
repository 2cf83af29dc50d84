use crate::error::EvalError;
use crate::parameters::Parameters;
use crate::poly::PolyRNS;

/// Encoded message in the coefficient domain, scaled by 2^log_scale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plaintext {
    pub value: PolyRNS,
    pub log_scale: usize,
}

impl Parameters {
    pub fn new_plaintext(&self) -> Plaintext {
        Plaintext {
            value: self.ring().new_polyrns(),
            log_scale: self.log_scale(),
        }
    }

    /// Encodes at most slots() values at the default scale.
    pub fn encode(&self, values: &[f64]) -> Result<Plaintext, EvalError> {
        self.encode_at(values, self.log_scale())
    }

    pub fn encode_at(&self, values: &[f64], log_scale: usize) -> Result<Plaintext, EvalError> {
        let value: PolyRNS = self.encoder().encode(self.ring(), values, log_scale)?;
        Ok(Plaintext { value, log_scale })
    }

    /// Returns the slots() decoded values of pt.
    pub fn decode(&self, pt: &Plaintext) -> Vec<f64> {
        self.encoder().decode(self.ring(), &pt.value, pt.log_scale)
    }
}
