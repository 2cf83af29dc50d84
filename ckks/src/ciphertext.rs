use crate::parameters::{Parameters, Q};
use crate::poly::PolyRNS;

/// RLWE ciphertext (c0, c1) mod Q in the coefficient domain, decrypting to
/// c0 + c1 * s.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Ciphertext {
    pub c0: PolyRNS,
    pub c1: PolyRNS,
    pub log_scale: usize,
}

impl Parameters {
    pub fn new_ciphertext(&self) -> Ciphertext {
        Ciphertext {
            c0: self.ring().new_polyrns(),
            c1: self.ring().new_polyrns(),
            log_scale: self.log_scale(),
        }
    }
}

impl Ciphertext {
    /// Byte length of the serialized form of a ciphertext of degree 2^log_n:
    /// two u64 header words followed by the residues of the two polynomials.
    pub fn serialized_len(log_n: usize) -> usize {
        2 * size_of::<u64>() + 2 * Q.len() * (1 << log_n) * size_of::<u64>()
    }

    pub fn n(&self) -> usize {
        self.c0.n()
    }

    pub fn log_n(&self) -> usize {
        self.c0.log_n()
    }
}
