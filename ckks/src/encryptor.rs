use crate::ciphertext::Ciphertext;
use crate::error::EvalError;
use crate::keys::{PublicKey, sample_error};
use crate::parameters::Parameters;
use crate::plaintext::Plaintext;
use crate::poly::PolyRNS;
use crate::ring_rns::RingRNS;
use sampling::Distribution;
use sampling::source::{Source, new_seed};

/// Public-key encryptor.
pub struct Encryptor {
    params: Parameters,
    pk: PublicKey,
    source_xu: Source,
    source_xe: Source,
}

impl Encryptor {
    /// Encryptor seeded from the operating system.
    pub fn new(params: &Parameters, pk: &PublicKey) -> Self {
        Self::with_source(params, pk, &mut Source::new(new_seed()))
    }

    pub fn with_source(params: &Parameters, pk: &PublicKey, source: &mut Source) -> Self {
        Self {
            params: params.clone(),
            pk: pk.clone(),
            source_xu: source.branch(),
            source_xe: source.branch(),
        }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Returns (u*b + e0 + m, u*a + e1) with u ternary.
    pub fn encrypt(&mut self, pt: &Plaintext) -> Ciphertext {
        let params: &Parameters = &self.params;
        let ring: &RingRNS = params.ring();

        let mut u: PolyRNS = ring.new_polyrns();
        let mut coeffs: Vec<i64> = vec![0; params.n()];
        Distribution::TernaryHw(params.xs()).fill(&mut self.source_xu, &mut coeffs);
        ring.from_i64(&coeffs, &mut u);
        ring.ntt_inplace(&mut u);

        let mut ct: Ciphertext = params.new_ciphertext();
        ct.log_scale = pt.log_scale;

        ring.a_mul_b_into_c(&u, &self.pk.b, &mut ct.c0);
        ring.intt_inplace(&mut ct.c0);
        ring.a_mul_b_into_c(&u, &self.pk.a, &mut ct.c1);
        ring.intt_inplace(&mut ct.c1);

        let mut e: PolyRNS = ring.new_polyrns();
        sample_error(params, &mut self.source_xe, &mut e);
        ring.a_add_b_into_b(&e, &mut ct.c0);
        sample_error(params, &mut self.source_xe, &mut e);
        ring.a_add_b_into_b(&e, &mut ct.c1);

        ring.a_add_b_into_b(&pt.value, &mut ct.c0);
        ct
    }

    /// Encodes and encrypts at most slots() values at the default scale.
    pub fn encrypt_values(&mut self, values: &[f64]) -> Result<Ciphertext, EvalError> {
        let pt: Plaintext = self.params.encode(values)?;
        Ok(self.encrypt(&pt))
    }
}
