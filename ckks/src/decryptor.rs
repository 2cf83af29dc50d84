use crate::ciphertext::Ciphertext;
use crate::keys::SecretKey;
use crate::parameters::Parameters;
use crate::plaintext::Plaintext;
use crate::poly::PolyRNS;
use crate::ring_rns::RingRNS;

pub struct Decryptor {
    params: Parameters,
    sk: PolyRNS,
}

impl Decryptor {
    pub fn new(params: &Parameters, sk: &SecretKey) -> Self {
        Self {
            params: params.clone(),
            sk: sk.prepare(params.ring()),
        }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Returns c0 + c1 * s.
    pub fn decrypt(&self, ct: &Ciphertext) -> Plaintext {
        let ring: &RingRNS = self.params.ring();
        assert!(
            ct.n() == ring.n(),
            "invalid argument ct: ct.n()={} != n={}",
            ct.n(),
            ring.n()
        );
        assert!(
            ct.c0.primes() == ring.primes() && ct.c1.primes() == ring.primes(),
            "invalid argument ct: residues mod {} primes expected",
            ring.primes()
        );
        let mut pt: Plaintext = self.params.new_plaintext();
        pt.log_scale = ct.log_scale;
        let c1: PolyRNS = ring.ntt(&ct.c1);
        ring.a_mul_b_into_c(&c1, &self.sk, &mut pt.value);
        ring.intt_inplace(&mut pt.value);
        ring.a_add_b_into_b(&ct.c0, &mut pt.value);
        pt
    }

    /// Decrypts and decodes the slots() values of ct.
    pub fn decrypt_values(&self, ct: &Ciphertext) -> Vec<f64> {
        self.params.decode(&self.decrypt(ct))
    }
}
