use itertools::izip;

use crate::ciphertext::Ciphertext;
use crate::error::EvalError;
use crate::keys::{RelinearizationKey, RotationKeySet, SwitchingKey};
use crate::parameters::Parameters;
use crate::poly::PolyRNS;
use crate::ring_rns::RingRNS;

/// Homomorphic operations on [Ciphertext].
///
/// Every operation borrows its operands and returns a new ciphertext, so a
/// single evaluator can be shared across threads.
pub struct Evaluator {
    params: Parameters,
    rlk: RelinearizationKey,
    rtks: RotationKeySet,
}

impl Evaluator {
    pub fn new(params: &Parameters, rlk: RelinearizationKey, rtks: RotationKeySet) -> Self {
        Self {
            params: params.clone(),
            rlk,
            rtks,
        }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    fn check_degree(&self, ct: &Ciphertext) -> Result<(), EvalError> {
        if ct.n() != self.params.n() || ct.c1.n() != self.params.n() {
            return Err(EvalError::DegreeMismatch {
                expected: self.params.n(),
                actual: ct.n(),
            });
        }
        let primes: usize = self.params.ring().primes();
        if ct.c0.primes() != primes || ct.c1.primes() != primes {
            return Err(EvalError::ModulusMismatch {
                expected: primes,
                actual: ct.c0.primes().min(ct.c1.primes()),
            });
        }
        Ok(())
    }

    fn check_same_scale(&self, a: &Ciphertext, b: &Ciphertext) -> Result<(), EvalError> {
        self.check_degree(a)?;
        self.check_degree(b)?;
        if a.log_scale != b.log_scale {
            return Err(EvalError::ScaleMismatch {
                lhs: a.log_scale,
                rhs: b.log_scale,
            });
        }
        Ok(())
    }

    /// Returns a + b.
    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, EvalError> {
        let mut c: Ciphertext = a.clone();
        self.add_inplace(&mut c, b)?;
        Ok(c)
    }

    /// a <- a + b.
    pub fn add_inplace(&self, a: &mut Ciphertext, b: &Ciphertext) -> Result<(), EvalError> {
        self.check_same_scale(a, b)?;
        let ring: &RingRNS = self.params.ring();
        ring.a_add_b_into_b(&b.c0, &mut a.c0);
        ring.a_add_b_into_b(&b.c1, &mut a.c1);
        Ok(())
    }

    /// Returns a - b.
    pub fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, EvalError> {
        self.check_same_scale(a, b)?;
        let ring: &RingRNS = self.params.ring();
        let mut c: Ciphertext = self.params.new_ciphertext();
        c.log_scale = a.log_scale;
        ring.a_sub_b_into_c(&a.c0, &b.c0, &mut c.c0);
        ring.a_sub_b_into_c(&a.c1, &b.c1, &mut c.c1);
        Ok(c)
    }

    /// Returns a * b relinearized back to a degree one ciphertext, at scale
    /// 2^(a.log_scale + b.log_scale).
    pub fn mul_relin(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, EvalError> {
        self.check_degree(a)?;
        self.check_degree(b)?;
        let log_scale: usize = a.log_scale + b.log_scale;
        if log_scale > self.params.max_log_scale() {
            return Err(EvalError::ScaleOverflow {
                log_scale,
                max: self.params.max_log_scale(),
            });
        }

        let ring: &RingRNS = self.params.ring();
        let a0: PolyRNS = ring.ntt(&a.c0);
        let a1: PolyRNS = ring.ntt(&a.c1);
        let b0: PolyRNS = ring.ntt(&b.c0);
        let b1: PolyRNS = ring.ntt(&b.c1);

        // (d0, d1, d2) = (a0*b0, a0*b1 + a1*b0, a1*b1)
        let mut d0: PolyRNS = ring.new_polyrns();
        let mut d1: PolyRNS = ring.new_polyrns();
        let mut d2: PolyRNS = ring.new_polyrns();
        ring.a_mul_b_into_c(&a0, &b0, &mut d0);
        ring.a_mul_b_into_c(&a0, &b1, &mut d1);
        ring.a_mul_b_add_c_into_c(&a1, &b0, &mut d1);
        ring.a_mul_b_into_c(&a1, &b1, &mut d2);
        ring.intt_inplace(&mut d2);

        let (mut c0, mut c1) = self.key_switch_ntt(&d2, &self.rlk.0);
        ring.a_add_b_into_b(&d0, &mut c0);
        ring.a_add_b_into_b(&d1, &mut c1);
        ring.intt_inplace(&mut c0);
        ring.intt_inplace(&mut c1);

        Ok(Ciphertext { c0, c1, log_scale })
    }

    /// Returns ct with its slots rotated k positions to the left.
    pub fn rotate(&self, ct: &Ciphertext, k: i64) -> Result<Ciphertext, EvalError> {
        self.check_degree(ct)?;
        let ring: &RingRNS = self.params.ring();
        let gal_el: usize = ring.galois_element(k);
        if gal_el == 1 {
            return Ok(ct.clone());
        }
        let swk: &SwitchingKey = self
            .rtks
            .get(gal_el)
            .ok_or(EvalError::MissingRotationKey {
                rotation: k,
                gal_el,
            })?;

        let mut c0: PolyRNS = ring.new_polyrns();
        let mut c1: PolyRNS = ring.new_polyrns();
        ring.a_apply_automorphism_into_b(&ct.c0, gal_el, &mut c0);
        ring.a_apply_automorphism_into_b(&ct.c1, gal_el, &mut c1);

        let (mut k0, mut k1) = self.key_switch_ntt(&c1, swk);
        ring.intt_inplace(&mut k0);
        ring.intt_inplace(&mut k1);
        ring.a_add_b_into_b(&c0, &mut k0);

        Ok(Ciphertext {
            c0: k0,
            c1: k1,
            log_scale: ct.log_scale,
        })
    }

    /// Returns the ciphertext whose slot 0 holds the sum of the first n
    /// slots of ct, n a power of two: for every 2^t < n adds the ciphertext
    /// rotated by 2^t to itself.
    ///
    /// Reference for the backend-generic `prs::engine::inner_product`, which
    /// runs the same rotate-and-add loop through its evaluator trait.
    pub fn inner_sum_log(&self, ct: &Ciphertext, n: usize) -> Result<Ciphertext, EvalError> {
        assert!(
            n.is_power_of_two(),
            "invalid argument n: n={} is not a power of two",
            n
        );
        let mut acc: Ciphertext = ct.clone();
        for t in 0..n.trailing_zeros() {
            let rotated: Ciphertext = self.rotate(&acc, 1 << t)?;
            self.add_inplace(&mut acc, &rotated)?;
        }
        Ok(acc)
    }

    /// Returns (p0, p1) in the NTT domain with p0 + p1*s ~ c*s_in, where
    /// swk switches s_in to s and c is in the coefficient domain.
    fn key_switch_ntt(&self, c: &PolyRNS, swk: &SwitchingKey) -> (PolyRNS, PolyRNS) {
        let ring: &RingRNS = self.params.ring();
        let mut p0: PolyRNS = ring.new_polyrns();
        let mut p1: PolyRNS = ring.new_polyrns();
        let digits: Vec<PolyRNS> = ring.decompose(c, swk.log_base2k);
        debug_assert_eq!(digits.len(), swk.rows());
        izip!(digits, &swk.rows).for_each(|(mut digit, [k0, k1])| {
            ring.ntt_inplace(&mut digit);
            ring.a_mul_b_add_c_into_c(&digit, k0, &mut p0);
            ring.a_mul_b_add_c_into_c(&digit, k1, &mut p1);
        });
        (p0, p1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decryptor::Decryptor;
    use crate::encryptor::Encryptor;
    use crate::key_generator::KeyGenerator;
    use crate::keys::{PublicKey, SecretKey};
    use crate::parameters::ParametersLiteral;
    use sampling::source::Source;

    struct Setup {
        params: Parameters,
        encryptor: Encryptor,
        decryptor: Decryptor,
        evaluator: Evaluator,
    }

    fn setup(seed: u8) -> Setup {
        let params: Parameters = Parameters::new(&ParametersLiteral::TOY);
        let mut source: Source = Source::new([seed; 32]);
        let kgen: KeyGenerator = KeyGenerator {};
        let sk: SecretKey = kgen.gen_secret_key(&params, &mut source);
        let pk: PublicKey = kgen.gen_public_key(&params, &sk, &mut source);
        let rlk: RelinearizationKey = kgen.gen_relinearization_key(&params, &sk, &mut source);
        let rtks: RotationKeySet = kgen.gen_inner_sum_keys(&params, &sk, &mut source);
        Setup {
            encryptor: Encryptor::with_source(&params, &pk, &mut source),
            decryptor: Decryptor::new(&params, &sk),
            evaluator: Evaluator::new(&params, rlk, rtks),
            params,
        }
    }

    fn assert_close(want: &[f64], have: &[f64], tol: f64) {
        izip!(want, have).enumerate().for_each(|(i, (w, h))| {
            assert!((w - h).abs() < tol, "slot {}: want={} have={}", i, w, h)
        });
    }

    fn values(slots: usize, f: impl Fn(usize) -> f64) -> Vec<f64> {
        (0..slots).map(f).collect()
    }

    #[test]
    fn encrypt_decrypt() {
        let mut s: Setup = setup(1);
        let want: Vec<f64> = values(s.params.slots(), |i| i as f64 * 0.25 - 3.0);
        let ct: Ciphertext = s.encryptor.encrypt_values(&want).unwrap();
        assert_close(&want, &s.decryptor.decrypt_values(&ct), 1e-4);
    }

    #[test]
    fn add_sub() {
        let mut s: Setup = setup(2);
        let a: Vec<f64> = values(s.params.slots(), |i| i as f64);
        let b: Vec<f64> = values(s.params.slots(), |i| 1.5 - i as f64 * 0.5);
        let ct_a: Ciphertext = s.encryptor.encrypt_values(&a).unwrap();
        let ct_b: Ciphertext = s.encryptor.encrypt_values(&b).unwrap();

        let sum: Ciphertext = s.evaluator.add(&ct_a, &ct_b).unwrap();
        let want: Vec<f64> = izip!(&a, &b).map(|(a, b)| a + b).collect();
        assert_close(&want, &s.decryptor.decrypt_values(&sum), 1e-4);

        let diff: Ciphertext = s.evaluator.sub(&ct_a, &ct_b).unwrap();
        let want: Vec<f64> = izip!(&a, &b).map(|(a, b)| a - b).collect();
        assert_close(&want, &s.decryptor.decrypt_values(&diff), 1e-4);
    }

    #[test]
    fn mul_relin() {
        let mut s: Setup = setup(3);
        let a: Vec<f64> = values(s.params.slots(), |i| (i % 5) as f64 - 2.0);
        let b: Vec<f64> = values(s.params.slots(), |i| 0.5 * (i % 3) as f64);
        let ct_a: Ciphertext = s.encryptor.encrypt_values(&a).unwrap();
        let ct_b: Ciphertext = s.encryptor.encrypt_values(&b).unwrap();

        let ct_c: Ciphertext = s.evaluator.mul_relin(&ct_a, &ct_b).unwrap();
        assert_eq!(ct_c.log_scale, 2 * s.params.log_scale());
        let want: Vec<f64> = izip!(&a, &b).map(|(a, b)| a * b).collect();
        assert_close(&want, &s.decryptor.decrypt_values(&ct_c), 1e-3);
    }

    #[test]
    fn rotate() {
        let mut s: Setup = setup(4);
        let slots: usize = s.params.slots();
        let a: Vec<f64> = values(slots, |i| i as f64);
        let ct: Ciphertext = s.encryptor.encrypt_values(&a).unwrap();
        [1i64, 2, 4].iter().for_each(|k| {
            let rotated: Ciphertext = s.evaluator.rotate(&ct, *k).unwrap();
            let want: Vec<f64> = values(slots, |i| ((i + *k as usize) % slots) as f64);
            assert_close(&want, &s.decryptor.decrypt_values(&rotated), 1e-3);
        });
        assert_eq!(
            s.evaluator.rotate(&ct, 3),
            Err(EvalError::MissingRotationKey {
                rotation: 3,
                gal_el: s.params.ring().galois_element(3),
            })
        );
    }

    #[test]
    fn inner_sum_of_products() {
        let mut s: Setup = setup(5);
        let slots: usize = s.params.slots();
        let a: Vec<f64> = values(slots, |i| (i % 3) as f64);
        let b: Vec<f64> = values(slots, |i| 0.25 * (i % 4) as f64);
        let ct_a: Ciphertext = s.encryptor.encrypt_values(&a).unwrap();
        let ct_b: Ciphertext = s.encryptor.encrypt_values(&b).unwrap();
        let prod: Ciphertext = s.evaluator.mul_relin(&ct_a, &ct_b).unwrap();
        let sum: Ciphertext = s.evaluator.inner_sum_log(&prod, slots).unwrap();
        let want: f64 = izip!(&a, &b).map(|(a, b)| a * b).sum();
        let have: f64 = s.decryptor.decrypt_values(&sum)[0];
        assert!((want - have).abs() < 1e-2, "want={} have={}", want, have);
    }

    #[test]
    fn inner_sum_beyond_single_prime_headroom() {
        // 32 slots of 2 * 128 sum to 8192 at scale 2^80, past what a single
        // 61-bit prime holds at that scale.
        let mut s: Setup = setup(7);
        let slots: usize = s.params.slots();
        let ct_a: Ciphertext = s.encryptor.encrypt_values(&vec![2.0; slots]).unwrap();
        let ct_b: Ciphertext = s.encryptor.encrypt_values(&vec![128.0; slots]).unwrap();
        let prod: Ciphertext = s.evaluator.mul_relin(&ct_a, &ct_b).unwrap();
        let sum: Ciphertext = s.evaluator.inner_sum_log(&prod, slots).unwrap();
        let have: f64 = s.decryptor.decrypt_values(&sum)[0];
        assert!((have - 8192.0).abs() < 1e-4, "have={}", have);
    }

    #[test]
    fn scale_checks() {
        let mut s: Setup = setup(6);
        let ct: Ciphertext = s.encryptor.encrypt_values(&[1.0]).unwrap();
        let sq: Ciphertext = s.evaluator.mul_relin(&ct, &ct).unwrap();
        assert_eq!(
            s.evaluator.add(&ct, &sq),
            Err(EvalError::ScaleMismatch {
                lhs: ct.log_scale,
                rhs: sq.log_scale,
            })
        );
        assert!(matches!(
            s.evaluator.mul_relin(&sq, &ct),
            Err(EvalError::ScaleOverflow { .. })
        ));

        let mut truncated: Ciphertext = ct.clone();
        truncated.c1.0.pop();
        assert_eq!(
            s.evaluator.add(&ct, &truncated),
            Err(EvalError::ModulusMismatch {
                expected: 2,
                actual: 1,
            })
        );
    }
}
