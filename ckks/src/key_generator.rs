use log::debug;

use crate::keys::{PublicKey, RelinearizationKey, RotationKeySet, SecretKey, SwitchingKey, sample_error};
use crate::parameters::Parameters;
use crate::poly::PolyRNS;
use crate::ring_rns::RingRNS;
use sampling::source::Source;

pub struct KeyGenerator {}

impl KeyGenerator {
    pub fn gen_secret_key(&self, params: &Parameters, source: &mut Source) -> SecretKey {
        let mut sk: SecretKey = SecretKey::new(params.n(), params.ring().primes());
        sk.fill_ternary_hw(params.ring(), params.xs(), source);
        sk
    }

    pub fn gen_public_key(
        &self,
        params: &Parameters,
        sk: &SecretKey,
        source: &mut Source,
    ) -> PublicKey {
        let mut source_xa: Source = source.branch();
        let mut source_xe: Source = source.branch();
        let ring: &RingRNS = params.ring();
        let sk_ntt: PolyRNS = sk.prepare(ring);

        let mut pk: PublicKey = PublicKey::new(params.n(), ring.primes());
        ring.fill_uniform(&mut source_xa, &mut pk.a);

        let mut e: PolyRNS = ring.new_polyrns();
        sample_error(params, &mut source_xe, &mut e);
        ring.ntt_inplace(&mut e);

        let mut a_s: PolyRNS = ring.new_polyrns();
        ring.a_mul_b_into_c(&pk.a, &sk_ntt, &mut a_s);
        ring.a_sub_b_into_c(&e, &a_s, &mut pk.b);
        pk
    }

    /// Returns a key switching sk_in to sk_out.
    pub fn gen_switching_key(
        &self,
        params: &Parameters,
        sk_in: &PolyRNS,
        sk_out: &SecretKey,
        source: &mut Source,
    ) -> SwitchingKey {
        let mut source_xa: Source = source.branch();
        let mut source_xe: Source = source.branch();
        let mut swk: SwitchingKey = SwitchingKey::new(
            params.n(),
            params.ring().primes(),
            params.log_base2k(),
            params.digits(),
        );
        swk.generate(
            params,
            sk_in,
            &sk_out.prepare(params.ring()),
            &mut source_xa,
            &mut source_xe,
        );
        swk
    }

    pub fn gen_relinearization_key(
        &self,
        params: &Parameters,
        sk: &SecretKey,
        source: &mut Source,
    ) -> RelinearizationKey {
        let sk_square: PolyRNS = params.ring().mul(&sk.0, &sk.0);
        RelinearizationKey(self.gen_switching_key(params, &sk_square, sk, source))
    }

    /// Returns the keys for the left rotations by every k in rotations.
    pub fn gen_rotation_keys(
        &self,
        params: &Parameters,
        sk: &SecretKey,
        rotations: &[i64],
        source: &mut Source,
    ) -> RotationKeySet {
        let ring: &RingRNS = params.ring();
        let mut rtks: RotationKeySet = RotationKeySet::new();
        let mut sk_auto: PolyRNS = ring.new_polyrns();
        rotations.iter().for_each(|k| {
            let gal_el: usize = ring.galois_element(*k);
            if gal_el == 1 || rtks.get(gal_el).is_some() {
                return;
            }
            ring.a_apply_automorphism_into_b(&sk.0, gal_el, &mut sk_auto);
            rtks.insert(gal_el, self.gen_switching_key(params, &sk_auto, sk, source));
        });
        debug!(
            "generated {} rotation keys for rotations {:?}",
            rtks.len(),
            rotations
        );
        rtks
    }

    /// Returns the keys for the rotations 1, 2, 4, ..., slots/2 used by
    /// [crate::evaluator::Evaluator::inner_sum_log].
    pub fn gen_inner_sum_keys(
        &self,
        params: &Parameters,
        sk: &SecretKey,
        source: &mut Source,
    ) -> RotationKeySet {
        let rotations: Vec<i64> = inner_sum_rotations(params.slots());
        self.gen_rotation_keys(params, sk, &rotations, source)
    }
}

/// Rotations 2^t for t in [0, log2(slots)).
pub fn inner_sum_rotations(slots: usize) -> Vec<i64> {
    (0..slots.trailing_zeros()).map(|t| 1i64 << t).collect()
}
