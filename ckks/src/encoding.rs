use std::f64::consts::PI;
use std::sync::Arc;

use itertools::izip;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::EvalError;
use crate::poly::PolyRNS;
use crate::ring_rns::RingRNS;

/// Canonical embedding between real slot vectors and polynomials of
/// Z[X]/(X^n+1).
///
/// Slot i sits at the root psi^(5^i mod 2n), so that the automorphism
/// X -> X^(5^k) rotates the slots by k positions to the left. The conjugate
/// root carries the same real value, which keeps the coefficients real.
pub struct Encoder {
    n: usize,
    slots: usize,
    /// FFT position p of every slot: psi^(2p+1) is the root of the slot.
    slot_index: Vec<usize>,
    /// psi^j for j in [0, n).
    twist: Vec<Complex<f64>>,
    fft_forward: Arc<dyn Fft<f64>>,
    fft_inverse: Arc<dyn Fft<f64>>,
}

impl Encoder {
    pub fn new(log_n: usize, log_slots: usize) -> Self {
        assert!(
            log_slots < log_n,
            "invalid argument log_slots: log_slots={} >= log_n={}",
            log_slots,
            log_n
        );
        let n: usize = 1 << log_n;
        let slots: usize = 1 << log_slots;
        let mask: usize = (n << 1) - 1;

        let mut slot_index: Vec<usize> = Vec::with_capacity(slots);
        let mut gen_pow: usize = 1;
        (0..slots).for_each(|_| {
            slot_index.push((gen_pow - 1) >> 1);
            gen_pow = (gen_pow * 5) & mask;
        });

        let twist: Vec<Complex<f64>> = (0..n)
            .map(|j| Complex::from_polar(1.0, PI * j as f64 / n as f64))
            .collect();

        let mut planner: FftPlanner<f64> = FftPlanner::new();
        Self {
            n,
            slots,
            slot_index,
            twist,
            fft_forward: planner.plan_fft_forward(n),
            fft_inverse: planner.plan_fft_inverse(n),
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Encodes values (at most slots of them, missing slots are zero) into a
    /// polynomial scaled by 2^log_scale.
    pub fn encode(
        &self,
        ring: &RingRNS,
        values: &[f64],
        log_scale: usize,
    ) -> Result<PolyRNS, EvalError> {
        if values.len() > self.slots {
            return Err(EvalError::TooManyValues {
                len: values.len(),
                slots: self.slots,
            });
        }

        let half_q: f64 = (ring.modulus() >> 1) as f64;
        let scale: f64 = (log_scale as f64).exp2();
        let bound: f64 = half_q / scale;
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || v.abs() >= bound)
        {
            return Err(EvalError::ValueOutOfRange {
                index,
                value: *value,
                log_scale,
            });
        }

        let mut buf: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); self.n];
        izip!(values, &self.slot_index).for_each(|(v, &p)| {
            buf[p] = Complex::new(*v, 0.0);
            buf[self.n - 1 - p] = Complex::new(*v, 0.0);
        });

        self.fft_forward.process(&mut buf);

        let n_inv: f64 = 1.0 / self.n as f64;
        let coeffs: Vec<i128> = izip!(&buf, &self.twist)
            .map(|(b, t)| ((*b * t.conj()).re * n_inv * scale).round() as i128)
            .collect();
        let mut pt: PolyRNS = ring.new_polyrns();
        ring.from_i128(&coeffs, &mut pt);
        Ok(pt)
    }

    /// Decodes the slots of a polynomial scaled by 2^log_scale.
    pub fn decode(&self, ring: &RingRNS, pt: &PolyRNS, log_scale: usize) -> Vec<f64> {
        assert!(
            pt.n() == self.n,
            "invalid argument pt: pt.n()={} != n={}",
            pt.n(),
            self.n
        );
        let scale_inv: f64 = (-(log_scale as f64)).exp2();
        let mut buf: Vec<Complex<f64>> = izip!(ring.to_centered_f64(pt), &self.twist)
            .map(|(c, t)| *t * (c * scale_inv))
            .collect();

        self.fft_inverse.process(&mut buf);

        self.slot_index.iter().map(|&p| buf[p].re).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Q;

    fn max_err(a: &[f64], b: &[f64]) -> f64 {
        izip!(a, b).fold(0.0, |acc, (a, b)| f64::max(acc, (a - b).abs()))
    }

    #[test]
    fn encode_decode() {
        let ring: RingRNS = RingRNS::new(5, &Q);
        let encoder: Encoder = Encoder::new(5, 3);
        let values: Vec<f64> = vec![1.5, -2.25, 0.0, 3.0, 0.125, -7.0, 2.0, 1.0];
        let pt: PolyRNS = encoder.encode(&ring, &values, 40).unwrap();
        let have: Vec<f64> = encoder.decode(&ring, &pt, 40);
        assert!(max_err(&values, &have) < 1e-9, "{:?}", have);
    }

    #[test]
    fn missing_slots_are_zero() {
        let ring: RingRNS = RingRNS::new(4, &Q);
        let encoder: Encoder = Encoder::new(4, 2);
        let pt: PolyRNS = encoder.encode(&ring, &[4.0, 1.0], 20).unwrap();
        let have: Vec<f64> = encoder.decode(&ring, &pt, 20);
        assert!(max_err(&[4.0, 1.0, 0.0, 0.0], &have) < 1e-4, "{:?}", have);
    }

    #[test]
    fn product_is_slotwise() {
        let ring: RingRNS = RingRNS::new(4, &Q);
        let encoder: Encoder = Encoder::new(4, 3);
        let a: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, -1.0, 0.5, 0.0, 2.0];
        let b: Vec<f64> = vec![2.0, -1.0, 0.5, 1.0, 3.0, 2.0, 9.0, -2.0];
        let pa: PolyRNS = encoder.encode(&ring, &a, 40).unwrap();
        let pb: PolyRNS = encoder.encode(&ring, &b, 40).unwrap();
        let pc: PolyRNS = ring.mul(&pa, &pb);
        let have: Vec<f64> = encoder.decode(&ring, &pc, 80);
        let want: Vec<f64> = izip!(&a, &b).map(|(a, b)| a * b).collect();
        assert!(max_err(&want, &have) < 1e-9, "{:?}", have);
    }

    #[test]
    fn automorphism_rotates_slots() {
        let ring: RingRNS = RingRNS::new(4, &Q);
        let encoder: Encoder = Encoder::new(4, 3);
        let a: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let pa: PolyRNS = encoder.encode(&ring, &a, 20).unwrap();
        let mut pb: PolyRNS = ring.new_polyrns();
        ring.a_apply_automorphism_into_b(&pa, ring.galois_element(3), &mut pb);
        let have: Vec<f64> = encoder.decode(&ring, &pb, 20);
        let want: Vec<f64> = (0..8).map(|i| ((i + 3) % 8) as f64).collect();
        assert!(max_err(&want, &have) < 1e-4, "{:?}", have);
    }

    #[test]
    fn rejects_out_of_range() {
        let ring: RingRNS = RingRNS::new(4, &Q);
        let encoder: Encoder = Encoder::new(4, 2);
        assert_eq!(
            encoder.encode(&ring, &[0.0; 5], 20),
            Err(EvalError::TooManyValues { len: 5, slots: 4 })
        );
        assert!(matches!(
            encoder.encode(&ring, &[1.0, f64::NAN], 20),
            Err(EvalError::ValueOutOfRange { index: 1, .. })
        ));
        assert!(matches!(
            encoder.encode(&ring, &[(90f64).exp2()], 40),
            Err(EvalError::ValueOutOfRange { index: 0, .. })
        ));
    }
}
