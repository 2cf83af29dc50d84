//! Capability set the pipeline needs from a slot-packing approximate
//! homomorphic scheme, and its implementation by the [ckks] engine.

use std::io::{Error, ErrorKind};

use ckks::{Ciphertext, Decryptor, Encryptor, Evaluator, Parameters, ReaderFrom, WriterTo};

use crate::error::Result;

pub trait SlotEncryptor<C> {
    /// Number of reals one ciphertext carries.
    fn slots(&self) -> usize;

    /// Encrypts at most slots() values, the remaining slots are zero.
    fn encrypt_slots(&mut self, values: &[f64]) -> Result<C>;
}

/// Homomorphic operations, pure and shareable across threads.
pub trait SlotEvaluator<C> {
    fn mul_relin(&self, a: &C, b: &C) -> Result<C>;

    fn add(&self, a: &C, b: &C) -> Result<C>;

    /// Rotates the slots k positions to the left.
    fn rotate(&self, a: &C, k: i64) -> Result<C>;
}

pub trait SlotDecryptor<C> {
    fn decrypt_slots(&self, ct: &C) -> Vec<f64>;
}

/// Fixed-length binary records.
pub trait CiphertextCodec<C> {
    /// Byte length of every record.
    fn record_len(&self) -> usize;

    /// Appends the record of ct to buf.
    fn write_record(&self, ct: &C, buf: &mut Vec<u8>) -> std::io::Result<()>;

    /// Decodes one record, which must be consumed entirely.
    fn read_record(&self, record: &[u8]) -> std::io::Result<C>;
}

impl SlotEncryptor<Ciphertext> for Encryptor {
    fn slots(&self) -> usize {
        self.params().slots()
    }

    fn encrypt_slots(&mut self, values: &[f64]) -> Result<Ciphertext> {
        Ok(self.encrypt_values(values)?)
    }
}

impl SlotEvaluator<Ciphertext> for Evaluator {
    fn mul_relin(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        Ok(Evaluator::mul_relin(self, a, b)?)
    }

    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        Ok(Evaluator::add(self, a, b)?)
    }

    fn rotate(&self, a: &Ciphertext, k: i64) -> Result<Ciphertext> {
        Ok(Evaluator::rotate(self, a, k)?)
    }
}

impl SlotDecryptor<Ciphertext> for Decryptor {
    fn decrypt_slots(&self, ct: &Ciphertext) -> Vec<f64> {
        self.decrypt_values(ct)
    }
}

impl CiphertextCodec<Ciphertext> for Parameters {
    fn record_len(&self) -> usize {
        self.ciphertext_bytes()
    }

    fn write_record(&self, ct: &Ciphertext, buf: &mut Vec<u8>) -> std::io::Result<()> {
        ct.write_to(buf)
    }

    fn read_record(&self, record: &[u8]) -> std::io::Result<Ciphertext> {
        if record.len() != self.record_len() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "record length {} != ciphertext length {}",
                    record.len(),
                    self.record_len()
                ),
            ));
        }
        let mut reader: &[u8] = record;
        let mut ct: Ciphertext = Ciphertext::default();
        ct.read_from(&mut reader)?;
        if ct.log_n() != self.log_n() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("ciphertext log_n={} != log_n={}", ct.log_n(), self.log_n()),
            ));
        }
        if !reader.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("{} trailing bytes after ciphertext", reader.len()),
            ));
        }
        Ok(ct)
    }
}
