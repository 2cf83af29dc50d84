use std::io::{Error, ErrorKind, Read, Result, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::ciphertext::Ciphertext;
use crate::keys::{PublicKey, RelinearizationKey, RotationKeySet, SecretKey, SwitchingKey};
use crate::parameters::{LOG_Q, MAX_LOG_N, MAX_LOG_SCALE, Q};
use crate::poly::{Poly, PolyRNS};

pub trait WriterTo {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()>;
}

pub trait ReaderFrom {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<()>;
}

fn invalid_data(msg: String) -> Error {
    Error::new(ErrorKind::InvalidData, msg)
}

/// Residues mod q_0, q_1, ... one after the other.
fn write_coeffs<W: Write>(writer: &mut W, a: &PolyRNS) -> Result<()> {
    a.0.iter()
        .flat_map(|ai| ai.0.iter())
        .try_for_each(|x| writer.write_u64::<LittleEndian>(*x))
}

/// Reads the n residues mod every prime of Q into a, rejecting any
/// coefficient that is not reduced.
fn read_coeffs<R: Read>(reader: &mut R, n: usize, a: &mut PolyRNS) -> Result<()> {
    a.0.resize_with(Q.len(), Poly::default);
    for (ai, q) in a.0.iter_mut().zip(Q) {
        ai.0.resize(n, 0);
        reader.read_u64_into::<LittleEndian>(&mut ai.0)?;
        if let Some((i, x)) = ai.0.iter().enumerate().find(|(_, x)| **x >= q) {
            return Err(invalid_data(format!(
                "coefficient {} = {} is not reduced mod q={}",
                i, x, q
            )));
        }
    }
    Ok(())
}

fn gadget_rows(log_base2k: u64) -> u64 {
    Q.iter()
        .map(|q| ((u64::BITS - q.leading_zeros()) as u64).div_ceil(log_base2k))
        .sum()
}

fn read_log_n<R: Read>(reader: &mut R) -> Result<usize> {
    let log_n: u64 = reader.read_u64::<LittleEndian>()?;
    if log_n == 0 || log_n > MAX_LOG_N as u64 {
        return Err(invalid_data(format!(
            "log_n={} not in [1, {}]",
            log_n, MAX_LOG_N
        )));
    }
    Ok(log_n as usize)
}

fn read_n<R: Read>(reader: &mut R) -> Result<usize> {
    let n: u64 = reader.read_u64::<LittleEndian>()?;
    if !n.is_power_of_two() || n > 1 << MAX_LOG_N {
        return Err(invalid_data(format!("invalid degree n={}", n)));
    }
    Ok(n as usize)
}

/// primes | n | residues.
impl WriterTo for PolyRNS {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.primes() as u64)?;
        writer.write_u64::<LittleEndian>(self.n() as u64)?;
        write_coeffs(writer, self)
    }
}

impl ReaderFrom for PolyRNS {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let primes: u64 = reader.read_u64::<LittleEndian>()?;
        if primes != Q.len() as u64 {
            return Err(invalid_data(format!(
                "{} residues, expected {}",
                primes,
                Q.len()
            )));
        }
        let n: usize = read_n(reader)?;
        read_coeffs(reader, n, self)
    }
}

/// Fixed-size record: log_n | log_scale | c0 | c1, see
/// [Ciphertext::serialized_len].
impl WriterTo for Ciphertext {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.log_n() as u64)?;
        writer.write_u64::<LittleEndian>(self.log_scale as u64)?;
        write_coeffs(writer, &self.c0)?;
        write_coeffs(writer, &self.c1)
    }
}

impl ReaderFrom for Ciphertext {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let log_n: usize = read_log_n(reader)?;
        let log_scale: u64 = reader.read_u64::<LittleEndian>()?;
        if log_scale > 2 * MAX_LOG_SCALE as u64 {
            return Err(invalid_data(format!(
                "log_scale={} leaves no headroom in the {} bits of Q",
                log_scale, LOG_Q
            )));
        }
        self.log_scale = log_scale as usize;
        read_coeffs(reader, 1 << log_n, &mut self.c0)?;
        read_coeffs(reader, 1 << log_n, &mut self.c1)
    }
}

impl WriterTo for SecretKey {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.0.write_to(writer)
    }
}

impl ReaderFrom for SecretKey {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.0.read_from(reader)
    }
}

impl WriterTo for PublicKey {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.b.write_to(writer)?;
        self.a.write_to(writer)
    }
}

impl ReaderFrom for PublicKey {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.b.read_from(reader)?;
        self.a.read_from(reader)
    }
}

impl WriterTo for SwitchingKey {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.log_base2k as u64)?;
        writer.write_u64::<LittleEndian>(self.rows() as u64)?;
        self.rows
            .iter()
            .flatten()
            .try_for_each(|poly| poly.write_to(writer))
    }
}

impl ReaderFrom for SwitchingKey {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let log_base2k: u64 = reader.read_u64::<LittleEndian>()?;
        let rows: u64 = reader.read_u64::<LittleEndian>()?;
        if log_base2k == 0 || log_base2k > 30 || rows != gadget_rows(log_base2k) {
            return Err(invalid_data(format!(
                "invalid switching key: log_base2k={} rows={}",
                log_base2k, rows
            )));
        }
        self.log_base2k = log_base2k as usize;
        self.rows = (0..rows)
            .map(|_| {
                let mut row: [PolyRNS; 2] = Default::default();
                row.iter_mut().try_for_each(|poly| poly.read_from(reader))?;
                Ok(row)
            })
            .collect::<Result<Vec<[PolyRNS; 2]>>>()?;
        Ok(())
    }
}

impl WriterTo for RelinearizationKey {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.0.write_to(writer)
    }
}

impl ReaderFrom for RelinearizationKey {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.0.read_from(reader)
    }
}

/// count | (gal_el | key) in increasing gal_el order.
impl WriterTo for RotationKeySet {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let gal_els: Vec<usize> = self.galois_elements();
        writer.write_u64::<LittleEndian>(gal_els.len() as u64)?;
        gal_els.iter().try_for_each(|gal_el| {
            writer.write_u64::<LittleEndian>(*gal_el as u64)?;
            match self.get(*gal_el) {
                Some(key) => key.write_to(writer),
                None => unreachable!("gal_el={} listed but missing", gal_el),
            }
        })
    }
}

impl ReaderFrom for RotationKeySet {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let count: u64 = reader.read_u64::<LittleEndian>()?;
        if count > 1 << MAX_LOG_N {
            return Err(invalid_data(format!("invalid rotation key count={}", count)));
        }
        let mut keys: RotationKeySet = RotationKeySet::new();
        for _ in 0..count {
            let gal_el: u64 = reader.read_u64::<LittleEndian>()?;
            if gal_el & 1 == 0 {
                return Err(invalid_data(format!("invalid galois element {}", gal_el)));
            }
            let mut key: SwitchingKey = SwitchingKey::new(0, 0, 0, 0);
            key.read_from(reader)?;
            keys.insert(gal_el as usize, key);
        }
        *self = keys;
        Ok(())
    }
}
