//! Encrypted matrix blobs: row-major, block-minor concatenation of fixed
//! length ciphertext records, with a JSON manifest next to the blob.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::backend::CiphertextCodec;
use crate::error::{PrsError, Result};
use crate::matrix::EncryptedMatrix;
use crate::shape::MatrixShape;

pub const DATA_FILE: &str = "data_byte";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub rows: usize,
    pub blocks: usize,
    pub record_len: usize,
}

impl Manifest {
    pub fn shape(&self) -> MatrixShape {
        MatrixShape::new(self.rows, self.blocks)
    }
}

/// Serializes every ciphertext of m, rows then blocks.
pub fn encode_matrix<C, K: CiphertextCodec<C>>(codec: &K, m: &EncryptedMatrix<C>) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::with_capacity(m.shape().len() * codec.record_len());
    for (i, ct) in m.iter().enumerate() {
        let start: usize = buf.len();
        codec
            .write_record(ct, &mut buf)
            .map_err(|e| PrsError::InputMalformed(format!("record {}: {}", i, e)))?;
        if buf.len() - start != codec.record_len() {
            return Err(PrsError::InputMalformed(format!(
                "record {} is {} bytes, expected {}",
                i,
                buf.len() - start,
                codec.record_len()
            )));
        }
    }
    Ok(buf)
}

/// Splits bytes into shape.len() records of the codec's record length and
/// decodes each one. Any other blob length is a corrupt artifact. path only
/// labels errors.
pub fn decode_matrix<C, K: CiphertextCodec<C>>(
    codec: &K,
    bytes: &[u8],
    shape: MatrixShape,
    path: &Path,
) -> Result<EncryptedMatrix<C>> {
    if shape.is_empty() {
        return Err(PrsError::ShapeMismatch(format!(
            "cannot read {} as an empty {} matrix",
            path.display(),
            shape
        )));
    }
    let expected: usize = shape.len() * codec.record_len();
    if bytes.len() != expected {
        let reason: String = if bytes.len() % shape.len() != 0 {
            format!(
                "{} bytes, not divisible into {} records",
                bytes.len(),
                shape
            )
        } else {
            format!(
                "record stride {} != ciphertext length {}",
                bytes.len() / shape.len(),
                codec.record_len()
            )
        };
        return Err(PrsError::corrupt(
            path,
            format!("{}, expected {} bytes", reason, expected),
        ));
    }
    let stride: usize = codec.record_len();

    let rows: Vec<Vec<C>> = bytes
        .chunks_exact(stride * shape.blocks)
        .enumerate()
        .map(|(i, row)| {
            row.chunks_exact(stride)
                .enumerate()
                .map(|(j, record)| {
                    codec
                        .read_record(record)
                        .map_err(|e| PrsError::corrupt(path, format!("record ({}, {}): {}", i, j, e)))
                })
                .collect::<Result<Vec<C>>>()
        })
        .collect::<Result<_>>()?;
    EncryptedMatrix::from_rows(rows)
}

/// Writes dir/data_byte and dir/manifest.json, creating dir if needed.
pub fn write_matrix<C, K: CiphertextCodec<C>>(
    codec: &K,
    m: &EncryptedMatrix<C>,
    dir: &Path,
) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| PrsError::io(dir, e))?;
    let bytes: Vec<u8> = encode_matrix(codec, m)?;
    let data: PathBuf = dir.join(DATA_FILE);
    fs::write(&data, &bytes).map_err(|e| PrsError::io(&data, e))?;

    let manifest: Manifest = Manifest {
        rows: m.shape().rows,
        blocks: m.shape().blocks,
        record_len: codec.record_len(),
    };
    let path: PathBuf = dir.join(MANIFEST_FILE);
    let json: String = serde_json::to_string_pretty(&manifest)
        .map_err(|e| PrsError::Manifest {
            path: path.clone(),
            source: e,
        })?;
    fs::write(&path, json).map_err(|e| PrsError::io(&path, e))?;
    info!("wrote {} ({} bytes, {})", data.display(), bytes.len(), m.shape());
    Ok(())
}

/// Returns the manifest of dir, None if it has none.
pub fn read_manifest(dir: &Path) -> Result<Option<Manifest>> {
    let path: PathBuf = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let json: String = fs::read_to_string(&path).map_err(|e| PrsError::io(&path, e))?;
    let manifest: Manifest =
        serde_json::from_str(&json).map_err(|e| PrsError::Manifest { path, source: e })?;
    Ok(Some(manifest))
}

/// Reads dir/data_byte. The shape comes from the manifest, which must agree
/// with expected when both are known, or from expected alone.
pub fn read_matrix<C, K: CiphertextCodec<C>>(
    codec: &K,
    dir: &Path,
    expected: Option<MatrixShape>,
) -> Result<EncryptedMatrix<C>> {
    let data: PathBuf = dir.join(DATA_FILE);
    let shape: MatrixShape = match (read_manifest(dir)?, expected) {
        (Some(manifest), expected) => {
            if let Some(expected) = expected {
                if expected != manifest.shape() {
                    return Err(PrsError::ShapeMismatch(format!(
                        "{} holds a {} matrix, expected {}",
                        data.display(),
                        manifest.shape(),
                        expected
                    )));
                }
            }
            if manifest.record_len != codec.record_len() {
                return Err(PrsError::corrupt(
                    dir.join(MANIFEST_FILE),
                    format!(
                        "record_len {} != ciphertext length {}",
                        manifest.record_len,
                        codec.record_len()
                    ),
                ));
            }
            manifest.shape()
        }
        (None, Some(expected)) => {
            warn!("{} has no manifest, assuming {}", dir.display(), expected);
            expected
        }
        (None, None) => {
            return Err(PrsError::corrupt(
                dir.join(MANIFEST_FILE),
                "missing manifest and no expected shape",
            ));
        }
    };

    let bytes: Vec<u8> = fs::read(&data).map_err(|e| PrsError::io(&data, e))?;
    let m: EncryptedMatrix<C> = decode_matrix(codec, &bytes, shape, &data)?;
    info!("read {} ({} bytes, {})", data.display(), bytes.len(), shape);
    Ok(m)
}
