//! Stages of the encrypted PRS computation, exchanging only files so that
//! the data owner and the compute party can run them in separate processes.
//!
//! keys/                      secret_key public_key relin_key rotation_keys params.json
//! out/x_data_encrypt/        encrypted genotypes, samples x blocks
//! out/coef_data_encrypt/     encrypted coefficients, models x blocks
//! out/model_output_encrypt/  cross matrix, models x samples
//! out/pheno_data_<name>.csv  decrypted scores, samples x models

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use ckks::{
    Ciphertext, Decryptor, Encryptor, Evaluator, KeyGenerator, Parameters, ParametersLiteral,
    PublicKey, ReaderFrom, RelinearizationKey, RotationKeySet, SecretKey, SwitchingKey, WriterTo,
};
use itertools::izip;
use log::{debug, info, warn};
use sampling::source::{Source, new_seed};

use crate::backend::{CiphertextCodec, SlotDecryptor, SlotEncryptor, SlotEvaluator};
use crate::codec::{read_manifest, read_matrix, write_matrix};
use crate::engine::{
    dot_product_matrix, dot_product_matrix_par, max_abs_dot_product, plain_dot_product_matrix,
};
use crate::error::{PrsError, Result};
use crate::io::{read_csv_matrix, write_csv_matrix};
use crate::matrix::{EncryptedMatrix, encrypt_matrix};
use crate::reconstruct::reconstruct;
use crate::shape::MatrixShape;

pub const SECRET_KEY_FILE: &str = "secret_key";
pub const PUBLIC_KEY_FILE: &str = "public_key";
pub const RELIN_KEY_FILE: &str = "relin_key";
pub const ROTATION_KEYS_FILE: &str = "rotation_keys";
pub const PARAMS_FILE: &str = "params.json";

pub const SAMPLE_DIR: &str = "x_data_encrypt";
pub const COEF_DIR: &str = "coef_data_encrypt";
pub const OUTPUT_DIR: &str = "model_output_encrypt";

pub fn pheno_file(name: &str) -> String {
    format!("pheno_data_{}.csv", name)
}

fn write_key<T: WriterTo>(path: &Path, key: &T) -> Result<()> {
    let file: fs::File = fs::File::create(path).map_err(|e| PrsError::io(path, e))?;
    let mut writer: BufWriter<fs::File> = BufWriter::new(file);
    key.write_to(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| PrsError::io(path, e))
}

fn read_key<T: ReaderFrom>(path: &Path, mut key: T) -> Result<T> {
    let bytes: Vec<u8> = fs::read(path).map_err(|e| PrsError::io(path, e))?;
    let mut reader: &[u8] = &bytes;
    key.read_from(&mut reader).map_err(|e| match e.kind() {
        ErrorKind::InvalidData | ErrorKind::UnexpectedEof => PrsError::corrupt(path, e.to_string()),
        _ => PrsError::io(path, e),
    })?;
    if !reader.is_empty() {
        return Err(PrsError::corrupt(
            path,
            format!("{} trailing bytes", reader.len()),
        ));
    }
    Ok(key)
}

fn check_degree(path: &Path, have: usize, params: &Parameters) -> Result<()> {
    if have != params.n() {
        return Err(PrsError::corrupt(
            path,
            format!("key of degree {} but parameters have n={}", have, params.n()),
        ));
    }
    Ok(())
}

fn check_switching_key(path: &Path, key: &SwitchingKey, params: &Parameters) -> Result<()> {
    check_degree(path, key.n(), params)?;
    if key.log_base2k != params.log_base2k() {
        return Err(PrsError::corrupt(
            path,
            format!(
                "key with log_base2k={} but parameters have log_base2k={}",
                key.log_base2k,
                params.log_base2k()
            ),
        ));
    }
    Ok(())
}

/// Keys of one party, generated from a single parameter set.
pub struct KeySet {
    pub params: Parameters,
    pub sk: SecretKey,
    pub pk: PublicKey,
    pub rlk: RelinearizationKey,
    pub rtks: RotationKeySet,
}

impl KeySet {
    pub fn generate(literal: &ParametersLiteral, source: &mut Source) -> Result<Self> {
        let params: Parameters = Parameters::try_new(literal)?;
        let kgen: KeyGenerator = KeyGenerator {};
        let sk: SecretKey = kgen.gen_secret_key(&params, source);
        let pk: PublicKey = kgen.gen_public_key(&params, &sk, source);
        let rlk: RelinearizationKey = kgen.gen_relinearization_key(&params, &sk, source);
        let rtks: RotationKeySet = kgen.gen_inner_sum_keys(&params, &sk, source);
        Ok(Self {
            params,
            sk,
            pk,
            rlk,
            rtks,
        })
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| PrsError::io(dir, e))?;
        let path: PathBuf = dir.join(PARAMS_FILE);
        let json: String = serde_json::to_string_pretty(self.params.literal()).map_err(|e| {
            PrsError::Manifest {
                path: path.clone(),
                source: e,
            }
        })?;
        fs::write(&path, json).map_err(|e| PrsError::io(&path, e))?;
        write_key(&dir.join(SECRET_KEY_FILE), &self.sk)?;
        write_key(&dir.join(PUBLIC_KEY_FILE), &self.pk)?;
        write_key(&dir.join(RELIN_KEY_FILE), &self.rlk)?;
        write_key(&dir.join(ROTATION_KEYS_FILE), &self.rtks)
    }
}

pub fn load_parameters(keys: &Path) -> Result<Parameters> {
    let path: PathBuf = keys.join(PARAMS_FILE);
    let json: String = fs::read_to_string(&path).map_err(|e| PrsError::io(&path, e))?;
    let literal: ParametersLiteral =
        serde_json::from_str(&json).map_err(|e| PrsError::Manifest { path, source: e })?;
    Ok(Parameters::try_new(&literal)?)
}

pub fn load_encryptor(keys: &Path, params: &Parameters) -> Result<Encryptor> {
    let path: PathBuf = keys.join(PUBLIC_KEY_FILE);
    let pk: PublicKey = read_key(&path, PublicKey::new(0, 0))?;
    check_degree(&path, pk.a.n(), params)?;
    check_degree(&path, pk.b.n(), params)?;
    Ok(Encryptor::new(params, &pk))
}

pub fn load_evaluator(keys: &Path, params: &Parameters) -> Result<Evaluator> {
    let path: PathBuf = keys.join(RELIN_KEY_FILE);
    let rlk: RelinearizationKey = read_key(&path, RelinearizationKey(SwitchingKey::new(0, 0, 0, 0)))?;
    check_switching_key(&path, &rlk.0, params)?;

    let path: PathBuf = keys.join(ROTATION_KEYS_FILE);
    let rtks: RotationKeySet = read_key(&path, RotationKeySet::new())?;
    for gal_el in rtks.galois_elements() {
        if let Some(key) = rtks.get(gal_el) {
            check_switching_key(&path, key, params)?;
        }
    }
    Ok(Evaluator::new(params, rlk, rtks))
}

pub fn load_decryptor(keys: &Path, params: &Parameters) -> Result<Decryptor> {
    let path: PathBuf = keys.join(SECRET_KEY_FILE);
    let sk: SecretKey = read_key(&path, SecretKey::new(0, 0))?;
    check_degree(&path, sk.0.n(), params)?;
    Ok(Decryptor::new(params, &sk))
}

/// Generates and writes a fresh key set.
pub fn keygen(literal: &ParametersLiteral, keys: &Path) -> Result<()> {
    keygen_with_source(literal, keys, &mut Source::new(new_seed()))
}

pub fn keygen_with_source(literal: &ParametersLiteral, keys: &Path, source: &mut Source) -> Result<()> {
    info!("keygen: {:?}", literal);
    let now: Instant = Instant::now();
    let keyset: KeySet = KeySet::generate(literal, source)?;
    keyset.write(keys)?;
    info!("keygen: wrote {} in {:?}", keys.display(), now.elapsed());
    Ok(())
}

/// Packs, encrypts and writes rows to dir.
pub fn encrypt_stage<C, E, K>(encryptor: &mut E, codec: &K, rows: &[Vec<f64>], dir: &Path) -> Result<MatrixShape>
where
    E: SlotEncryptor<C>,
    K: CiphertextCodec<C>,
{
    let now: Instant = Instant::now();
    let m: EncryptedMatrix<C> = encrypt_matrix(encryptor, rows)?;
    write_matrix(codec, &m, dir)?;
    info!(
        "encrypted {} rows of {} values into {} in {:?}",
        rows.len(),
        rows.first().map(|row| row.len()).unwrap_or(0),
        m.shape(),
        now.elapsed()
    );
    Ok(m.shape())
}

/// Reads both encrypted operands under out, writes their cross matrix.
pub fn evaluate_stage<C, E, K>(evaluator: &E, codec: &K, out: &Path, slots: usize, threads: Option<usize>) -> Result<MatrixShape>
where
    C: Send + Sync,
    E: SlotEvaluator<C> + Sync,
    K: CiphertextCodec<C>,
{
    let coef: EncryptedMatrix<C> = read_matrix(codec, &out.join(COEF_DIR), None)?;
    let sample: EncryptedMatrix<C> = read_matrix(codec, &out.join(SAMPLE_DIR), None)?;
    coef.shape().check_blocks(&sample.shape())?;

    let cross: EncryptedMatrix<C> = match threads {
        Some(1) => dot_product_matrix(evaluator, &coef, &sample, slots)?,
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| PrsError::InputMalformed(format!("thread pool of {} threads: {}", threads, e)))?
            .install(|| dot_product_matrix_par(evaluator, &coef, &sample, slots))?,
        None => dot_product_matrix_par(evaluator, &coef, &sample, slots)?,
    };
    write_matrix(codec, &cross, &out.join(OUTPUT_DIR))?;
    Ok(cross.shape())
}

/// Reads the cross matrix under out and writes the decrypted scores to
/// out/pheno_data_<name>.csv.
pub fn decrypt_stage<C, D, K>(decryptor: &D, codec: &K, out: &Path, name: &str) -> Result<(PathBuf, Vec<Vec<f64>>)>
where
    D: SlotDecryptor<C>,
    K: CiphertextCodec<C>,
{
    let expected: Option<MatrixShape> = match (
        read_manifest(&out.join(COEF_DIR))?,
        read_manifest(&out.join(SAMPLE_DIR))?,
    ) {
        (Some(coef), Some(sample)) => Some(MatrixShape::new(coef.rows, sample.rows)),
        _ => None,
    };
    let cross: EncryptedMatrix<C> = read_matrix(codec, &out.join(OUTPUT_DIR), expected)?;
    let (coef_rows, sample_rows) = (cross.shape().rows, cross.shape().blocks);

    let now: Instant = Instant::now();
    let dense: Vec<Vec<f64>> = reconstruct(decryptor, &cross, sample_rows, coef_rows)?;
    let path: PathBuf = out.join(pheno_file(name));
    write_csv_matrix(&path, &dense)?;
    info!(
        "decrypted {} samples x {} models into {} in {:?}",
        sample_rows,
        coef_rows,
        path.display(),
        now.elapsed()
    );
    Ok((path, dense))
}

fn read_genotypes(input: &Path, max_samples: Option<usize>) -> Result<Vec<Vec<f64>>> {
    let mut rows: Vec<Vec<f64>> = read_csv_matrix(input)?;
    if let Some(max) = max_samples {
        if max == 0 {
            return Err(PrsError::InputMalformed("max_samples must be positive".to_string()));
        }
        if max < rows.len() {
            info!("keeping the first {} of {} samples", max, rows.len());
            rows.truncate(max);
        }
    }
    Ok(rows)
}

pub fn encrypt_genotypes(keys: &Path, input: &Path, out: &Path, max_samples: Option<usize>) -> Result<MatrixShape> {
    info!("encrypt-genotypes: {}", input.display());
    let params: Parameters = load_parameters(keys)?;
    let mut encryptor: Encryptor = load_encryptor(keys, &params)?;
    let rows: Vec<Vec<f64>> = read_genotypes(input, max_samples)?;
    encrypt_stage::<Ciphertext, _, _>(&mut encryptor, &params, &rows, &out.join(SAMPLE_DIR))
}

pub fn encrypt_model(keys: &Path, input: &Path, out: &Path) -> Result<MatrixShape> {
    info!("encrypt-model: {}", input.display());
    let params: Parameters = load_parameters(keys)?;
    let mut encryptor: Encryptor = load_encryptor(keys, &params)?;
    let rows: Vec<Vec<f64>> = read_csv_matrix(input)?;
    encrypt_stage::<Ciphertext, _, _>(&mut encryptor, &params, &rows, &out.join(COEF_DIR))
}

pub fn evaluate(keys: &Path, out: &Path, threads: Option<usize>) -> Result<MatrixShape> {
    info!("evaluate: {}", out.display());
    let params: Parameters = load_parameters(keys)?;
    let evaluator: Evaluator = load_evaluator(keys, &params)?;
    evaluate_stage::<Ciphertext, _, _>(&evaluator, &params, out, params.slots(), threads)
}

pub fn decrypt(keys: &Path, out: &Path, name: &str) -> Result<(PathBuf, Vec<Vec<f64>>)> {
    info!("decrypt: {}", out.display());
    let params: Parameters = load_parameters(keys)?;
    let decryptor: Decryptor = load_decryptor(keys, &params)?;
    decrypt_stage::<Ciphertext, _, _>(&decryptor, &params, out, name)
}

/// Rejects operands whose scores could exceed what a product ciphertext
/// holds: past that bound the decrypted values silently wrap around.
pub fn check_magnitude(params: &Parameters, coef: &[Vec<f64>], sample: &[Vec<f64>]) -> Result<()> {
    let log_scale: usize = 2 * params.log_scale();
    let max: f64 = params.max_magnitude(log_scale);
    let bound: f64 = max_abs_dot_product(coef, sample);
    if bound.is_nan() || bound >= max {
        return Err(PrsError::InputMalformed(format!(
            "scores may reach {:e}, beyond the {:e} a ciphertext at scale 2^{} holds",
            bound, max, log_scale
        )));
    }
    debug!("scores bounded by {:e} < {:e}", bound, max);
    Ok(())
}

/// Options of [run].
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub genotypes: PathBuf,
    pub coefficients: PathBuf,
    pub out: PathBuf,
    pub name: String,
    pub params: ParametersLiteral,
    pub max_samples: Option<usize>,
    pub threads: Option<usize>,
    pub verify: bool,
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub output: PathBuf,
    /// samples x models.
    pub scores: Vec<Vec<f64>>,
    /// Largest deviation from the plaintext scores, when verified.
    pub max_error: Option<f64>,
}

/// All stages in one process, keys written to out/keys.
pub fn run(cfg: &RunConfig) -> Result<RunReport> {
    run_with_source(cfg, &mut Source::new(new_seed()))
}

pub fn run_with_source(cfg: &RunConfig, source: &mut Source) -> Result<RunReport> {
    let now: Instant = Instant::now();
    let sample: Vec<Vec<f64>> = read_genotypes(&cfg.genotypes, cfg.max_samples)?;
    let coef: Vec<Vec<f64>> = read_csv_matrix(&cfg.coefficients)?;
    check_magnitude(&Parameters::try_new(&cfg.params)?, &coef, &sample)?;

    let keys: PathBuf = cfg.out.join("keys");
    keygen_with_source(&cfg.params, &keys, source)?;
    encrypt_genotypes(&keys, &cfg.genotypes, &cfg.out, cfg.max_samples)?;
    encrypt_model(&keys, &cfg.coefficients, &cfg.out)?;
    evaluate(&keys, &cfg.out, cfg.threads)?;
    let (output, scores) = decrypt(&keys, &cfg.out, &cfg.name)?;

    let max_error: Option<f64> = if cfg.verify {
        let want: Vec<Vec<f64>> = plain_dot_product_matrix(&coef, &sample)?;
        let err: f64 = izip!(want.iter().flatten(), scores.iter().flatten())
            .fold(0.0, |acc, (w, h)| f64::max(acc, (w - h).abs()));
        if err > 1e-2 {
            warn!("largest deviation from the plaintext scores: {:e}", err);
        } else {
            info!("largest deviation from the plaintext scores: {:e}", err);
        }
        Some(err)
    } else {
        None
    };

    info!("run: done in {:?}", now.elapsed());
    Ok(RunReport {
        output,
        scores,
        max_error,
    })
}
