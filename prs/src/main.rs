use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use ckks::ParametersLiteral;
use clap::{Parser, Subcommand};
use log::info;
use prs::pipeline::{self, RunConfig, RunReport};

#[derive(Parser, Debug)]
#[command(
    name = "prs",
    version,
    about = "Polygenic risk scores under homomorphic encryption"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the secret, public, relinearization and rotation keys.
    Keygen {
        /// Parameter preset: pn12, pn13, pn14, pn15 or toy.
        #[arg(long, default_value = "pn13")]
        params: String,

        #[arg(long)]
        keys: PathBuf,
    },

    /// Encrypt a genotype matrix, one sample per row.
    EncryptGenotypes {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        keys: PathBuf,

        #[arg(long)]
        out: PathBuf,

        /// Keep only the first n samples.
        #[arg(long)]
        max_samples: Option<usize>,
    },

    /// Encrypt a coefficient matrix, one model per row.
    EncryptModel {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        keys: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },

    /// Compute the encrypted scores of every sample under every model.
    Evaluate {
        #[arg(long)]
        keys: PathBuf,

        #[arg(long)]
        out: PathBuf,

        /// Worker threads, all cores when unset.
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Decrypt the scores into <out>/pheno_data_<name>.csv.
    Decrypt {
        #[arg(long)]
        keys: PathBuf,

        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        name: String,
    },

    /// Run every stage in this process.
    Run {
        #[arg(long)]
        genotypes: PathBuf,

        #[arg(long)]
        coefficients: PathBuf,

        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "pn13")]
        params: String,

        #[arg(long)]
        max_samples: Option<usize>,

        #[arg(long)]
        threads: Option<usize>,

        /// Compare against the plaintext scores.
        #[arg(long)]
        verify: bool,

        /// Largest deviation accepted by --verify.
        #[arg(long, default_value = "1e-2")]
        tolerance: f64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli: Cli = Cli::parse();

    match cli.command {
        Command::Keygen { params, keys } => {
            let literal: ParametersLiteral = ParametersLiteral::preset(&params)?;
            pipeline::keygen(&literal, &keys)
                .with_context(|| format!("keygen into {}", keys.display()))?;
        }
        Command::EncryptGenotypes {
            input,
            keys,
            out,
            max_samples,
        } => {
            let shape = pipeline::encrypt_genotypes(&keys, &input, &out, max_samples)
                .with_context(|| format!("encrypting genotypes {}", input.display()))?;
            info!("genotypes: {}", shape);
        }
        Command::EncryptModel { input, keys, out } => {
            let shape = pipeline::encrypt_model(&keys, &input, &out)
                .with_context(|| format!("encrypting coefficients {}", input.display()))?;
            info!("coefficients: {}", shape);
        }
        Command::Evaluate { keys, out, threads } => {
            let shape = pipeline::evaluate(&keys, &out, threads)
                .with_context(|| format!("evaluating {}", out.display()))?;
            info!("cross matrix: {}", shape);
        }
        Command::Decrypt { keys, out, name } => {
            let (path, _) = pipeline::decrypt(&keys, &out, &name)
                .with_context(|| format!("decrypting {}", out.display()))?;
            println!("{}", path.display());
        }
        Command::Run {
            genotypes,
            coefficients,
            out,
            name,
            params,
            max_samples,
            threads,
            verify,
            tolerance,
        } => {
            let cfg: RunConfig = RunConfig {
                genotypes,
                coefficients,
                out,
                name,
                params: ParametersLiteral::preset(&params)?,
                max_samples,
                threads,
                verify,
            };
            let report: RunReport = pipeline::run(&cfg).context("running the pipeline")?;
            println!("{}", report.output.display());
            if let Some(err) = report.max_error {
                if err > tolerance {
                    bail!(
                        "scores deviate from the plaintext scores by {:e} > {:e}",
                        err,
                        tolerance
                    );
                }
                println!("verified: max deviation {:e}", err);
            }
        }
    }
    Ok(())
}
