//! field-crypt - encrypt, decrypt and mask PII column values.
//!
//! Reads the master key from `FIELD_CRYPT_MASTER_KEY`. Logs go to stderr so
//! stdout carries only envelopes and plaintext.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use field_crypt::{masking, EncryptionService, Envelope, KeyConfig, MasterKey};
use serde::Serialize;
use std::io::{self, BufRead};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroize;

#[derive(Parser)]
#[command(name = "field-crypt")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Field-level envelope encryption for sensitive column values",
    long_about = "Encrypts values with AES-256-GCM under a PBKDF2-derived per-value key and prints base64 envelopes suitable for a single text column."
)]
struct Cli {
    /// Use a random in-memory master key when none is configured
    #[arg(long, global = true)]
    allow_ephemeral_key: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new random master key
    Keygen {
        /// Output encoding
        #[arg(long, value_enum, default_value = "hex")]
        encoding: KeyEncoding,
    },

    /// Encrypt a secret and print its envelope
    Encrypt {
        /// Read the secret as one line from stdin instead of prompting
        #[arg(long)]
        stdin: bool,
    },

    /// Decrypt an envelope and print the plaintext
    Decrypt {
        /// Base64 envelope
        envelope: String,
    },

    /// Show the structure of an envelope without decrypting it
    Inspect {
        /// Base64 envelope
        envelope: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mask a value for display
    Mask {
        /// Kind of value
        #[arg(value_enum)]
        kind: MaskKind,

        /// Value to mask
        value: String,

        /// Visible suffix length for `text`
        #[arg(long, default_value = "4")]
        visible: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KeyEncoding {
    Hex,
    Base64,
}

#[derive(Clone, Copy, ValueEnum)]
enum MaskKind {
    NationalId,
    BankAccount,
    Phone,
    Email,
    Text,
}

#[derive(Serialize)]
struct EnvelopeReport {
    format: field_crypt::EnvelopeFormat,
    total_bytes: usize,
    salt: String,
    iv: String,
    tag: String,
    ciphertext_bytes: usize,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = KeyConfig::from_env().context("failed to load configuration")?;
    config.allow_ephemeral_key |= cli.allow_ephemeral_key;
    init_logging(&config.log_level)?;

    match cli.command {
        Commands::Keygen { encoding } => cmd_keygen(encoding),
        Commands::Encrypt { stdin } => cmd_encrypt(&config, stdin),
        Commands::Decrypt { envelope } => cmd_decrypt(&config, &envelope),
        Commands::Inspect { envelope, json } => cmd_inspect(&envelope, json),
        Commands::Mask {
            kind,
            value,
            visible,
        } => {
            cmd_mask(kind, &value, visible);
            Ok(())
        }
    }
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))
}

fn read_secret(from_stdin: bool) -> Result<String> {
    if from_stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read secret from stdin")?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    } else {
        rpassword::prompt_password("Secret: ").context("failed to read secret")
    }
}

fn cmd_keygen(encoding: KeyEncoding) -> Result<()> {
    let key = MasterKey::generate()?;
    match encoding {
        KeyEncoding::Hex => println!("{}", key.to_hex()),
        KeyEncoding::Base64 => println!("{}", key.to_base64()),
    }
    Ok(())
}

fn cmd_encrypt(config: &KeyConfig, from_stdin: bool) -> Result<()> {
    let service = EncryptionService::from_config(config)?;
    let mut secret = read_secret(from_stdin)?;
    let result = service.encrypt(Some(secret.as_str()));
    secret.zeroize();

    match result? {
        Some(envelope) => println!("{}", envelope),
        None => eprintln!("(empty input, nothing to encrypt)"),
    }

    Ok(())
}

fn cmd_decrypt(config: &KeyConfig, envelope: &str) -> Result<()> {
    if envelope.trim().is_empty() {
        bail!("envelope is empty");
    }

    let service = EncryptionService::from_config(config)?;
    if let Some(plaintext) = service.decrypt(Some(envelope))? {
        println!("{}", plaintext);
    }

    Ok(())
}

fn cmd_inspect(envelope: &str, json: bool) -> Result<()> {
    let envelope = Envelope::decode(envelope)?;
    let report = EnvelopeReport {
        format: envelope.format,
        total_bytes: envelope.encoded_len(),
        salt: hex::encode(envelope.salt),
        iv: hex::encode(envelope.iv),
        tag: hex::encode(envelope.tag),
        ciphertext_bytes: envelope.ciphertext.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Envelope");
    println!("========");
    println!("Format:           {:?}", report.format);
    println!("Total size:       {} bytes", report.total_bytes);
    println!("Salt:             {}", report.salt);
    println!("IV:               {}", report.iv);
    println!("Tag:              {}", report.tag);
    println!("Ciphertext:       {} bytes", report.ciphertext_bytes);

    Ok(())
}

fn cmd_mask(kind: MaskKind, value: &str, visible: usize) {
    let masked = match kind {
        MaskKind::NationalId => masking::mask_national_id(value),
        MaskKind::BankAccount => masking::mask_bank_account(value),
        MaskKind::Phone => masking::mask_phone(value),
        MaskKind::Email => masking::mask_email(value),
        MaskKind::Text => masking::mask_text(value, visible),
    };
    println!("{}", masked);
}
