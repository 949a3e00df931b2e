//! axonvault: operator CLI for the AxonOS neural data vault
//!
//! Commands:
//!   encrypt <in> <out>         - seal a file into an envelope, print its data id
//!   decrypt <in> <out> --id    - open an envelope
//!   anonymize <in>             - add calibrated noise to a whitespace-separated signal
//!   tag <file> / verify        - HMAC integrity tags keyed by the vault
//!   token-encrypt / -decrypt   - timestamped authenticated tokens on stdin/stdout
//!   session                    - mint fresh session parameters
//!   config show                - display the active configuration
//!
//! The master secret is read from the environment variable named by
//! `security.master_key_env` (default `AXONOS_MASTER_KEY`).

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axon_core::{AxonConfig, Metadata, SecurityConfig};
use axon_crypto::{IntegrityTag, SessionParams};
use axon_privacy::{add_noise, NoiseMechanism, Sensitivity};
use axon_vault::{DataId, EncryptedEnvelope, Vault};
use clap::{Parser, Subcommand, ValueEnum};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "axonvault",
    version,
    about = "AxonOS zero-knowledge neural data vault",
    long_about = "axonvault: encrypt, decrypt and anonymize neural recordings under an operator-held master secret"
)]
struct Cli {
    /// Path to axonvault.toml configuration file
    #[arg(long, short = 'c', env = "AXON_CONFIG", default_value = "axonvault.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [log].level
    #[arg(long, env = "AXON_LOG")]
    log: Option<String>,

    /// Log format; overrides [log].format
    #[arg(long, env = "AXON_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Print the audit trail as JSON lines on stderr when the command finishes.
    /// Only valid for commands that open the vault (not anonymize, session, config)
    #[arg(long, global = true)]
    audit: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MechanismArg {
    Laplace,
    Gaussian,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file into a vault envelope
    Encrypt {
        input: PathBuf,
        output: PathBuf,
        /// JSON metadata recorded (unencrypted) in the audit trail
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Decrypt a vault envelope
    Decrypt {
        input: PathBuf,
        output: PathBuf,
        /// Data id printed by `encrypt`
        #[arg(long)]
        id: DataId,
    },

    /// Add calibrated noise to a signal of whitespace-separated numbers
    Anonymize {
        input: PathBuf,
        /// Privacy parameter (default: [privacy].default_epsilon)
        #[arg(long)]
        epsilon: Option<f64>,
        #[arg(long, value_enum, default_value = "laplace")]
        mechanism: MechanismArg,
        /// Gaussian delta (default: [privacy].default_delta)
        #[arg(long)]
        delta: Option<f64>,
        /// Fixed sensitivity; omitted means the signal's standard deviation
        #[arg(long)]
        sensitivity: Option<f64>,
    },

    /// Print the integrity tag of a file (hex)
    Tag { file: PathBuf },

    /// Check a file against an integrity tag
    Verify {
        file: PathBuf,
        /// Hex tag printed by `tag`
        tag: String,
    },

    /// Encrypt stdin into an authenticated token
    #[command(name = "token-encrypt")]
    TokenEncrypt,

    /// Decrypt a token read from stdin
    #[command(name = "token-decrypt")]
    TokenDecrypt {
        /// Reject tokens older than this many seconds (overrides config)
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Generate fresh session parameters (JSON)
    Session,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Commands {
    /// Whether the command opens the vault (and so produces an audit trail)
    fn opens_vault(&self) -> bool {
        !matches!(
            self,
            Commands::Anonymize { .. } | Commands::Session | Commands::Config { .. }
        )
    }
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AxonConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format {
        Some(format) => format,
        None => LogFormat::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("invalid [log].format: {e}"))?,
    };
    init_logging(&level, format);

    if cli.audit && !cli.command.opens_vault() {
        anyhow::bail!("--audit only applies to commands that open the vault");
    }

    match cli.command {
        Commands::Encrypt {
            input,
            output,
            metadata,
        } => with_vault(&config, cli.audit, |vault| {
            cmd_encrypt(vault, &input, &output, metadata.as_deref())
        }),
        Commands::Decrypt { input, output, id } => {
            with_vault(&config, cli.audit, |vault| cmd_decrypt(vault, &input, &output, &id))
        }
        Commands::Anonymize {
            input,
            epsilon,
            mechanism,
            delta,
            sensitivity,
        } => cmd_anonymize(&config, &input, epsilon, mechanism, delta, sensitivity),
        Commands::Tag { file } => with_vault(&config, cli.audit, |vault| cmd_tag(vault, &file)),
        Commands::Verify { file, tag } => {
            with_vault(&config, cli.audit, |vault| cmd_verify(vault, &file, &tag))
        }
        Commands::TokenEncrypt => with_vault(&config, cli.audit, cmd_token_encrypt),
        Commands::TokenDecrypt { ttl } => {
            if ttl.is_some() {
                config.security.token_ttl_secs = ttl;
            }
            with_vault(&config, cli.audit, cmd_token_decrypt)
        }
        Commands::Session => cmd_session(),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr.
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Open a vault from the config and the environment secret, run `f`, then
/// optionally dump the audit trail.
fn with_vault(config: &AxonConfig, audit: bool, f: impl FnOnce(&Vault) -> Result<()>) -> Result<()> {
    let security = SecurityConfig::from_env(&config.security, &config.audit)
        .context("resolving master secret")?;
    let vault = Vault::new(security).context("opening vault")?;

    f(&vault)?;

    if audit {
        let trail = vault
            .ledger()
            .export_json_lines()
            .context("exporting audit trail")?;
        eprint!("{trail}");
    }
    Ok(())
}

// ── `axonvault encrypt` / `decrypt` ───────────────────────────────────────────

fn cmd_encrypt(vault: &Vault, input: &Path, output: &Path, metadata: Option<&str>) -> Result<()> {
    let metadata: Option<Metadata> = metadata
        .map(serde_json::from_str)
        .transpose()
        .context("parsing --metadata as JSON")?;
    let data = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;

    let (envelope, id) = vault.encrypt(&data, metadata);
    std::fs::write(output, envelope.to_bytes())
        .with_context(|| format!("writing {}", output.display()))?;

    println!("{id}");
    Ok(())
}

fn cmd_decrypt(vault: &Vault, input: &Path, output: &Path, id: &DataId) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let envelope = EncryptedEnvelope::from_bytes(&bytes)
        .with_context(|| format!("parsing envelope {}", input.display()))?;

    let (plaintext, meta) = vault.decrypt(&envelope, id).context("decrypting envelope")?;
    std::fs::write(output, plaintext).with_context(|| format!("writing {}", output.display()))?;

    tracing::info!(decrypted_at = %meta.decrypted_at, "wrote {}", output.display());
    Ok(())
}

// ── `axonvault anonymize` ─────────────────────────────────────────────────────

fn cmd_anonymize(
    config: &AxonConfig,
    input: &Path,
    epsilon: Option<f64>,
    mechanism: MechanismArg,
    delta: Option<f64>,
    sensitivity: Option<f64>,
) -> Result<()> {
    let content =
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let signal = parse_signal(&content)?;

    let epsilon = epsilon.unwrap_or(config.privacy.default_epsilon);
    let mechanism = match mechanism {
        MechanismArg::Laplace => NoiseMechanism::Laplace,
        MechanismArg::Gaussian => NoiseMechanism::Gaussian {
            delta: delta.unwrap_or(config.privacy.default_delta),
        },
    };
    let sensitivity = sensitivity.map_or(Sensitivity::Empirical, Sensitivity::Fixed);

    let noisy = add_noise(&signal, epsilon, mechanism, sensitivity).context("adding noise")?;

    let mut out = std::io::stdout().lock();
    for value in noisy {
        writeln!(out, "{value}")?;
    }
    Ok(())
}

fn parse_signal(content: &str) -> Result<Vec<f64>> {
    content
        .split_whitespace()
        .enumerate()
        .map(|(i, token)| {
            token
                .parse::<f64>()
                .with_context(|| format!("sample {i}: not a number: {token:?}"))
        })
        .collect()
}

// ── `axonvault tag` / `verify` ────────────────────────────────────────────────

fn cmd_tag(vault: &Vault, file: &Path) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    println!("{}", vault.integrity_tag(&data).to_hex());
    Ok(())
}

fn cmd_verify(vault: &Vault, file: &Path, tag: &str) -> Result<()> {
    let tag = IntegrityTag::from_hex(tag.trim())
        .context("tag must be 64 hex characters")?;
    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    if !vault.verify_integrity(&data, tag.as_bytes()) {
        anyhow::bail!("integrity check failed: {}", file.display());
    }
    println!("OK");
    Ok(())
}

// ── `axonvault token-encrypt` / `token-decrypt` ──────────────────────────────

fn cmd_token_encrypt(vault: &Vault) -> Result<()> {
    let mut data = Vec::new();
    std::io::stdin()
        .read_to_end(&mut data)
        .context("reading stdin")?;
    println!("{}", vault.encrypt_token(&data));
    Ok(())
}

fn cmd_token_decrypt(vault: &Vault) -> Result<()> {
    let mut token = String::new();
    std::io::stdin()
        .read_to_string(&mut token)
        .context("reading stdin")?;
    let plaintext = vault
        .decrypt_token(token.trim())
        .context("decrypting token")?;
    std::io::stdout().lock().write_all(&plaintext)?;
    Ok(())
}

// ── `axonvault session` / `config show` ──────────────────────────────────────

fn cmd_session() -> Result<()> {
    let params = SessionParams::generate();
    println!(
        "{}",
        serde_json::to_string_pretty(&params).context("serializing session parameters")?
    );
    Ok(())
}

fn cmd_config_show(config: &AxonConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
