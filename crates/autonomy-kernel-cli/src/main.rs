// crates/autonomy-kernel-cli/src/main.rs
// ============================================================================
// Module: Autonomy Kernel CLI Entry Point
// Description: Command dispatcher for offline kernel tooling.
// Purpose: Validate envelopes, build and check Merkle proofs, verify receipt
//          chains, and validate configuration without a running kernel.
// Dependencies: clap, autonomy-kernel-core, autonomy-kernel-config,
//               autonomy-kernel-store-sqlite, serde, serde_jcs, thiserror.
// ============================================================================

//! ## Overview
//! The `autonomy-kernel` binary exposes the kernel's offline checks. Every
//! command reads bounded JSON inputs, writes canonical JSON to stdout, and
//! exits non-zero when a check fails. Errors are written to stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use autonomy_kernel_cli::t;
use autonomy_kernel_config::KernelConfig;
use autonomy_kernel_core::AutonomyEnvelope;
use autonomy_kernel_core::MerkleBuilder;
use autonomy_kernel_core::MerkleProof;
use autonomy_kernel_core::MerkleTree;
use autonomy_kernel_core::Receipt;
use autonomy_kernel_core::SessionId;
use autonomy_kernel_core::Timestamp;
use autonomy_kernel_core::merkle::MERKLE_PROFILE_ID;
use autonomy_kernel_core::merkle::MerkleLeaf;
use autonomy_kernel_core::merkle::verify_proof;
use autonomy_kernel_core::runtime::Ed25519Verifier;
use autonomy_kernel_core::runtime::EnvelopeValidator;
use autonomy_kernel_core::runtime::ManualClock;
use autonomy_kernel_core::runtime::compute_content_hash;
use autonomy_kernel_core::verify_receipt_chain;
use autonomy_kernel_store_sqlite::SqliteKernelStore;
use autonomy_kernel_store_sqlite::SqliteStoreConfig;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of an envelope JSON input.
const MAX_ENVELOPE_BYTES: usize = 1024 * 1024;
/// Maximum size of a Merkle leaves JSON input.
const MAX_LEAVES_BYTES: usize = 16 * 1024 * 1024;
/// Maximum size of a Merkle proof JSON input.
const MAX_PROOF_BYTES: usize = 1024 * 1024;
/// Maximum size of a receipts JSON input.
const MAX_RECEIPTS_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "autonomy-kernel", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Envelope validation and hashing.
    Envelope {
        /// Selected envelope subcommand.
        #[command(subcommand)]
        command: EnvelopeCommand,
    },
    /// Merkle evidence utilities.
    Merkle {
        /// Selected Merkle subcommand.
        #[command(subcommand)]
        command: MerkleCommand,
    },
    /// Receipt chain utilities.
    Receipts {
        /// Selected receipts subcommand.
        #[command(subcommand)]
        command: ReceiptsCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Envelope subcommands.
#[derive(Subcommand, Debug)]
enum EnvelopeCommand {
    /// Validate an envelope and report every issue.
    Validate(EnvelopeValidateCommand),
    /// Print the envelope content hash.
    Hash(EnvelopeHashCommand),
}

/// Merkle subcommands.
#[derive(Subcommand, Debug)]
enum MerkleCommand {
    /// Build a tree and print its root.
    Build(MerkleBuildCommand),
    /// Build a tree and print an inclusion proof for one leaf.
    Prove(MerkleProveCommand),
    /// Verify an inclusion proof.
    Verify(MerkleVerifyCommand),
}

/// Receipts subcommands.
#[derive(Subcommand, Debug)]
enum ReceiptsCommand {
    /// Verify signatures and linkage of a session's receipts.
    VerifyChain(ReceiptsVerifyChainCommand),
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for envelope validation.
#[derive(Args, Debug)]
struct EnvelopeValidateCommand {
    /// Path to the envelope JSON file.
    #[arg(long, value_name = "PATH")]
    envelope: PathBuf,
    /// Optional config file supplying allowed algorithms and the signer key.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Hex Ed25519 public key used to verify the attestation signature.
    #[arg(long, value_name = "HEX")]
    public_key: Option<String>,
    /// Evaluate expiry at this unix time instead of now.
    #[arg(long, value_name = "UNIX_SECONDS")]
    now_unix: Option<i64>,
}

/// Arguments for envelope hashing.
#[derive(Args, Debug)]
struct EnvelopeHashCommand {
    /// Path to the envelope JSON file.
    #[arg(long, value_name = "PATH")]
    envelope: PathBuf,
}

/// Arguments for building a Merkle tree.
#[derive(Args, Debug)]
struct MerkleBuildCommand {
    /// Path to a JSON array of `{path, value, sealed}` leaves.
    #[arg(long, value_name = "PATH")]
    leaves: PathBuf,
}

/// Arguments for generating an inclusion proof.
#[derive(Args, Debug)]
struct MerkleProveCommand {
    /// Path to a JSON array of `{path, value, sealed}` leaves.
    #[arg(long, value_name = "PATH")]
    leaves: PathBuf,
    /// Leaf index to prove.
    #[arg(long, value_name = "INDEX", conflicts_with = "path")]
    index: Option<usize>,
    /// Leaf path to prove.
    #[arg(long, value_name = "LEAF_PATH")]
    path: Option<String>,
}

/// Arguments for verifying an inclusion proof.
#[derive(Args, Debug)]
struct MerkleVerifyCommand {
    /// Path to the proof JSON file.
    #[arg(long, value_name = "PATH")]
    proof: PathBuf,
    /// Expected root; the proof's claimed root must equal it.
    #[arg(long, value_name = "HEX")]
    root: Option<String>,
}

/// Arguments for receipt chain verification.
#[derive(Args, Debug)]
struct ReceiptsVerifyChainCommand {
    /// Path to a JSON array of receipts in chain order.
    #[arg(long, value_name = "PATH", conflicts_with = "store")]
    receipts: Option<PathBuf>,
    /// Path to a `SQLite` kernel store.
    #[arg(long, value_name = "PATH", requires = "session")]
    store: Option<PathBuf>,
    /// Session to read from the store.
    #[arg(long, value_name = "SESSION_ID")]
    session: Option<String>,
    /// Hex Ed25519 public key of the receipt signer.
    #[arg(long, value_name = "HEX")]
    public_key: Option<String>,
    /// Optional config file supplying the signer key.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to autonomy-kernel.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Input and Output Shapes
// ============================================================================

/// One leaf in a Merkle leaves file.
#[derive(Debug, Deserialize)]
struct LeafInput {
    /// Leaf path label.
    path: String,
    /// JSON value hashed in canonical form.
    value: Value,
    /// Whether the leaf is sealed.
    #[serde(default)]
    sealed: bool,
}

/// Output of `envelope hash`.
#[derive(Serialize)]
struct HashOutput {
    /// `sha256:` content hash.
    content_hash: String,
}

/// Output of `merkle build`.
#[derive(Serialize)]
struct BuildOutput<'a> {
    /// Merkle profile identifier.
    profile: &'static str,
    /// Hex-encoded root.
    root: String,
    /// Leaves in insertion order.
    leaves: &'a [MerkleLeaf],
}

/// Output of `merkle verify`.
#[derive(Serialize)]
struct VerifyOutput {
    /// True when the proof folds to its root (and the expected root, if given).
    valid: bool,
    /// Root claimed by the proof.
    root: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Envelope {
            command,
        } => command_envelope(command),
        Commands::Merkle {
            command,
        } => command_merkle(command),
        Commands::Receipts {
            command,
        } => command_receipts(command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(&help).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Envelope Commands
// ============================================================================

/// Dispatches envelope subcommands.
fn command_envelope(command: EnvelopeCommand) -> CliResult<ExitCode> {
    match command {
        EnvelopeCommand::Validate(command) => command_envelope_validate(&command),
        EnvelopeCommand::Hash(command) => command_envelope_hash(&command),
    }
}

/// Executes `envelope validate`.
fn command_envelope_validate(command: &EnvelopeValidateCommand) -> CliResult<ExitCode> {
    let envelope: AutonomyEnvelope =
        read_json(&command.envelope, "envelope", MAX_ENVELOPE_BYTES)?;
    let config = load_optional_config(command.config.as_deref())?;
    let mut validator = EnvelopeValidator::new()
        .with_allowed_algorithms(config.validator.allowed_algorithms.iter().copied());
    if let Some(verifier) = resolve_verifier(command.public_key.as_deref(), &config)? {
        validator = validator.with_verifier(Arc::new(verifier));
    }
    if let Some(now) = command.now_unix {
        let instant = resolve_unix_seconds(now)?;
        validator = validator.with_clock(Arc::new(ManualClock::new(instant)));
    }
    let result = validator.validate(&envelope);
    write_canonical_json(&result)?;
    Ok(if result.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Executes `envelope hash`.
fn command_envelope_hash(command: &EnvelopeHashCommand) -> CliResult<ExitCode> {
    let envelope: AutonomyEnvelope =
        read_json(&command.envelope, "envelope", MAX_ENVELOPE_BYTES)?;
    let content_hash = compute_content_hash(&envelope)
        .map_err(|err| CliError::new(t!("envelope.hash_failed", error = err)))?;
    write_canonical_json(&HashOutput {
        content_hash,
    })?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Merkle Commands
// ============================================================================

/// Dispatches Merkle subcommands.
fn command_merkle(command: MerkleCommand) -> CliResult<ExitCode> {
    match command {
        MerkleCommand::Build(command) => command_merkle_build(&command),
        MerkleCommand::Prove(command) => command_merkle_prove(&command),
        MerkleCommand::Verify(command) => command_merkle_verify(&command),
    }
}

/// Executes `merkle build`.
fn command_merkle_build(command: &MerkleBuildCommand) -> CliResult<ExitCode> {
    let tree = build_tree(&command.leaves)?;
    write_canonical_json(&BuildOutput {
        profile: MERKLE_PROFILE_ID,
        root: tree.root_hex(),
        leaves: tree.leaves(),
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `merkle prove`.
fn command_merkle_prove(command: &MerkleProveCommand) -> CliResult<ExitCode> {
    let tree = build_tree(&command.leaves)?;
    let index = match (command.index, command.path.as_deref()) {
        (Some(index), _) => index,
        (None, Some(path)) => tree
            .leaves()
            .iter()
            .find(|leaf| leaf.path == path)
            .map(|leaf| leaf.index)
            .ok_or_else(|| CliError::new(t!("merkle.leaf_not_found", path = path)))?,
        (None, None) => return Err(CliError::new(t!("merkle.selector_missing"))),
    };
    let proof = tree
        .generate_proof(index)
        .map_err(|err| CliError::new(t!("merkle.prove_failed", error = err)))?;
    write_canonical_json(&proof)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `merkle verify`.
fn command_merkle_verify(command: &MerkleVerifyCommand) -> CliResult<ExitCode> {
    let proof: MerkleProof = read_json(&command.proof, "proof", MAX_PROOF_BYTES)?;
    let folds = verify_proof(&proof)
        .map_err(|err| CliError::new(t!("merkle.verify_failed", error = err)))?;
    let root_matches = command.root.as_deref().is_none_or(|root| root == proof.root);
    let output = VerifyOutput {
        valid: folds && root_matches,
        root: proof.root,
    };
    write_canonical_json(&output)?;
    Ok(if output.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Reads a leaves file and builds its tree.
fn build_tree(path: &Path) -> CliResult<MerkleTree> {
    let leaves: Vec<LeafInput> = read_json(path, "leaves", MAX_LEAVES_BYTES)?;
    if leaves.is_empty() {
        return Err(CliError::new(t!("merkle.leaves_empty")));
    }
    let mut builder = MerkleBuilder::new();
    for leaf in leaves {
        builder
            .add_leaf(leaf.path, &leaf.value, leaf.sealed)
            .map_err(|err| CliError::new(t!("merkle.build_failed", error = err)))?;
    }
    builder.build().map_err(|err| CliError::new(t!("merkle.build_failed", error = err)))
}

// ============================================================================
// SECTION: Receipt Commands
// ============================================================================

/// Dispatches receipt subcommands.
fn command_receipts(command: ReceiptsCommand) -> CliResult<ExitCode> {
    match command {
        ReceiptsCommand::VerifyChain(command) => command_receipts_verify_chain(&command),
    }
}

/// Executes `receipts verify-chain`.
fn command_receipts_verify_chain(command: &ReceiptsVerifyChainCommand) -> CliResult<ExitCode> {
    let config = load_optional_config(command.config.as_deref())?;
    let verifier = resolve_verifier(command.public_key.as_deref(), &config)?
        .ok_or_else(|| CliError::new(t!("signer.key_missing")))?;
    let receipts = match (&command.receipts, &command.store, &command.session) {
        (Some(path), _, _) => read_json::<Vec<Receipt>>(path, "receipts", MAX_RECEIPTS_BYTES)?,
        (None, Some(store), Some(session)) => read_store_session(store, session)?,
        _ => return Err(CliError::new(t!("receipts.source_missing"))),
    };
    let report = verify_receipt_chain(&receipts, &verifier);
    write_canonical_json(&report)?;
    Ok(if report.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Loads a session's receipts from an existing `SQLite` store.
fn read_store_session(path: &Path, session: &str) -> CliResult<Vec<Receipt>> {
    if !path.is_file() {
        return Err(CliError::new(t!("receipts.store_missing", path = path.display())));
    }
    let store = SqliteKernelStore::new(&SqliteStoreConfig::at(path))
        .map_err(|err| CliError::new(t!("receipts.store_failed", error = err)))?;
    store
        .receipts_for_session(&SessionId::new(session))
        .map_err(|err| CliError::new(t!("receipts.store_failed", error = err)))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = KernelConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Loads config from an explicit path, or returns defaults when none is given.
fn load_optional_config(path: Option<&Path>) -> CliResult<KernelConfig> {
    match path {
        Some(path) => KernelConfig::load(Some(path))
            .map_err(|err| CliError::new(t!("config.load_failed", error = err))),
        None => Ok(KernelConfig::default()),
    }
}

/// Resolves a verifier from an explicit key, falling back to the config signer.
fn resolve_verifier(
    public_key: Option<&str>,
    config: &KernelConfig,
) -> CliResult<Option<Ed25519Verifier>> {
    if let Some(hex) = public_key {
        return Ed25519Verifier::from_public_key_hex(hex)
            .map(Some)
            .map_err(|err| CliError::new(t!("signer.public_key_invalid", error = err)));
    }
    config
        .signer
        .verifier()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Converts unix seconds into a timestamp.
fn resolve_unix_seconds(seconds: i64) -> CliResult<Timestamp> {
    Timestamp::from_unix_seconds(seconds)
        .ok_or_else(|| CliError::new(t!("time.invalid_unix", value = seconds)))
}

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let read_limit = limit.saturating_add(1);
    let mut limited = file.take(read_limit);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads and parses a bounded JSON input file.
fn read_json<T: DeserializeOwned>(path: &Path, kind: &str, max_bytes: usize) -> CliResult<T> {
    let bytes = read_bytes_with_limit(path, max_bytes).map_err(|err| match err {
        ReadLimitError::Io(err) => CliError::new(t!(
            "input.read_failed",
            kind = kind,
            path = path.display(),
            error = err
        )),
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(t!(
            "input.read_too_large",
            kind = kind,
            path = path.display(),
            size = size,
            limit = limit
        )),
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        CliError::new(t!("input.parse_failed", kind = kind, path = path.display(), error = err))
    })
}

/// Writes a value to stdout as canonical JSON followed by a newline.
fn write_canonical_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(t!("output.json_failed", error = err)))?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
