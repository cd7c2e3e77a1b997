//! Command-line configuration.

use clap::{Args, Parser, Subcommand};

use crate::crypto::{init_code_hash, Address, InitCodeHash, Salt};
use crate::flags::{FlagMask, FlagParseError};
use crate::miner::{MiningRequest, DEFAULT_MAX_ITERATIONS};

/// Deterministic deployment proxy present at the same address on most EVM chains.
pub const DEFAULT_DEPLOYER: &str = "0x4e59b44847b379578588920cA78FbF26c0B4956C";

/// Hook address miner
///
/// Finds a CREATE2 salt whose resulting address encodes exactly the requested
/// hook permission flags in its low 14 bits.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search for a salt
    Mine(MineArgs),
    /// Recompute the address for a known salt and check its flags
    Verify(VerifyArgs),
    /// List the flags an address exposes
    Flags(FlagsArgs),
}

/// Where the init code hash comes from: given directly or hashed from bytecode.
#[derive(Args, Debug, Clone)]
pub struct InitCodeArgs {
    /// keccak256(creationCode || constructorArgs), 32 bytes hex
    #[arg(
        long,
        conflicts_with_all = ["init_code", "constructor_args"],
        required_unless_present = "init_code"
    )]
    pub init_code_hash: Option<String>,

    /// Contract creation bytecode (hex)
    #[arg(long)]
    pub init_code: Option<String>,

    /// ABI-encoded constructor arguments appended to the creation code (hex)
    #[arg(long, requires = "init_code")]
    pub constructor_args: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MineArgs {
    /// Address that will execute CREATE2 (20 bytes hex)
    #[arg(short, long, default_value = DEFAULT_DEPLOYER)]
    pub deployer: String,

    #[command(flatten)]
    pub init_code: InitCodeArgs,

    /// Flags the address must expose: names (before-swap,after-swap) and/or a number (0x00c0)
    #[arg(short, long)]
    pub flags: String,

    /// Candidates to try before giving up (salts 0..N)
    #[arg(short = 'm', long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u64,

    /// Number of worker threads (default: number of CPU cores, 1 = sequential)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Address that executes CREATE2 (20 bytes hex)
    #[arg(short, long, default_value = DEFAULT_DEPLOYER)]
    pub deployer: String,

    #[command(flatten)]
    pub init_code: InitCodeArgs,

    /// Salt, decimal or 0x-prefixed hex
    #[arg(short, long)]
    pub salt: String,

    /// Flags the address is expected to expose
    #[arg(short, long)]
    pub flags: String,

    /// Address the deployment actually landed at, if known
    #[arg(short, long)]
    pub expected: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct FlagsArgs {
    /// Address to decode (20 bytes hex)
    pub address: String,
}

impl InitCodeArgs {
    /// Returns the init code hash, hashing bytecode and arguments if needed.
    pub fn resolve(&self) -> Result<InitCodeHash, ConfigError> {
        if let Some(ref hash) = self.init_code_hash {
            return parse_hash("init_code_hash", hash);
        }
        let Some(ref code) = self.init_code else {
            return Err(ConfigError::InvalidConfig(
                "one of init_code_hash or init_code is required".into(),
            ));
        };
        let code = decode_hex("init_code", code)?;
        let args = match self.constructor_args {
            Some(ref args) => decode_hex("constructor_args", args)?,
            None => Vec::new(),
        };
        Ok(init_code_hash(&code, &args))
    }
}

impl MineArgs {
    /// Returns the number of workers, defaulting to CPU count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Parses every field into a request. The target mask is not range-checked
    /// here; the miner reports out-of-domain bits itself.
    pub fn request(&self) -> Result<MiningRequest, ConfigError> {
        Ok(MiningRequest::new(
            parse_address("deployer", &self.deployer)?,
            self.init_code.resolve()?,
            self.flags.parse()?,
            self.max_iterations,
        ))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.request().map(|_| ())
    }
}

impl VerifyArgs {
    pub fn deployer(&self) -> Result<Address, ConfigError> {
        parse_address("deployer", &self.deployer)
    }

    pub fn salt(&self) -> Result<Salt, ConfigError> {
        self.salt
            .parse()
            .map_err(|e| ConfigError::InvalidConfig(format!("salt: {}", e)))
    }

    pub fn target(&self) -> Result<FlagMask, ConfigError> {
        Ok(self.flags.parse()?)
    }

    pub fn expected(&self) -> Result<Option<Address>, ConfigError> {
        self.expected
            .as_deref()
            .map(|s| parse_address("expected", s))
            .transpose()
    }
}

impl FlagsArgs {
    pub fn address(&self) -> Result<Address, ConfigError> {
        parse_address("address", &self.address)
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, ConfigError> {
    let h = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(h).map_err(|e| ConfigError::InvalidHex(format!("{}: {}", field, e)))
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
    value.parse().map_err(|_| {
        ConfigError::InvalidHex(format!("{} must be 20 bytes (40 hex chars)", field))
    })
}

fn parse_hash(field: &str, value: &str) -> Result<InitCodeHash, ConfigError> {
    let h = value.strip_prefix("0x").unwrap_or(value);
    let mut out = [0u8; 32];
    hex::decode_to_slice(h, &mut out).map_err(|_| {
        ConfigError::InvalidHex(format!("{} must be 32 bytes (64 hex chars)", field))
    })?;
    Ok(out)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Invalid flags: {0}")]
    InvalidFlags(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<FlagParseError> for ConfigError {
    fn from(e: FlagParseError) -> Self {
        ConfigError::InvalidFlags(e.0)
    }
}
