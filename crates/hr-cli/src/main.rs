//! hr - field-level redaction for JSON records
//!
//! - `hr redact` digests, encrypts or drops fields according to a policy
//! - `hr decrypt` restores encrypted fields
//! - `hr keygen` creates AES-256-GCM key files

use clap::{Args, Parser, Subcommand};
use hr_cli::commands::{run_decrypt, run_keygen, run_redact, GlobalOptions, RecordOptions};
use hr_cli::logging::{
    generate_run_id, init_logging, level_from_verbosity, LogConfig, LogFormat, LogLevel,
};
use hr_cli::{CliError, ExitCode};
use hr_redact::{Encoding, EncodingSetting, FilterMode};
use std::path::PathBuf;
use tracing::{debug, info};

/// Field-level redaction for JSON records
#[derive(Parser)]
#[command(name = "hr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (TOML or JSON)
    #[arg(long, global = true, env = "HR_CONFIG")]
    config: Option<PathBuf>,

    /// Base64 encryption key (32 bytes)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Key file written by `hr keygen`
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Omit timestamps from human-format log lines
    #[arg(long, global = true)]
    no_timestamps: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact fields of JSON records
    Redact(RecordArgs),

    /// Restore encrypted fields of redacted JSON records
    Decrypt(RecordArgs),

    /// Generate a new encryption key file
    Keygen(KeygenArgs),
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Input file (default: stdin)
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Read and write one JSON object per line
    #[arg(long)]
    jsonl: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Policy entry FIELD=OP (keep, remove, digest, encrypt); repeatable
    #[arg(long = "policy", short = 'p', value_name = "FIELD=OP")]
    policy: Vec<String>,

    /// Drop every field the policy does not name
    #[arg(long, conflicts_with = "filter_mode")]
    whitelist: bool,

    /// Filter mode (blacklist, whitelist)
    #[arg(long)]
    filter_mode: Option<FilterMode>,

    /// Salt appended to values before digesting
    #[arg(long)]
    salt: Option<String>,

    /// Copy empty values to the digest field instead of hashing them
    #[arg(long)]
    no_digest_empty: bool,

    /// Ciphertext encoding (true, false, base64, base64url, hex)
    #[arg(long)]
    encode: Option<EncodingSetting>,

    /// IV encoding (true, false, base64, base64url, hex)
    #[arg(long)]
    encode_iv: Option<EncodingSetting>,

    /// Encoding used when --encode/--encode-iv are `true`
    #[arg(long)]
    default_encoding: Option<Encoding>,
}

impl RecordArgs {
    fn to_options(&self) -> RecordOptions {
        RecordOptions {
            input: self.input.clone(),
            jsonl: self.jsonl,
            pretty: self.pretty,
            policy: self.policy.clone(),
            filter_mode: if self.whitelist {
                Some(FilterMode::Whitelist)
            } else {
                self.filter_mode
            },
            salt: self.salt.clone(),
            no_digest_empty: self.no_digest_empty,
            encode: self.encode,
            encode_iv: self.encode_iv,
            default_encoding: self.default_encoding,
        }
    }
}

#[derive(Args, Debug)]
struct KeygenArgs {
    /// Write the key file here (mode 0600) instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are not failures
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = cli
        .global
        .log_level
        .or_else(|| level_from_verbosity(cli.global.verbose, cli.global.quiet));
    init_logging(
        &LogConfig::from_env(cli_level, cli.global.log_format)
            .with_timestamps(!cli.global.no_timestamps),
    );

    let run_id = generate_run_id();
    let global = GlobalOptions {
        config: cli.global.config.clone(),
        key: cli.global.key.clone(),
        key_file: cli.global.key_file.clone(),
    };

    let stdout = std::io::stdout();
    let result = match &cli.command {
        Commands::Redact(args) => {
            info!(run_id = %run_id, command = "redact", "starting");
            run_redact(&global, &args.to_options(), stdout.lock())
        }
        Commands::Decrypt(args) => {
            info!(run_id = %run_id, command = "decrypt", "starting");
            run_decrypt(&global, &args.to_options(), stdout.lock())
        }
        Commands::Keygen(args) => {
            info!(run_id = %run_id, command = "keygen", "starting");
            run_keygen(args.output.as_deref(), stdout.lock())
        }
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => report(&run_id, &err),
    };

    std::process::exit(exit_code.as_i32());
}

fn report(run_id: &str, err: &CliError) -> ExitCode {
    let code = err.exit_code();
    debug!(run_id = %run_id, code = %code, "command failed");
    eprintln!("hr: {}", err);
    code
}
