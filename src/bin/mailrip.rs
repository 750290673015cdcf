//! Command-line front end: wires the tuning knobs to a
//! [`Config`], chooses an output sink, and runs [`mailrip::extract_auto`]
//! over one input file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use mailrip::config::{Config, RenameMethod, UnpackMode};
use mailrip::sink::fs::FilesystemSink;
use mailrip::sink::memory::MemorySink;
use tracing::{error, info};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RenameArg {
    PrefixCounter,
    PrefixCounterRandom,
    InfixCounter,
    InfixCounterRandom,
    PostfixCounter,
    PostfixCounterRandom,
}

impl From<RenameArg> for RenameMethod {
    fn from(value: RenameArg) -> Self {
        match value {
            RenameArg::PrefixCounter => RenameMethod::PrefixCounter,
            RenameArg::PrefixCounterRandom => RenameMethod::PrefixCounterRandom,
            RenameArg::InfixCounter => RenameMethod::InfixCounter,
            RenameArg::InfixCounterRandom => RenameMethod::InfixCounterRandom,
            RenameArg::PostfixCounter => RenameMethod::PostfixCounter,
            RenameArg::PostfixCounterRandom => RenameMethod::PostfixCounterRandom,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UnpackArg {
    ToDirectory,
    InMemory,
    ListOnly,
}

/// Extract attachments and embedded bodies from a MIME email, an mbox
/// file, or a concatenation of either.
#[derive(Parser, Debug)]
#[command(name = "mailrip", version, about)]
struct Cli {
    /// Path to the input message or mbox file.
    input: PathBuf,

    /// Directory to unpack attachments into (ignored for `--unpack-mode
    /// list-only` or `in-memory`).
    #[arg(short, long, default_value = "mailrip-out")]
    output: PathBuf,

    /// How decoded output should be delivered.
    #[arg(long, value_enum, default_value = "to-directory")]
    unpack_mode: UnpackArg,

    /// Collision-renaming scheme for duplicate attachment names.
    #[arg(long, value_enum, default_value = "postfix-counter")]
    rename_method: RenameArg,

    /// Maximum `message/rfc822` / multipart recursion depth.
    #[arg(long, default_value_t = 20)]
    max_recursion_level: u32,

    /// Derive default filenames from the declared content type instead
    /// of a numbered `textfile<N>` prefix.
    #[arg(long)]
    name_by_type: bool,

    /// Drop parts that declare no usable name instead of synthesizing one.
    #[arg(long)]
    no_nameless: bool,

    /// Disable the base64 decoder (parts stay undecoded).
    #[arg(long)]
    no_base64: bool,

    /// Disable the quoted-printable decoder.
    #[arg(long)]
    no_quoted_printable: bool,

    /// Disable the uuencoded-fragment scan inside text bodies.
    #[arg(long)]
    no_uuencode: bool,

    /// Disable TNEF (`application/ms-tnef`) sub-extraction.
    #[arg(long)]
    no_tnef: bool,

    /// Disable CFBF/OLE2 sub-extraction.
    #[arg(long)]
    no_ole: bool,

    /// Don't recurse into `.mht`-named parts as nested messages.
    #[arg(long)]
    no_mht: bool,

    /// Keep zero-length output parts instead of discarding them.
    #[arg(long)]
    keep_empty: bool,
}

fn build_config(cli: &Cli) -> Config {
    let mut config = Config {
        decode_base64: !cli.no_base64,
        decode_qp: !cli.no_quoted_printable,
        decode_uu: !cli.no_uuencode,
        decode_tnef: !cli.no_tnef,
        decode_ole: !cli.no_ole,
        decode_mht: !cli.no_mht,
        max_recursion_level: cli.max_recursion_level,
        name_by_type: cli.name_by_type,
        no_nameless: cli.no_nameless,
        rename_method: cli.rename_method.into(),
        keep_empty: cli.keep_empty,
        ..Config::default()
    };
    config.unpack_mode = match cli.unpack_mode {
        UnpackArg::ToDirectory => UnpackMode::ToDirectory,
        UnpackArg::InMemory => UnpackMode::InMemory,
        UnpackArg::ListOnly => UnpackMode::ListOnly,
    };
    config
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli);

    let bytes = match std::fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(path = %cli.input.display(), error = %e, "failed to read input");
            return ExitCode::FAILURE;
        }
    };

    let result = match config.unpack_mode {
        UnpackMode::ToDirectory => {
            let mut sink = match FilesystemSink::new(&cli.output) {
                Ok(sink) => sink,
                Err(e) => {
                    error!(path = %cli.output.display(), error = %e, "failed to create output directory");
                    return ExitCode::FAILURE;
                }
            };
            let result = mailrip::extract_auto(bytes, &config, &mut sink);
            if config.no_nameless {
                if let Err(e) = sink.remove_nameless(&config.default_name_prefix) {
                    error!(error = %e, "failed to remove nameless attachments");
                }
            }
            result.map(|records| {
                info!(root = %sink.root().display(), messages = records.len(), "unpacked");
                records
            })
        }
        UnpackMode::InMemory | UnpackMode::ListOnly => {
            let mut sink = MemorySink::new();
            sink.list_only = matches!(config.unpack_mode, UnpackMode::ListOnly);
            let result = mailrip::extract_auto(bytes, &config, &mut sink);
            if config.no_nameless {
                sink.remove_nameless(&config.default_name_prefix);
            }
            result.map(|records| {
                for name in sink.names() {
                    println!("{name}");
                }
                records
            })
        }
    };

    match result {
        Ok(records) => {
            for record in &records {
                if let Some(subject) = &record.subject {
                    info!(subject, defects = record.defects.total(), "message processed");
                } else {
                    info!(defects = record.defects.total(), "message processed");
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "extraction failed");
            ExitCode::FAILURE
        }
    }
}
