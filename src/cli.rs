// Command-line front end for oxipack.
//
// Subcommands read JSON text or packed bytes from files or stdio and go
// through the `io` stream helpers. Without `--encoding` the schema-less
// ANY_PACKED_TYPE_TAG_BYTE_PREFIX layout is used.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use serde_json::Value;

use crate::codec::cache::{CacheConfig, DEFAULT_MAX_BYTE_SIZE, DEFAULT_MIN_STRING_LENGTH};
use crate::codec::DEFAULT_MAX_DEPTH;
use crate::encoding::Encoding;
use crate::encoding::loader::{self, ENCODING_KEY, OPTIONS_KEY};
use crate::engine::{DecodeOptions, EncodeOptions};
use crate::io::{decode_stream, encode_stream};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (digits, unit) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1usize << 10),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1 << 20),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1 << 30),
        _ => (s, 1),
    };
    let count: usize = digits
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    count
        .checked_mul(unit)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Schema-directed binary JSON encoder/decoder.
#[derive(Parser, Debug)]
#[command(
    name = "oxipack",
    version,
    about = "Schema-directed binary JSON encoder/decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Encode a JSON document.
    Encode(EncodeArgs),
    /// Decode an encoded document back to JSON.
    Decode(DecodeArgs),
    /// Validate an encoding descriptor and print its tree.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Encoding descriptor file (default: schema-less encoding).
    #[arg(long, short = 'e', value_hint = ValueHint::FilePath)]
    encoding: Option<PathBuf>,

    /// Input JSON file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Never emit back-references to repeated strings.
    #[arg(long = "no-shared-strings")]
    no_shared_strings: bool,

    /// Shortest string worth sharing, in bytes.
    #[arg(long = "min-shared-length", default_value_t = DEFAULT_MIN_STRING_LENGTH)]
    min_shared_length: usize,

    /// String cache capacity (supports K/M/G suffix).
    #[arg(long = "cache-size", value_parser = parse_byte_size, default_value_t = DEFAULT_MAX_BYTE_SIZE)]
    cache_size: usize,

    /// Maximum nesting of arrays and objects.
    #[arg(long = "max-depth", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Encoding descriptor file (default: schema-less encoding).
    #[arg(long, short = 'e', value_hint = ValueHint::FilePath)]
    encoding: Option<PathBuf>,

    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output JSON file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Maximum nesting of arrays and objects.
    #[arg(long = "max-depth", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Ignore bytes left over after the document.
    #[arg(long = "allow-trailing-data")]
    allow_trailing_data: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Encoding descriptor file.
    #[arg(long, short = 'e', value_hint = ValueHint::FilePath)]
    encoding: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Encode,
    Decode,
    Inspect,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    encoding_file: Option<PathBuf>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    encode: EncodeOptions,
    decode: DecodeOptions,
    pretty: bool,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            use_stdout: false,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            encoding_file: None,
            input_file: None,
            output_file: None,
            encode: EncodeOptions::default(),
            decode: DecodeOptions::default(),
            pretty: false,
        }
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::Encode(args) => {
            let cache = if args.no_shared_strings {
                CacheConfig::disabled()
            } else {
                CacheConfig {
                    min_string_length: args.min_shared_length,
                    max_byte_size: args.cache_size,
                }
            };
            Options {
                use_stdout: args.stdout,
                encoding_file: args.encoding.clone(),
                input_file: args.input.clone().or_else(|| args.input_pos.clone()),
                output_file: args.output.clone().or_else(|| args.output_pos.clone()),
                encode: EncodeOptions {
                    cache,
                    max_depth: args.max_depth,
                },
                ..Options::new(Command::Encode, &cli)
            }
        }
        Cmd::Decode(args) => Options {
            use_stdout: args.stdout,
            encoding_file: args.encoding.clone(),
            input_file: args.input.clone().or_else(|| args.input_pos.clone()),
            output_file: args.output.clone().or_else(|| args.output_pos.clone()),
            decode: DecodeOptions {
                max_depth: args.max_depth,
                allow_trailing_data: args.allow_trailing_data,
            },
            pretty: args.pretty,
            ..Options::new(Command::Decode, &cli)
        },
        Cmd::Inspect(args) => Options {
            encoding_file: Some(args.encoding.clone()),
            ..Options::new(Command::Inspect, &cli)
        },
        Cmd::Config => Options::new(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("oxipack".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

fn load_encoding(path: Option<&Path>) -> Result<Encoding, String> {
    let Some(path) = path else {
        return Ok(Encoding::any());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("encoding file: {}: {e}", path.display()))?;
    loader::from_str(&text).map_err(|e| format!("encoding file: {}: {e}", path.display()))
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>, String> {
    match path {
        Some(path) => File::open(path)
            .map(|f| Box::new(BufReader::with_capacity(BUF_SIZE, f)) as Box<dyn Read>)
            .map_err(|e| format!("input file: {}: {e}", path.display())),
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, String> {
    match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            File::create(path)
                .map(|f| Box::new(BufWriter::with_capacity(BUF_SIZE, f)) as Box<dyn Write>)
                .map_err(|e| format!("output file: {}: {e}", path.display()))
        }
    }
}

fn print_json_stats(json: &Value) {
    match serde_json::to_string_pretty(json) {
        Ok(text) => eprintln!("{text}"),
        Err(e) => eprintln!("oxipack: stats: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("oxipack version {version} (Rust)");
    eprintln!("Licensed under the MIT License");

    let parallel = cfg!(feature = "parallel") as u8;
    let fuzzing = cfg!(feature = "fuzzing") as u8;

    eprintln!("PARALLEL={parallel}");
    eprintln!("FUZZING={fuzzing}");
    eprintln!("DEFAULT_MIN_SHARED_LENGTH={DEFAULT_MIN_STRING_LENGTH}");
    eprintln!("DEFAULT_CACHE_SIZE={DEFAULT_MAX_BYTE_SIZE}");
    eprintln!("DEFAULT_MAX_DEPTH={DEFAULT_MAX_DEPTH}");
    eprintln!("ENCODINGS={}", loader::NAMES.len());

    0
}

// ---------------------------------------------------------------------------
// Encode command
// ---------------------------------------------------------------------------

fn cmd_encode(opts: &Options) -> i32 {
    let encoding = match load_encoding(opts.encoding_file.as_deref()) {
        Ok(encoding) => encoding,
        Err(e) => {
            eprintln!("oxipack: {e}");
            return 1;
        }
    };
    let reader = match open_input(opts.input_file.as_deref()) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("oxipack: {e}");
            return 1;
        }
    };
    let writer = match open_output(opts) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("oxipack: {e}");
            return 1;
        }
    };

    let stats = match encode_stream(&encoding, reader, writer, &opts.encode) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("oxipack: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxipack: encoder: {}, input size: {}, output size: {}, cached strings: {}",
            encoding.name(),
            stats.input_size,
            stats.output_size,
            stats.cached_strings
        );
    }

    if opts.json_output {
        print_json_stats(&serde_json::json!({
            "command": "encode",
            "encoding": encoding.name(),
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "cached_strings": stats.cached_strings,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

fn cmd_decode(opts: &Options) -> i32 {
    let encoding = match load_encoding(opts.encoding_file.as_deref()) {
        Ok(encoding) => encoding,
        Err(e) => {
            eprintln!("oxipack: {e}");
            return 1;
        }
    };
    let reader = match open_input(opts.input_file.as_deref()) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("oxipack: {e}");
            return 1;
        }
    };
    let writer = match open_output(opts) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("oxipack: {e}");
            return 1;
        }
    };

    let stats = match decode_stream(&encoding, reader, writer, &opts.decode, opts.pretty) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("oxipack: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxipack: decoder: {}, input size: {}, output size: {}",
            encoding.name(),
            stats.input_size,
            stats.output_size
        );
    }

    if opts.json_output {
        print_json_stats(&serde_json::json!({
            "command": "decode",
            "encoding": encoding.name(),
            "input_size": stats.input_size,
            "output_size": stats.output_size,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

/// Render a descriptor as an indented tree, one encoding per line.
fn describe(descriptor: &Value, label: &str, depth: usize, out: &mut String) {
    let name = descriptor
        .get(ENCODING_KEY)
        .and_then(Value::as_str)
        .unwrap_or("?");
    let mut line = format!("{:indent$}{label}{name}", "", indent = depth * 2);
    let mut children = Vec::new();

    if let Some(Value::Object(options)) = descriptor.get(OPTIONS_KEY) {
        for (key, value) in options {
            match key.as_str() {
                "encoding" | "keyEncoding" => children.push((format!("{key}: "), value)),
                "prefixEncodings" => {
                    for (index, child) in value.as_array().into_iter().flatten().enumerate() {
                        children.push((format!("prefixEncodings[{index}]: "), child));
                    }
                }
                _ => line.push_str(&format!(" {key}={value}")),
            }
        }
    }

    out.push_str(&line);
    out.push('\n');
    for (label, child) in children {
        describe(child, &label, depth + 1, out);
    }
}

fn cmd_inspect(opts: &Options) -> i32 {
    let encoding = match load_encoding(opts.encoding_file.as_deref()) {
        Ok(encoding) => encoding,
        Err(e) => {
            eprintln!("oxipack: {e}");
            return 1;
        }
    };

    let descriptor = loader::to_json(&encoding);
    let text = if opts.json_output {
        match serde_json::to_string_pretty(&descriptor) {
            Ok(text) => text + "\n",
            Err(e) => {
                eprintln!("oxipack: {e}");
                return 1;
            }
        }
    } else {
        let mut tree = String::new();
        describe(&descriptor, "", 0, &mut tree);
        tree
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        eprintln!("oxipack: write error: {e}");
        return 1;
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    let filter = match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Warn if -c overrides output filename.
    if opts.use_stdout && !opts.quiet {
        if let Some(path) = &opts.output_file {
            eprintln!(
                "oxipack: warning: -c option overrides output filename: {}",
                path.display()
            );
        }
    }
    if opts.use_stdout {
        opts.output_file = None;
    }

    let exit_code = match opts.command {
        Command::Encode => cmd_encode(&opts),
        Command::Decode => cmd_decode(&opts),
        Command::Inspect => cmd_inspect(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
