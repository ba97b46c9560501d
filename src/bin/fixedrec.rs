//! Convert fixed-length records (with any record terminator) to delimited text.
//!
//! Usage:
//!   fixedrec -i input.bin -o out.tsv -c layout.struct
//!   fixedrec -i input.bin -o out.tsv -c layout.struct --in-term lf
//!   fixedrec -i input.bin -o out.tsv -c layout.struct --struct FIX47
//!   fixedrec -i input.bin -o out.csv -c layout.struct --sep "," --escape hex --prefix %
//!
//! Exit code 2 on config, selection, argument, framing or I/O errors; 1 when the input is empty.
//! Set `RUST_LOG` (default `warn`) to control diagnostics on stderr.

use anyhow::Context;
use clap::Parser;
use fixedrec::{
    describe, read_layout_file, resolve_external_path, resolve_separator, EscapeMode,
    FramingPolicy, LayoutDef, LayoutSet, Terminator, TranscodeOptions, Transcoder,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fixedrec",
    version,
    about = "Fixed-length records (any terminator) to delimited text, driven by struct layout files"
)]
struct Cli {
    /// Input binary: repeated [fields][input terminator]
    #[arg(short, long)]
    input: PathBuf,
    /// Output text file (written as raw bytes)
    #[arg(short, long)]
    output: PathBuf,
    /// Struct layout file (UTF-8, UTF-8 with BOM, or Shift_JIS)
    #[arg(short, long)]
    config: PathBuf,
    /// Struct to use (default: chosen by input extension)
    #[arg(long = "struct")]
    struct_name: Option<String>,
    /// Input record terminator: crlf|lf|cr|none|hex:..|'\n' ...
    #[arg(long, default_value = "crlf")]
    in_term: String,
    /// Output line terminator: crlf|lf|cr|none|hex:..|'\n' ...
    #[arg(long, default_value = "crlf")]
    out_term: String,
    /// Field rendering: none (raw bytes) or hex
    #[arg(long, default_value = "none")]
    escape: String,
    /// Per-byte prefix for --escape hex (e.g. %, \u, $); empty gives space-separated pairs
    #[arg(long, default_value = "")]
    prefix: String,
    /// Field separator: ',' / 'hex:1f' / '\t' / ' | ' ...
    #[arg(long, default_value = "\\t")]
    sep: String,
    /// Only convert the first N records (0 = all)
    #[arg(long, default_value_t = 0)]
    max_rows: usize,
    /// Warn and continue on missing or mismatched input terminators
    #[arg(long)]
    lenient: bool,
    /// Print the layout and record arithmetic, then exit
    #[arg(long)]
    dump_layout: bool,
    /// Print a one-line machine-friendly summary
    #[arg(long)]
    summary: bool,
    /// Write the names of all defined structs as a header line
    #[arg(long)]
    header_structs: bool,
}

fn print_layouts(layouts: &LayoutSet) {
    eprintln!("# defined structs:");
    for layout in layouts {
        let exts = if layout.extensions().is_empty() {
            "(no extension mapping)".to_string()
        } else {
            layout
                .extensions()
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(", ")
        };
        eprintln!("  - {}: fields={}, exts={}", layout.name(), layout.fields().len(), exts);
    }
}

fn build_options(cli: &Cli, layouts: &LayoutSet) -> anyhow::Result<TranscodeOptions> {
    let escape: EscapeMode = cli.escape.parse()?;
    Ok(TranscodeOptions {
        terminator_in: Terminator::parse(&cli.in_term)?.as_bytes().to_vec(),
        terminator_out: Terminator::parse(&cli.out_term)?.as_bytes().to_vec(),
        separator: resolve_separator(&cli.sep)?,
        escape,
        prefix: cli.prefix.clone(),
        policy: if cli.lenient {
            FramingPolicy::Lenient
        } else {
            FramingPolicy::Strict
        },
        max_records: (cli.max_rows > 0).then_some(cli.max_rows),
        header: cli
            .header_structs
            .then(|| layouts.names().into_iter().map(String::from).collect()),
    })
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config_path = resolve_external_path(&cli.config);
    let input_path = resolve_external_path(&cli.input);
    let output_path = resolve_external_path(&cli.output);

    let text = read_layout_file(&config_path).context("config file error")?;
    let layouts = LayoutSet::parse(&text).context("config file error")?;

    let layout: &LayoutDef = match layouts.select(cli.struct_name.as_deref(), &input_path) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("[ERR] struct selection failed: {}", e);
            print_layouts(&layouts);
            return Ok(ExitCode::from(2));
        }
    };

    let options = build_options(cli, &layouts).context("invalid argument")?;
    let transcoder = Transcoder::new(layout, &options)?;

    let input_size = std::fs::metadata(&input_path)
        .with_context(|| format!("cannot access input file {}", input_path.display()))?
        .len();
    if input_size == 0 {
        eprintln!("[ERR] input file is empty: {}", input_path.display());
        return Ok(ExitCode::from(1));
    }

    if cli.dump_layout {
        if let Some(warning) = transcoder.check_input_size(input_size) {
            tracing::warn!("{}", warning);
        }
        println!("{}", describe(layout, &options, input_size));
        return Ok(ExitCode::SUCCESS);
    }

    let input = File::open(&input_path)
        .with_context(|| format!("cannot open input {}", input_path.display()))?;
    let output = File::create(&output_path)
        .with_context(|| format!("cannot create output {}", output_path.display()))?;
    let stats = transcoder
        .run(BufReader::new(input), BufWriter::new(output), Some(input_size))
        .context("conversion failed")?;

    if cli.summary {
        println!(
            "records_out={}, warnings={}, record_size_in={}B (fields={}B + in-term {}B), in-term=\"{}\", out-term=\"{}\", sep=\"{}\", struct={}",
            stats.records,
            stats.warning_count(),
            options.input_record_len(layout),
            layout.record_len(),
            options.terminator_in.len(),
            options.terminator_in.escape_ascii(),
            options.terminator_out.escape_ascii(),
            options.separator.escape_ascii(),
            layout.name()
        );
    } else {
        println!(
            "done: {} records -> {} (struct={})",
            stats.records,
            output_path.display(),
            layout.name()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[ERR] {:#}", e);
            ExitCode::from(2)
        }
    }
}
