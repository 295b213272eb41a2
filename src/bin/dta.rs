use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use walkdir::WalkDir;

use dta_reader::dataset::VariableType;
use dta_reader::logger::{log_error, set_log_file, set_log_prefix};
use dta_reader::sinks::{ColumnSink, CsvSink};
use dta_reader::{DtaReader, ReadOptions};

#[derive(Parser)]
#[command(name = "dta", version, about = "Inspect Stata dta files and convert them to CSV/TSV")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one or more inputs to delimited text.
    Convert(ConvertArgs),
    /// Inspect dataset metadata and print a summary.
    Inspect(InspectArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    Csv,
    Tsv,
}

#[derive(Parser, Clone)]
#[allow(clippy::struct_excessive_bools)]
struct ConvertArgs {
    /// Input files or directories (recurses directories).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (computed file names).
    #[arg(long, conflicts_with = "out")]
    out_dir: Option<PathBuf>,

    /// Output file (only valid with a single input).
    #[arg(long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Sink kind: csv or tsv.
    #[arg(long, value_enum, default_value_t = SinkKind::Csv)]
    sink: SinkKind,

    /// Field delimiter. Defaults to ',' for csv and '\t' for tsv.
    #[arg(long)]
    delimiter: Option<char>,

    /// Write header row.
    #[arg(long = "headers", action = ArgAction::SetTrue, default_value_t = true)]
    headers: bool,
    /// Disable header row.
    #[arg(long = "no-headers", action = ArgAction::SetFalse, overrides_with = "headers")]
    _no_headers: bool,

    /// Observations decoded per batch.
    #[arg(long, default_value_t = 65_536)]
    batch_rows: i64,

    /// Emit raw long-string references instead of their text.
    #[arg(long)]
    raw_strls: bool,

    /// Emit byte codes instead of category labels.
    #[arg(long)]
    raw_labels: bool,

    /// Keep date-formatted columns as numbers.
    #[arg(long)]
    raw_dates: bool,

    /// Number of concurrent worker threads.
    #[arg(long)]
    jobs: Option<usize>,

    /// Stop on first error.
    #[arg(long)]
    fail_fast: bool,

    /// Also append warnings and errors to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Parser, Clone)]
struct InspectArgs {
    input: PathBuf,
    /// Emit JSON instead of human readable output.
    #[arg(long)]
    json: bool,
}

type AnyError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => run_convert(&args),
        Command::Inspect(args) => run_inspect(&args),
    }
}

fn run_convert(args: &ConvertArgs) -> Result<(), AnyError> {
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()?;
    }
    if let Some(path) = &args.log_file {
        set_log_file(path)?;
    }
    if args.batch_rows <= 0 {
        return Err("--batch-rows must be positive".into());
    }

    let files = discover_inputs(&args.inputs);
    if args.out.is_some() && files.len() != 1 {
        return Err("--out requires a single input".into());
    }

    let convert = |input: &PathBuf| {
        let output = args
            .out
            .clone()
            .unwrap_or_else(|| output_path(input, args));
        convert_one(input, &output, args)
    };

    if args.fail_fast {
        return files.par_iter().try_for_each(convert);
    }
    let failures = files
        .par_iter()
        .filter(|input| match convert(*input) {
            Ok(()) => false,
            Err(err) => {
                log_error(&format!("{}: {err}", input.display()));
                true
            }
        })
        .count();
    if failures > 0 {
        eprintln!("{} of {} files failed", failures, files.len());
    }
    Ok(())
}

fn read_options(args: &ConvertArgs) -> ReadOptions {
    ReadOptions::new()
        .with_resolve_long_strings(!args.raw_strls)
        .with_resolve_category_labels(!args.raw_labels)
        .with_convert_dates(!args.raw_dates)
}

fn convert_one(input: &Path, output: &Path, args: &ConvertArgs) -> Result<(), AnyError> {
    let _prefix = set_log_prefix(input.display().to_string());
    let mut reader = DtaReader::open_with_options(input, read_options(args))?;
    if !reader.metadata().version.is_tagged() && !args.raw_labels {
        reader.load_value_labels()?;
    }

    let delimiter = match (args.delimiter, args.sink) {
        (Some(c), _) => u8::try_from(c).map_err(|_| "delimiter must be a single-byte character")?,
        (None, SinkKind::Csv) => b',',
        (None, SinkKind::Tsv) => b'\t',
    };
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(output)?);
    let mut sink = CsvSink::new(file)
        .with_delimiter(delimiter)
        .with_headers(args.headers);

    sink.begin(reader.metadata())?;
    while reader.remaining_rows() > 0 {
        let batch = reader.read(args.batch_rows)?;
        sink.write_batch(&batch)?;
    }
    sink.finish()?;
    Ok(())
}

fn run_inspect(args: &InspectArgs) -> Result<(), AnyError> {
    let mut reader = DtaReader::open(&args.input)?;
    if !reader.metadata().version.is_tagged() {
        reader.load_value_labels()?;
    }
    let meta = reader.metadata();

    if args.json {
        #[derive(serde::Serialize)]
        struct InspectJson<'a> {
            metadata: &'a dta_reader::dataset::DtaMetadata,
            value_labels: &'a dta_reader::dataset::ValueLabels,
            strl_count: usize,
        }
        let payload = InspectJson {
            metadata: meta,
            value_labels: reader.value_labels(),
            strl_count: reader.strls().len(),
        };
        serde_json::to_writer_pretty(std::io::stdout(), &payload)?;
        println!();
    } else {
        println!(
            "Format: {}  Rows: {}  Columns: {}  Label: {}",
            meta.version.code(),
            meta.row_count,
            meta.variable_count,
            meta.dataset_label
        );
        for v in &meta.variables {
            let kind = match v.kind {
                VariableType::FixedString(width) => format!("str{width}"),
                VariableType::Strl => "strL".to_owned(),
                VariableType::Double => "double".to_owned(),
                VariableType::Float => "float".to_owned(),
                VariableType::Long => "long".to_owned(),
                VariableType::Int => "int".to_owned(),
                VariableType::Byte => "byte".to_owned(),
            };
            println!(
                "[{idx:>3}] {name:<32}  {kind:<7}  fmt={fmt:<12}  labels={set}",
                idx = v.index,
                name = v.name,
                fmt = v.format,
                set = v.value_label_set
            );
        }
    }
    Ok(())
}

/// Expands directories into the `.dta` files below them; explicit file
/// arguments must carry the extension too. Missing paths are skipped.
fn discover_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = inputs
        .iter()
        .flat_map(|input| {
            WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
        })
        .filter(|path| is_dta(path))
        .collect();
    files.sort();
    files.dedup();
    files
}

fn is_dta(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("dta"))
}

fn output_path(input: &Path, args: &ConvertArgs) -> PathBuf {
    let extension = match args.sink {
        SinkKind::Csv => "csv",
        SinkKind::Tsv => "tsv",
    };
    let renamed = input.with_extension(extension);
    match (&args.out_dir, renamed.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => renamed,
    }
}
