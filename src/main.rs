use std::error::Error as StdError;
use std::fs::File;
use std::io::{self, prelude::*, BufReader, BufWriter};
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use min_label_components::{report_reader, Format, LabelPropagation, ReportOptions, Strategy};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "min-label-components",
    about = "Finds the connected components of a graph by min-label propagation"
)]
struct Opt {
    /// Edge list or GFA file, read from stdin if omitted
    #[structopt(parse(from_os_str))]
    input: Option<PathBuf>,
    /// Input format: auto, gfa or tsv. Auto picks GFA for `.gfa` files
    #[structopt(short, long, default_value = "auto")]
    format: Format,
    /// Safety cap on the number of propagation steps
    #[structopt(short = "n", long, default_value = "100")]
    max_iterations: usize,
    /// Only recompute neighbors of nodes that changed in the last step
    #[structopt(long)]
    frontier: bool,
    /// Run every propagation step on the calling thread
    #[structopt(long)]
    sequential: bool,
    /// Number of worker threads for parallel steps
    #[structopt(short, long)]
    threads: Option<usize>,
    /// Only list components with at least this many members
    #[structopt(long, default_value = "1")]
    min_size: usize,
    /// Print the node to component assignment as JSON
    #[structopt(long)]
    json: bool,
    /// Raise log verbosity, may be repeated. RUST_LOG takes precedence
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let opt = Opt::from_args();
    init_logging(opt.verbose);

    match run(&opt) {
        Ok(true) => (),
        // the printed labels are not a certified result
        Ok(false) => process::exit(2),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}

fn run(opt: &Opt) -> Result<bool, Box<dyn StdError>> {
    if let Some(threads) = opt.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let strategy = if opt.frontier {
        Strategy::Frontier
    } else {
        Strategy::Full
    };
    let propagation = LabelPropagation::new(opt.max_iterations)?
        .with_strategy(strategy)
        .with_parallel(!opt.sequential);

    let reader: Box<dyn BufRead> = match &opt.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let format = opt.format.resolve(opt.input.as_deref());
    let options = ReportOptions {
        min_size: opt.min_size,
        json: opt.json,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let converged = report_reader(&mut out, reader, format, &propagation, &options)?;
    Ok(converged)
}
