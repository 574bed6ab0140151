use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recsynth::file::OutputFile;
use recsynth::numeric::format_float;
use recsynth::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

const INFO: &str = "\
recsynth: simulate recombination and synthesize phased genotypes
usage: recsynth [--help] <subcommand>

Subcommands:

  simulate: recombine the haplotypes of a VCF along a genetic map.
  rates:    interpolate VCF marker positions and their crossover probabilities.

";

#[derive(Parser)]
#[clap(name = "recsynth")]
#[clap(about = INFO)]
struct Cli {
    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args)]
struct MarkerArgs {
    /// the phased input VCF (plain or gzip-compressed)
    #[arg(long, required = true)]
    vcf: PathBuf,
    /// the genetic map
    #[arg(long, required = true)]
    map: PathBuf,
    /// the genetic map layout
    #[arg(long, value_enum, default_value_t = MapFormat::default())]
    map_format: MapFormat,
    /// the chromosome to simulate, as named in the genetic map
    #[arg(long, required = true)]
    chrom: String,
    /// markers must lie strictly above this position (default: first map position)
    #[arg(long)]
    lower: Option<Position>,
    /// markers must lie strictly below this position (default: last map position)
    #[arg(long)]
    upper: Option<Position>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one generation of recombination and write the recombined VCF.
    ///
    /// Haplotypes of all samples are shuffled, then each sample crosses over
    /// between consecutive markers with the probability given by the genetic
    /// map distance between them.
    ///
    /// Example:
    ///
    ///  $ recsynth simulate --vcf panel.vcf.gz --map chr20.b38.gmap.gz --chrom 20 \
    ///      --output synthetic.vcf.gz --recvalid crossovers.txt --seed 42
    Simulate {
        #[command(flatten)]
        markers: MarkerArgs,
        /// the output VCF (gzip-compressed if it ends in .gz)
        #[arg(long, required = true)]
        output: PathBuf,
        /// write the position of every crossover to this file
        #[arg(long)]
        recvalid: Option<PathBuf>,
        /// random seed (if not set, one is drawn and logged)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write the interpolated map position and crossover probability of each marker.
    ///
    /// This will output a TSV with the following columns:
    ///
    ///  - chromosome name
    ///  - marker position
    ///  - interpolated map position (in centiMorgans)
    ///  - crossover probability since the previous marker (in Morgans)
    Rates {
        #[command(flatten)]
        markers: MarkerArgs,
        /// the output file path (if not set, uses standard out)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Include a header
        #[arg(long, default_value_t = false)]
        header: bool,
    },
}

fn setup_logger(verbose: u8) {
    let log_level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    simple_logging::log_to_stderr(log_level);
}

/// Log the time spent in a stage, like `Calculate rec rate (0.12s)`.
fn bullet(stage: &str, timer: &mut Instant) {
    log::info!("  * {} ({:.2}s)", stage, timer.elapsed().as_secs_f64());
    *timer = Instant::now();
}

/// Read the map and markers, and interpolate. Returns the bounds used.
fn load_rates(
    args: &MarkerArgs,
    timer: &mut Instant,
) -> Result<(MarkerPositions, RecombinationRates, Position, Position), RecSynthError> {
    let maps = GeneticMaps::read(&args.map, args.map_format)?;
    let map = maps.get(&args.chrom)?;
    let (map_start, map_end) = map.span();
    let lower = args.lower.unwrap_or(map_start);
    let upper = args.upper.unwrap_or(map_end);
    bullet(
        &format!(
            "Read genetic map: {} positions, {} cM",
            map.len(),
            format_float(map.total_length())
        ),
        timer,
    );

    let markers = MarkerPositions::from_vcf(&args.vcf, lower, upper)?;
    bullet(
        &format!("Retrieve bp from VCF: {} markers in ({}, {})", markers.len(), lower, upper),
        timer,
    );

    let rates = RecombinationRates::interpolate(&markers, map)?;
    bullet("Calculate rec rate", timer);
    Ok((markers, rates, lower, upper))
}

fn simulate(
    args: &MarkerArgs,
    output: &Path,
    recvalid: Option<&Path>,
    seed: Option<u64>,
) -> Result<(), RecSynthError> {
    let mut timer = Instant::now();
    let (markers, rates, lower, upper) = load_rates(args, &mut timer)?;

    let n_samples = recsynth::vcf::VcfReader::from_path(&args.vcf)?.n_samples();
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    log::info!("Simulating {} samples with seed {}", n_samples, seed);

    let mut simulator = RecombinationSimulator::new(StdRng::seed_from_u64(seed));
    if let Some(path) = recvalid {
        simulator = simulator.with_crossover_log(path);
    }
    let simulation = simulator.simulate(rates.rates(), &markers, n_samples)?;
    if let Some(crossovers) = &simulation.crossovers {
        log::info!("{} crossovers recorded", crossovers.len());
    }
    bullet("Simulate recombination sites", &mut timer);

    let written = GenotypeSynthesizer::new(&simulation.matrix, rates.map_positions(), lower, upper)
        .synthesize(&args.vcf, output, &args.chrom)?;
    bullet(&format!("Write {} synthetic records", written), &mut timer);
    Ok(())
}

fn write_rates(args: &MarkerArgs, output: Option<&Path>, header: bool) -> Result<(), RecSynthError> {
    let mut timer = Instant::now();
    let (markers, rates, _, _) = load_rates(args, &mut timer)?;

    // open writer, possibly to stdout
    let mut writer: Box<dyn Write> = match output {
        Some(path) => OutputFile::new(path).writer()?,
        None => Box::new(io::stdout()),
    };

    if header {
        writeln!(writer, "chrom\tpos\tmap_pos\trate")?;
    }
    let iter = markers
        .iter()
        .zip(rates.map_positions())
        .zip(rates.rates());
    for ((position, map_pos), rate) in iter {
        writeln!(
            writer,
            "{}\t{}\t{}\t{:e}",
            args.chrom,
            position,
            format_float(*map_pos),
            rate
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn run() -> Result<(), RecSynthError> {
    let cli = Cli::parse();
    setup_logger(cli.verbose);
    match &cli.command {
        Some(Commands::Simulate {
            markers,
            output,
            recvalid,
            seed,
        }) => simulate(markers, output, recvalid.as_deref(), *seed),
        Some(Commands::Rates {
            markers,
            output,
            header,
        }) => write_rates(markers, output.as_deref(), *header),
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    }
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
