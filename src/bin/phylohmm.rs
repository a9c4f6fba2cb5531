use clap::{Parser, Subcommand};
use log::LevelFilter;
use phylohmm::cli::{segment, simulate, SegmentOpts, SimulateOpts};

#[derive(Parser, Debug)]
#[clap(author, about, version)]
struct Opts {
    /// Verbosity (-v: debug, -vv: trace)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u64,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Segment an alignment into hidden states and write the intervals of a target state
    Segment(SegmentOpts),
    /// Generate a synthetic alignment and its true state labels
    Simulate(SimulateOpts),
}

fn init_logger(verbose: u64) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_millis()
        .init();
}

fn main() {
    let opts: Opts = Opts::parse();
    init_logger(opts.verbose);
    println!("# started_at={}", chrono::Local::now());
    println!("# n_threads={}", rayon::current_num_threads());
    println!("# opts={:?}", opts);
    let r = match &opts.command {
        Commands::Segment(segment_opts) => segment(segment_opts).map(|s| {
            match s.result.final_log_prob() {
                Some(log_prob) => println!("log_prob={}", log_prob.to_log_value()),
                None => println!("log_prob=NA"),
            }
            println!("n_iterations={}", s.result.n_iterations);
            println!("converged={}", s.result.converged);
            println!("n_intervals={}", s.intervals.len());
            if let Some(accuracy) = s.accuracy {
                println!("accuracy={}", accuracy);
            }
            print!("{}", s.result.params);
        }),
        Commands::Simulate(simulate_opts) => simulate(simulate_opts).map(|alignment| {
            println!("n_seqs={}", alignment.n_seqs());
            println!("n_columns={}", alignment.n_columns());
        }),
    };
    if let Err(err) = r {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
    println!("# finished_at={}", chrono::Local::now());
}
