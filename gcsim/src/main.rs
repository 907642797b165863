use clap::Parser as ClapParser;
use std::{
    io::{self, Write},
    path::PathBuf,
    process,
};

use heap::{
    DEFAULT_ROOT_CAPACITY, GcError, Simulator, SimulatorSettings, export::dot::DEFAULT_DOT_PATH,
};
use log::LevelFilter;

mod menu;
mod report;

use menu::{Menu, MenuError, Outputs};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum number of GC roots
    #[arg(long, default_value_t = DEFAULT_ROOT_CAPACITY)]
    root_capacity: usize,

    /// Fail allocations that would exceed this many live bytes
    #[arg(long)]
    heap_limit: Option<usize>,

    /// Where "Visualize Heap" writes its graph
    #[arg(long, default_value = DEFAULT_DOT_PATH)]
    dot_path: PathBuf,

    /// Directory for snapshot_<n>.txt files
    #[arg(long, default_value = ".")]
    snapshot_dir: PathBuf,

    /// Run one leak scenario and exit instead of starting the menu
    #[arg(long, value_name = "ID")]
    scenario: Option<u8>,

    /// Log more (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let settings = SimulatorSettings {
        root_capacity: cli.root_capacity,
        heap_limit: cli.heap_limit,
    };
    let mut sim = match Simulator::new(settings) {
        Ok(sim) => sim,
        Err(msg) => {
            eprintln!("Invalid settings: {msg}");
            process::exit(2);
        }
    };

    let result = match cli.scenario {
        Some(id) => run_scenario(&mut sim, id),
        None => {
            let outputs = Outputs {
                dot_path: cli.dot_path,
                snapshot_dir: cli.snapshot_dir,
            };
            let stdin = io::stdin();
            Menu::new(&mut sim, stdin.lock(), io::stdout(), outputs).run()
        }
    };

    match result {
        Ok(()) => {}
        Err(MenuError::Fatal(err)) => {
            println!("Memory allocation failed!");
            eprintln!("Error: {err}");
            process::exit(1);
        }
        Err(MenuError::Io(err)) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}

fn run_scenario(sim: &mut Simulator, id: u8) -> Result<(), MenuError> {
    let mut stdout = io::stdout().lock();
    match sim.force_scenario(id) {
        Ok(report) => report::scenario(&mut stdout, &report)?,
        Err(err @ GcError::UnknownScenario { .. }) => {
            eprintln!("Error: {err}");
            process::exit(2);
        }
        Err(err) => return Err(MenuError::Fatal(err)),
    }
    stdout.flush()?;
    Ok(())
}
