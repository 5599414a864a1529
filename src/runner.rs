use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Command, FromArgMatches as _};
use log::{info, LevelFilter};

use crate::context::Context;
use crate::event_runner::{EventRunner, RunSummary};
use crate::input::{load_properties, read_contacts, read_initial_cases, read_population};
use crate::log::apply_log_level_arg;
use crate::random::RandomSampler;
use crate::report::{
    write_daily_records, write_infection_map, DAILY_RECORDS_FILE, INFECTION_MAP_FILE,
};

/// Default cli arguments for the simulator
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Path to the simulation properties file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Path to the population file (CSV)
    #[arg(short, long)]
    pub population: PathBuf,

    /// Path to the contact events file (CSV)
    #[arg(long)]
    pub contacts: PathBuf,

    /// Path to the initial case ids (JSON array)
    #[arg(short, long)]
    pub initial_cases: PathBuf,

    /// Optional directory for report output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// A log level (`info`) or a comma separated list of `module=level` pairs
    #[arg(short, long)]
    pub log_level: Option<String>,
}

fn create_cli() -> Command {
    let cli = Command::new("contact_tracing_sim");
    BaseArgs::augment_args(cli)
}

/// Parses the command line and runs a simulation.
///
/// # Errors
/// Returns an error if argument parsing, loading the inputs, the run or writing the reports
/// fails
pub fn run_with_args() -> Result<(RunSummary, Context), Box<dyn Error>> {
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    run_with_args_internal(args)
}

fn run_with_args_internal(args: BaseArgs) -> Result<(RunSummary, Context), Box<dyn Error>> {
    if let Some(log_level) = &args.log_level {
        let filters = apply_log_level_arg(log_level)?;
        if filters.is_empty() {
            println!("Logging enabled at level {}", log_level.trim().to_uppercase());
        }
        for (module, level) in &filters {
            println!("Logging enabled for {module} at level {}", level_name(*level));
        }
    }

    let started = Instant::now();
    let properties = load_properties(&args.config)?;
    let population = read_population(&args.population)?;
    let contacts = read_contacts(&args.contacts)?;
    let initial_cases = read_initial_cases(&args.initial_cases)?;

    let mut context = Context::new(
        properties,
        population,
        Box::new(RandomSampler::new(args.random_seed)),
    )?;
    context.add_contacts(contacts)?;

    let mut runner = EventRunner::new(initial_cases);
    let summary = runner.run(&mut context)?;

    if let Some(output_dir) = &args.output_dir {
        write_reports(output_dir, &context)?;
    }

    info!(
        "finished {} steps in {}",
        summary.steps,
        humantime::format_duration(started.elapsed())
    );
    Ok((summary, context))
}

fn write_reports(output_dir: &Path, context: &Context) -> Result<(), Box<dyn Error>> {
    write_daily_records(&output_dir.join(DAILY_RECORDS_FILE), context.statistics())?;
    write_infection_map(&output_dir.join(INFECTION_MAP_FILE), context.statistics())?;
    info!("reports written to {}", output_dir.display());
    Ok(())
}

fn level_name(level: LevelFilter) -> String {
    level.to_string().to_uppercase()
}
