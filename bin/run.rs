use bus8::{
    config::{Config, Overflow},
    error::{ExecutionError, FormatError, LoadError},
    event::Event,
    machine::Machine,
    memory::ProgramMemory,
};
use std::time::Duration;

use clap::{App, Arg, ArgMatches};
use slog::{o, Drain, Level, Logger};
use slog_term::{FullFormat, TermDecorator};

/// Pause between two cycles when no `--clock` is given.
const DEFAULT_CLOCK_MS: &str = "80";

enum Error {
    Arguments(String),
    Load(LoadError),
    Check(String, FormatError),
    Execution(ExecutionError),
    CycleLimit(u64),
}

impl From<LoadError> for Error {
    fn from(e: LoadError) -> Error {
        Error::Load(e)
    }
}

impl From<ExecutionError> for Error {
    fn from(e: ExecutionError) -> Error {
        Error::Execution(e)
    }
}

struct Options {
    clock: Duration,
    max_cycles: Option<u64>,
    config: Config,
    quiet: bool,
    check_only: bool,
    listing: bool,
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("bus8run")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mitja Karhusaari <mitja@karhusaari.me>")
        .about("Runs programs on the bus8 teaching CPU")
        .arg(Arg::with_name("source")
             .help("File containing the program source")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("clock")
             .help("Milliseconds to wait between cycles")
             .long("clock")
             .value_name("MS")
             .default_value(DEFAULT_CLOCK_MS))
        .arg(Arg::with_name("max-cycles")
             .help("Stop with an error after this many cycles")
             .long("max-cycles")
             .value_name("N"))
        .arg(Arg::with_name("overflow")
             .help("Behaviour of add and sub on overflow")
             .long("overflow")
             .value_name("MODE")
             .possible_values(&["wrapping", "saturating"])
             .default_value("wrapping"))
        .arg(Arg::with_name("quiet")
             .help("Only print the final machine state")
             .long("quiet")
             .short("q"))
        .arg(Arg::with_name("check")
             .help("Parse and validate the program without running it")
             .long("check"))
        .arg(Arg::with_name("verbose")
             .help("Log execution details, repeat for more")
             .short("v")
             .multiple(true))
        .get_matches()
}

fn options(args: &ArgMatches) -> Result<Options, Error> {
    let clock = args.value_of("clock")
        .unwrap_or(DEFAULT_CLOCK_MS)
        .parse::<u64>()
        .map_err(|e| Error::Arguments(format!("invalid --clock: {}", e)))?;

    let max_cycles = match args.value_of("max-cycles") {
        Some(n) => Some(n.parse::<u64>()
            .map_err(|e| Error::Arguments(format!("invalid --max-cycles: {}", e)))?),
        None => None,
    };

    let overflow = args.value_of("overflow")
        .unwrap_or("wrapping")
        .parse::<Overflow>()
        .map_err(Error::Arguments)?;

    Ok(Options {
        clock: Duration::from_millis(clock),
        max_cycles,
        config: Config { overflow },
        quiet: args.is_present("quiet"),
        check_only: args.is_present("check"),
        listing: args.is_present("check") || args.occurrences_of("verbose") > 0,
    })
}

fn logger(verbosity: u64) -> Logger {
    let level = match verbosity {
        0 => Level::Warning,
        1 => Level::Debug,
        _ => Level::Trace,
    };

    let decorator = TermDecorator::new().stderr().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().filter_level(level).fuse();

    Logger::root(drain, o!())
}

fn main() {
    let args = parse_arguments();
    let logger = logger(args.occurrences_of("verbose"));

    let result = options(&args)
        .and_then(|options| run(args.value_of("source").unwrap_or_default(), options, logger));

    let message = match result {
        Ok(()) => return,
        Err(Error::Arguments(msg)) => msg,
        Err(Error::Load(e)) => e.to_string(),
        Err(Error::Check(address, e)) => format!("at address '{}': {}", address, e),
        Err(Error::Execution(e)) => format!("execution error: {}", e),
        Err(Error::CycleLimit(n)) => format!("program did not halt within {} cycles", n),
    };

    eprintln!("{}", message);
    std::process::exit(1);
}

fn run(file_path: &str, options: Options, logger: Logger) -> Result<(), Error> {
    let memory = ProgramMemory::load_from(file_path)?;

    memory.check()
        .map_err(|(address, e)| Error::Check(address, e))?;

    if options.listing {
        println!("{}", memory);
    }

    if options.check_only {
        println!("{}: {} instructions, ok", file_path, memory.len());
        return Ok(());
    }

    let mut machine = Machine::with_logger(memory, options.config, logger);

    if !options.quiet {
        machine.add_listener(|event: &Event| {
            if let Event::Fetch { address, instruction } = event {
                println!("Current instruction {} {}", address, instruction);
            }
        });
    }

    while !machine.is_halted() {
        if !options.quiet {
            println!("{}", machine);
        }

        if let Some(limit) = options.max_cycles {
            if machine.cycles() >= limit {
                return Err(Error::CycleLimit(limit));
            }
        }

        machine.step()?;

        std::thread::sleep(options.clock);
    }

    println!("{}", machine);
    println!("PROGRAM DONE!!!HALTING!!!");

    Ok(())
}
