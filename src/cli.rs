use std::path::PathBuf;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::generate::{GenerateError, Generator};

// Exit Codes for different types of errors
pub const ERR_COMPILE: i32 = 1;
pub const ERR_USAGE: i32 = 1;

pub fn print_errs<E: std::fmt::Display>(errs: &[E]) {
    for e in errs {
        eprintln!("error: {}", e);
    }
}

/// What `--emit` prints to stdout for each input file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Emit {
    Record,
    Ir,
    Layout,
}

/// The settings of one `idlc generate` run.
#[derive(Debug)]
pub struct GenerateConfig {
    pub files: Vec<PathBuf>,
    pub depth: PathBuf,
    pub output_dir: PathBuf,
    pub generators: Vec<Generator>,
    pub import_dirs: Vec<PathBuf>,
    pub typemaps: Vec<PathBuf>,
    pub emit: Option<Emit>,
}

pub fn configure_cli() -> clap::App<'static, 'static> {
    App::new("idlc")
        .version("0.1.0")
        .about("Compiles schema files into a resolved IR with wire layouts for code emitters")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .takes_value(true)
                .global(true)
                .possible_values(&["off", "error", "warn", "info", "debug", "trace"])
                .help("Level of the log messages written to the terminal. Logging is off by default."),
        )
        .subcommand(
            SubCommand::with_name("generate")
                .about("Compiles the given schema files and runs the generators over them")
                .arg(
                    Arg::with_name("FILE")
                        .required(true)
                        .multiple(true)
                        .help("Schema files to compile"),
                )
                .arg(
                    Arg::with_name("depth")
                        .short("d")
                        .long("depth")
                        .takes_value(true)
                        .help("Root directory of the sources. Module paths are written relative to it (default: the current directory)"),
                )
                .arg(
                    Arg::with_name("output-dir")
                        .short("o")
                        .long("output-dir")
                        .takes_value(true)
                        .help("Directory that generated files are written to (default: the current directory)"),
                )
                .arg(
                    Arg::with_name("generators")
                        .short("g")
                        .long("generators")
                        .takes_value(true)
                        .help("Comma separated list of generators: json, yaml, or the path of a .py or .sh emitter"),
                )
                .arg(
                    Arg::with_name("import-dir")
                        .short("I")
                        .long("import-dir")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .help("Directory searched for imports which are not found next to the importing file"),
                )
                .arg(
                    Arg::with_name("typemap")
                        .long("typemap")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .help("Typemap file handed to the emitters. Later files override earlier ones."),
                )
                .arg(
                    Arg::with_name("emit")
                        .long("emit")
                        .takes_value(true)
                        .possible_values(&["record", "ir", "layout"])
                        .help("Prints the module record, the IR or the struct layouts of each file to stdout"),
                ),
        )
}

pub fn get_log_level(args: &ArgMatches) -> Option<LevelFilter> {
    let level = match args.value_of("log-level")? {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => return None,
    };
    Some(level)
}

pub fn configure_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
}

pub fn get_generate_config(args: &ArgMatches) -> Result<GenerateConfig, GenerateError> {
    let paths = |name: &str| -> Vec<PathBuf> {
        args.values_of(name)
            .map(|values| values.map(PathBuf::from).collect())
            .unwrap_or_default()
    };

    let generators = match args.value_of("generators") {
        Some(list) => Generator::parse_list(list)?,
        None => vec![],
    };

    let emit = match args.value_of("emit") {
        Some("record") => Some(Emit::Record),
        Some("ir") => Some(Emit::Ir),
        Some("layout") => Some(Emit::Layout),
        _ => None,
    };

    Ok(GenerateConfig {
        files: paths("FILE"),
        depth: args.value_of("depth").unwrap_or(".").into(),
        output_dir: args.value_of("output-dir").unwrap_or(".").into(),
        generators,
        import_dirs: paths("import-dir"),
        typemaps: paths("typemap"),
        emit,
    })
}
