//
// main.rs: Entry point for the xilbuild binary.
//
// The command line follows the original build.py wrapper, so
// existing Makefiles that call it keep working.
//

extern crate clap;
extern crate xilbuild;

use clap::{App, AppSettings, Arg};
use log::error;

use std::env;
use std::path::Path;
use std::process;

use xilbuild::config::{self, Config, Optimize};
use xilbuild::errors::ErrorCode;
use xilbuild::family;

const EXAMPLES: &str = "\
EXAMPLES

    xilbuild -m cpu16 -t xc9500 -a \"xst: -define {SYNTH_D=1 USE_SOMETHING_D=1}\"

    - build a module cpu16 and target the smallest available device in the xc9500
      family

    xilbuild -m lfsr10 -t xc2c256-10-tq144 -o speed -p lfsr.prj -c lfsr.constraints \\
             -a \"cpldfit: -pterms 10 -inputs 10\" -a \"xst: -mux_extract no\"

    - build a module into a specific device, optimizing for speed instead of area
      and using user created project and constraints files, apply command options
      to cpldfit and xst.
";

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("XILBUILD_LOG", default)
            .write_style("XILBUILD_LOG_STYLE"),
    )
    .format_timestamp(None)
    .format_target(false)
    .try_init();
}

fn make_config(matches: &clap::ArgMatches) -> Result<Config, ErrorCode> {
    let module = matches.value_of("module").ok_or(ErrorCode::NoModule)?;
    let target = matches.value_of("target").unwrap_or(config::DEFAULT_TARGET).to_lowercase();

    let directory = match matches.value_of("dir") {
        Some(dir) => dir.into(),
        None => config::default_directory(module, &target, &chrono::Local::now()),
    };

    let mut config = Config::new(module, &target, directory);

    if let Some(project) = matches.value_of("project") {
        config.project = Some(config::absolute(Path::new(project))?);
    }
    if let Some(constraints) = matches.value_of("constraints") {
        config.constraints = Some(config::absolute(Path::new(constraints))?);
    }
    if let Some(optimize) = matches.value_of("optimize") {
        config.optimize = Optimize::from_name(optimize)?;
    }
    if let Some(tool_args) = matches.values_of("toolargs") {
        for spec in tool_args {
            config.add_tool_args(spec)?;
        }
    }
    if let Some(toolchain) = matches.value_of("toolchain") {
        config.toolchain = Some(config::absolute(Path::new(toolchain))?);
    }

    config.keep_hierarchy = matches.is_present("keephierarchy");
    config.fresh = matches.is_present("fresh");
    config.verbose = matches.is_present("verbose");
    config.no_execute = matches.is_present("no-execute");

    Ok(config)
}

fn main() {
    let after_help = format!("{}\n{}", family::targets_help(), EXAMPLES);
    let matches = App::new("xilbuild")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run a complete Xilinx CPLD or FPGA build.")
        .setting(AppSettings::UnifiedHelpMessage)
        .after_help(after_help.as_str())
        .arg(
            Arg::with_name("module")
                .short("m")
                .long("module")
                .takes_value(true)
                .required(true)
                .value_name("MODULE")
                .help("Name of the top-level Verilog or VHDL module"),
        )
        .arg(
            Arg::with_name("project")
                .short("p")
                .long("project")
                .takes_value(true)
                .value_name("FILE")
                .help(
                    "Project file with paths to Verilog/VHDL source. Default is to \
                     generate one listing all HDL files in the current directory",
                ),
        )
        .arg(
            Arg::with_name("target")
                .short("t")
                .long("target")
                .takes_value(true)
                .value_name("DEVICE")
                .default_value(config::DEFAULT_TARGET)
                .help("Xilinx device, or family for CPLDs"),
        )
        .arg(
            Arg::with_name("constraints")
                .short("c")
                .long("constraints")
                .takes_value(true)
                .value_name("FILE")
                .help("Constraints file. Default is to run with no constraints"),
        )
        .arg(
            Arg::with_name("optimize")
                .short("o")
                .long("optimize")
                .takes_value(true)
                .possible_values(&["speed", "area"])
                .case_insensitive(true)
                .default_value("area")
                .help("Optimize for speed or area"),
        )
        .arg(
            Arg::with_name("dir")
                .short("d")
                .long("dir")
                .alias("directory")
                .takes_value(true)
                .value_name("DIR")
                .help("Working directory for the build. Default is <module>-<target>-<datestamp>"),
        )
        .arg(
            Arg::with_name("toolargs")
                .short("a")
                .long("toolargs")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .value_name("\"TOOL: ARGS\"")
                .help("Arguments passed verbatim to the named tool"),
        )
        .arg(
            Arg::with_name("keephierarchy")
                .short("k")
                .long("keephierarchy")
                .takes_value(false)
                .help("Ask synthesis not to flatten the hierarchy"),
        )
        .arg(
            Arg::with_name("fresh")
                .short("f")
                .long("fresh")
                .takes_value(false)
                .help("Clean out the build directory before starting"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .takes_value(false)
                .help("Show tool output instead of summary messages"),
        )
        .arg(
            Arg::with_name("no-execute")
                .short("n")
                .long("no-execute")
                .takes_value(false)
                .help("Write the build scripts without running them"),
        )
        .arg(
            Arg::with_name("toolchain")
                .long("toolchain")
                .takes_value(true)
                .value_name("FILE")
                .help("TOML file giving the environment for the Xilinx tools"),
        )
        .get_matches();

    init_logging(matches.is_present("verbose"));

    let config = match make_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let source_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = xilbuild::build(&config, &source_dir) {
        error!("{}", e);
        eprintln!("ERROR - completed with errors, check log files");
        process::exit(1);
    }
}
