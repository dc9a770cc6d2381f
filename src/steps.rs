//
// steps.rs: The build steps and the commands they run
//
// Each step turns the Config into the text of a run script (plus, for
// synthesis, the xst input script). Nothing here touches the file
// system; flow.rs writes the files out and launches them.
//

use itertools::Itertools;

use crate::config::Config;
use crate::family::{wants_xc9500_options, Flow};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    Synthesis,
    NgdBuild,
    CpldFit,
    FpgaPnr,
    Sta,
    CreateJedec,
    CreateNetlist,
}

static CPLD_STEPS: [Step; 5] = [
    Step::Synthesis,
    Step::NgdBuild,
    Step::CpldFit,
    Step::Sta,
    Step::CreateJedec,
];

static FPGA_STEPS: [Step; 6] = [
    Step::Synthesis,
    Step::NgdBuild,
    Step::FpgaPnr,
    Step::Sta,
    Step::CreateJedec,
    Step::CreateNetlist,
];

// An extra input file a step needs alongside its run script.
#[derive(Clone, Debug, PartialEq)]
pub struct InputFile {
    pub name: String,
    pub contents: String,
}

impl Step {
    pub fn for_flow(flow: Flow) -> &'static [Step] {
        match flow {
            Flow::Cpld => &CPLD_STEPS,
            Flow::Fpga => &FPGA_STEPS,
        }
    }

    // Stage name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Synthesis => "synthesis",
            _ => self.script_tag(),
        }
    }

    // Tag in the run script's file name.
    fn script_tag(&self) -> &'static str {
        match self {
            Step::Synthesis => "xst",
            Step::NgdBuild => "ngdbuild",
            Step::CpldFit => "cpldfit",
            Step::FpgaPnr => "fpgapnr",
            Step::Sta => "sta",
            Step::CreateJedec => "create_jedec",
            Step::CreateNetlist => "create_netlist",
        }
    }

    pub fn description(&self, flow: Flow) -> &'static str {
        match (self, flow) {
            (Step::Synthesis, _) => "xst synthesis",
            (Step::NgdBuild, _) => "ngdbuild",
            (Step::CpldFit, _) => "CPLD fitting",
            (Step::FpgaPnr, _) => "FPGA mapping and PNR",
            (Step::Sta, _) => "static timing analysis",
            (Step::CreateJedec, Flow::Cpld) => "JEDEC programming file generation",
            (Step::CreateJedec, Flow::Fpga) => "bitstream and PROM file generation",
            (Step::CreateNetlist, _) => "simulation netlist generation",
        }
    }

    pub fn script_name(&self, module: &str) -> String {
        format!("run_{}_{}.sh", self.script_tag(), module)
    }

    // The programs the run script invokes.
    pub fn tools(&self, flow: Flow) -> &'static [&'static str] {
        match (self, flow) {
            (Step::Synthesis, _) => &["xst"],
            (Step::NgdBuild, _) => &["ngdbuild"],
            (Step::CpldFit, _) => &["cpldfit"],
            (Step::FpgaPnr, _) => &["map", "par"],
            (Step::Sta, Flow::Cpld) => &["tsim", "taengine"],
            (Step::Sta, Flow::Fpga) => &["trce"],
            (Step::CreateJedec, Flow::Cpld) => &["hprep6"],
            (Step::CreateJedec, Flow::Fpga) => &["bitgen", "promgen"],
            (Step::CreateNetlist, _) => &["netgen"],
        }
    }

    pub fn input_file(&self, config: &Config, project: &str) -> Option<InputFile> {
        match self {
            Step::Synthesis => Some(InputFile {
                name: xst_file_name(config),
                contents: make_xst_script(config, project),
            }),
            _ => None,
        }
    }

    pub fn commands(&self, config: &Config) -> Vec<String> {
        match self {
            Step::Synthesis => make_xst(config),
            Step::NgdBuild => make_ngdbuild(config),
            Step::CpldFit => make_cpldfit(config),
            Step::FpgaPnr => make_fpgapnr(config),
            Step::Sta => make_sta(config),
            Step::CreateJedec => make_jedec(config),
            Step::CreateNetlist => make_netlist(config),
        }
    }
}

// Append the user's arguments for a tool, if there are any.
fn with_args(command: String, config: &Config, tool: &str) -> String {
    let args = config.args_for(tool);
    if args.is_empty() {
        command
    } else {
        format!("{} {}", command, args)
    }
}

// Lay a long command out one option per line.
fn continued(lines: &[String]) -> Vec<String> {
    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| if i < last { format!("{} \\", line) } else { line.clone() })
        .collect()
}

////////////////////////////////////////////////////////////////////////
// Synthesis
//

fn xst_file_name(config: &Config) -> String {
    format!("{}.xst", config.module)
}

pub fn make_xst_script(config: &Config, project: &str) -> String {
    let m = &config.module;
    let mut opts = vec![
        format!("-ifn {}", project),
        format!("-p {}", config.target),
        "-ifmt mixed".to_string(),
        format!("-ofn {}", m),
        "-ofmt NGC".to_string(),
        format!("-top {}", m),
        format!("-opt_mode {}", config.optimize),
        "-opt_level 2".to_string(),
        "-iuc NO".to_string(),
        format!("-lso {}.lso", m),
        format!("-keep_hierarchy {}", config.keep_hierarchy_flag()),
        "-netlist_hierarchy as_optimized".to_string(),
        "-rtlview Yes".to_string(),
        "-hierarchy_separator /".to_string(),
        "-bus_delimiter <>".to_string(),
        "-case maintain".to_string(),
        "-verilog2001 YES".to_string(),
        "-fsm_extract YES".to_string(),
        "-fsm_encoding COMPACT".to_string(),
        "-safe_implementation No".to_string(),
        "-mux_extract YES".to_string(),
        "-resource_sharing YES".to_string(),
        "-iobuf YES".to_string(),
    ];
    if config.flow() == Flow::Cpld {
        opts.push("-pld_mp YES".to_string());
        opts.push("-pld_xp YES".to_string());
        opts.push("-wysiwyg NO".to_string());
    }
    opts.push("-equivalent_register_removal YES".to_string());

    let run = with_args(format!("run {}", opts.iter().join(" ")), config, "xst");
    format!("set -tmpdir ./tmp\nset -xsthdpdir ./xst\n{}\n", run)
}

fn make_xst(config: &Config) -> Vec<String> {
    vec![format!(
        "xst -ifn {} -intstyle xflow -ofn ./{}.syr",
        xst_file_name(config),
        config.module
    )]
}

fn make_ngdbuild(config: &Config) -> Vec<String> {
    let m = &config.module;
    let constraints = match &config.constraints {
        Some(path) => format!(" -uc {}", path.display()),
        None => String::new(),
    };
    vec![with_args(
        format!("ngdbuild -dd _ngo -p {}{} {}.ngc {}.ngd", config.target, constraints, m, m),
        config,
        "ngdbuild",
    )]
}

////////////////////////////////////////////////////////////////////////
// Fitting, mapping and place and route
//

fn make_cpldfit(config: &Config) -> Vec<String> {
    let mut lines = vec![
        format!("cpldfit -p {}", config.target),
        "-ofmt vhdl".to_string(),
        format!("-optimize {}", config.optimize.fitter_name()),
        "-loc on".to_string(),
        "-slew slow".to_string(),
        "-exhaust".to_string(),
        "-init low".to_string(),
        "-inputs 20".to_string(),
        "-pterms 20".to_string(),
    ];
    if wants_xc9500_options(&config.target) {
        lines.push("-power std -localfbk -pinfbk".to_string());
        lines.push("-unused float".to_string());
    }
    lines.push(with_args(format!("{}.ngd", config.module), config, "cpldfit"));
    continued(&lines)
}

fn make_fpgapnr(config: &Config) -> Vec<String> {
    let m = &config.module;
    vec![
        with_args(
            format!(
                "map -p {} -cm {} -ir off -pr off -c 100 -o {}_map.ncd {}.ngd {}.pcf",
                config.target, config.optimize, m, m, m
            ),
            config,
            "map",
        ),
        with_args(
            format!("par -w -ol std -t 1 {}_map.ncd {}.ncd {}.pcf", m, m, m),
            config,
            "par",
        ),
    ]
}

////////////////////////////////////////////////////////////////////////
// Timing analysis
//

fn make_sta(config: &Config) -> Vec<String> {
    let m = &config.module;
    match config.flow() {
        Flow::Fpga => vec![with_args(
            format!("trce -v 3 -s 5 -fastpaths -xml {}.twx {}.ncd -o {}.twr {}.pcf", m, m, m, m),
            config,
            "trce",
        )],
        Flow::Cpld => vec![
            with_args(format!("tsim {} {}.nga", m, m), config, "tsim"),
            with_args(format!("taengine -f {} -detail", m), config, "taengine"),
        ],
    }
}

////////////////////////////////////////////////////////////////////////
// Programming files
//

// bitgen -g settings, in the order they're passed.
const BITGEN_OPTIONS: [&str; 27] = [
    "DebugBitstream:No",
    "Binary:no",
    "CRC:Enable",
    "ConfigRate:6",
    "CclkPin:PullUp",
    "M0Pin:PullUp",
    "M1Pin:PullUp",
    "M2Pin:PullUp",
    "ProgPin:PullUp",
    "DonePin:PullUp",
    "TckPin:PullUp",
    "TdiPin:PullUp",
    "TdoPin:PullUp",
    "TmsPin:PullUp",
    "UnusedPin:PullDown",
    "UserID:0xFFFFFFFF",
    "DCMShutdown:Disable",
    "DCIUpdateMode:AsRequired",
    "StartUpClk:CClk",
    "DONE_cycle:4",
    "GTS_cycle:5",
    "GWE_cycle:6",
    "LCK_cycle:NoWait",
    "Match_cycle:Auto",
    "Security:None",
    "DonePipe:No",
    "DriveDone:No",
];

// The PROM image is sized for a 16Mbit SPI flash.
const PROM_SIZE_KB: u32 = 16384;

fn make_jedec(config: &Config) -> Vec<String> {
    let m = &config.module;
    match config.flow() {
        Flow::Fpga => {
            let mut lines = vec!["bitgen".to_string(), "-w".to_string()];
            lines.extend(BITGEN_OPTIONS.iter().map(|opt| format!("-g {}", opt)));
            lines.push(with_args(format!("{}.ncd", m), config, "bitgen"));
            let mut commands = continued(&lines);
            commands.push(with_args(
                format!("promgen -w -spi -p mcs -s {} -u 0 {}.bit", PROM_SIZE_KB, m),
                config,
                "promgen",
            ));
            commands
        }
        Flow::Cpld => vec![with_args(
            format!("hprep6 -s IEEE1149 -n {} -i {}", m, m),
            config,
            "hprep6",
        )],
    }
}

fn make_netlist(config: &Config) -> Vec<String> {
    vec![with_args(
        format!("netgen -w -ofmt verilog -aka {}_map.ncd", config.module),
        config,
        "netgen",
    )]
}
