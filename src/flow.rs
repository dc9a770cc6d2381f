//
// flow.rs: Run the steps of a build in order
//
// Each step's input file and run script are written out before the
// step is launched, so even a dry run (--no-execute) leaves a complete
// set of scripts in the working directory. The first failing step
// ends the build.
//

use std::path::Path;

use log::{info, warn};

use crate::config::Config;
use crate::errors::{in_stage, io_at, Error, ErrorCode};
use crate::family::{Family, Flow};
use crate::project;
use crate::script::{write_run_file, Launcher};
use crate::steps::Step;
use crate::toolchain::Toolchain;

const SETUP: &str = "setup";

pub fn run_step(
    step: Step,
    config: &Config,
    project: &str,
    launcher: &Launcher,
) -> Result<(), ErrorCode> {
    let flow = config.flow();
    let workdir = &config.directory;

    info!("Starting {} ...", step.description(flow));

    if let Some(input) = step.input_file(config, project) {
        let path = workdir.join(&input.name);
        io_at(&path, std::fs::write(&path, input.contents))?;
    }

    let script = step.script_name(&config.module);
    write_run_file(workdir, &script, &step.commands(config))?;

    if !launcher.no_execute {
        for tool in step.tools(flow) {
            launcher.toolchain.locate(tool)?;
        }
    }

    launcher.launch(workdir, &script)
}

pub fn build(config: &Config, source_dir: &Path) -> Result<(), Error> {
    if config.module.is_empty() {
        return in_stage(SETUP, Err(ErrorCode::NoModule));
    }

    let flow = config.flow();
    match Family::from_target(&config.target) {
        Some(family) => {
            info!("Target {} ({} {})", config.target, family.name(), flow);
            if flow == Flow::Fpga && family.family() == config.target {
                warn!("FPGA mapping needs a specific device, not just a family name");
            }
        }
        None => info!("Target {} ({})", config.target, flow),
    }

    let toolchain = match &config.toolchain {
        Some(path) => in_stage(SETUP, Toolchain::from_file(path))?,
        None => Toolchain::default(),
    };
    let launcher = Launcher {
        toolchain: &toolchain,
        verbose: config.verbose,
        no_execute: config.no_execute,
    };

    let project = in_stage(SETUP, project::create_files(config, source_dir))?;

    for step in Step::for_flow(flow) {
        in_stage(step.name(), run_step(*step, config, &project, &launcher))?;
        info!("Done");
    }
    Ok(())
}
