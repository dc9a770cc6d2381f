//
// lib.rs: The xilbuild library.
//
// xilbuild runs a complete Xilinx CPLD or FPGA build: synthesis,
// translation, fitting (or mapping and place and route), timing
// analysis and programming file generation. Each step is written out
// as a shell script in the build directory and then run, so the
// scripts double as a record of exactly what was done.
//
// The xilbuild binary is a thin wrapper around "build". Library users
// can construct a config::Config directly, or use the steps module to
// get at the generated commands without running anything.
//

pub mod config;
pub mod errors;
pub mod family;
pub mod flow;
pub mod project;
pub mod script;
pub mod steps;
pub mod toolchain;

use std::path::Path;

pub fn build(config: &config::Config, source_dir: &Path) -> Result<(), errors::Error> {
    flow::build(config, source_dir)
}
