//
// config.rs: Build configuration
//
// Everything the command line can say about a build ends up in a
// Config. The binary fills it in from clap; library users can build
// one directly, starting from Config::new.
//

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::errors::ErrorCode;
use crate::family::Flow;

pub const DEFAULT_TARGET: &str = "xc9500";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Optimize {
    Area,
    Speed,
}

impl Optimize {
    pub fn from_name(name: &str) -> Result<Optimize, ErrorCode> {
        match name.to_lowercase().as_str() {
            "area" => Ok(Optimize::Area),
            "speed" => Ok(Optimize::Speed),
            _ => Err(ErrorCode::BadOptimize(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Optimize::Area => "area",
            Optimize::Speed => "speed",
        }
    }

    // The CPLD fitter calls area optimisation "density".
    pub fn fitter_name(&self) -> &'static str {
        match self {
            Optimize::Area => "density",
            Optimize::Speed => "speed",
        }
    }
}

impl fmt::Display for Optimize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    // Top-level HDL module; also the base name of every output file.
    pub module: String,
    // User-supplied project file, absolute. None means generate one.
    pub project: Option<PathBuf>,
    pub target: String,
    pub constraints: Option<PathBuf>,
    pub optimize: Optimize,
    pub directory: PathBuf,
    // Extra arguments passed verbatim to each named tool.
    pub tool_args: HashMap<String, String>,
    pub keep_hierarchy: bool,
    pub fresh: bool,
    pub verbose: bool,
    pub no_execute: bool,
    pub toolchain: Option<PathBuf>,
}

impl Config {
    pub fn new(module: &str, target: &str, directory: impl Into<PathBuf>) -> Config {
        Config {
            module: module.to_string(),
            project: None,
            target: target.to_lowercase(),
            constraints: None,
            optimize: Optimize::Area,
            directory: directory.into(),
            tool_args: HashMap::new(),
            keep_hierarchy: false,
            fresh: false,
            verbose: false,
            no_execute: false,
            toolchain: None,
        }
    }

    pub fn flow(&self) -> Flow {
        Flow::for_target(&self.target)
    }

    // Arguments for a tool, or "" if the user gave none.
    pub fn args_for(&self, tool: &str) -> &str {
        self.tool_args.get(tool).map(String::as_str).unwrap_or("")
    }

    pub fn keep_hierarchy_flag(&self) -> &'static str {
        if self.keep_hierarchy {
            "Yes"
        } else {
            "No"
        }
    }

    pub fn add_tool_args(&mut self, spec: &str) -> Result<(), ErrorCode> {
        let (tool, args) = parse_tool_args(spec)?;
        self.tool_args.insert(tool, args);
        Ok(())
    }
}

// Split "toolname: arguments" at the first colon, so the arguments
// themselves may contain colons.
pub fn parse_tool_args(spec: &str) -> Result<(String, String), ErrorCode> {
    match spec.find(':') {
        Some(i) => {
            let tool = spec[..i].trim().to_lowercase();
            if tool.is_empty() {
                return Err(ErrorCode::BadToolArgs(spec.to_string()));
            }
            Ok((tool, spec[i + 1..].trim().to_string()))
        }
        None => Err(ErrorCode::BadToolArgs(spec.to_string())),
    }
}

// Name of the build directory used when none is given:
// <module>-<target>-<DD.MM.YYYY_HH:MM:SS>.
pub fn default_directory<Tz>(module: &str, target: &str, now: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    PathBuf::from(format!(
        "{}-{}-{}",
        module,
        target,
        now.format("%d.%m.%Y_%H:%M:%S")
    ))
}

// Resolve a path given on the command line against the current
// directory. The file need not exist yet.
pub fn absolute(path: &Path) -> Result<PathBuf, ErrorCode> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|source| ErrorCode::Io {
        path: PathBuf::from("."),
        source,
    })?;
    Ok(cwd.join(path))
}
