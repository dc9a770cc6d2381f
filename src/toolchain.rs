//
// toolchain.rs: Where to find the vendor tools
//
// By default the run scripts inherit our environment. A toolchain
// file can supply variables (typically PATH and XILINX) for setups
// where ISE isn't on the default path:
//
//     [env]
//     PATH = "/opt/Xilinx/14.7/ISE_DS/ISE/bin/lin64:/usr/bin:/bin"
//     XILINX = "/opt/Xilinx/14.7/ISE_DS/ISE"
//

use std::collections::HashMap;
use std::env;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use which::{which, which_in};

use crate::errors::{io_at, ErrorCode};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Toolchain {
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Toolchain {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ErrorCode> {
        let path = path.as_ref();
        let s = io_at(path, read_to_string(path))?;
        Self::parse(&s).map_err(|source| ErrorCode::BadToolchain {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    // Find a tool the way the run script's shell will.
    pub fn locate(&self, tool: &str) -> Result<PathBuf, ErrorCode> {
        let found = match self.env.get("PATH") {
            Some(path) => {
                let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which_in(tool, Some(path), cwd)
            }
            None => which(tool),
        };
        found.map_err(|_| ErrorCode::ToolNotFound {
            tool: tool.to_string(),
        })
    }

    pub fn command<P: AsRef<Path>>(&self, program: P) -> Command {
        let mut res = Command::new(program.as_ref());
        for (k, v) in self.env.iter() {
            res.env(k, v);
        }
        res
    }
}
