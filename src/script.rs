//
// script.rs: Writing and launching run scripts
//
// Every step leaves a shell script behind in the working directory,
// so a failed step can be rerun by hand after tweaking it.
//

use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Stdio;

use log::{debug, info};

use crate::errors::{io_at, ErrorCode};
use crate::toolchain::Toolchain;

pub fn make_run_file(commands: &[String]) -> String {
    let mut buf = String::from("#!/bin/sh\n#   build script written by xilbuild\n");
    buf.push_str(&commands.join("\n"));
    buf.push('\n');
    buf
}

pub fn write_run_file(dir: &Path, name: &str, commands: &[String]) -> Result<(), ErrorCode> {
    let path = dir.join(name);
    debug!("writing {}", path.display());
    let mut file = io_at(&path, File::create(&path))?;
    io_at(&path, file.write_all(make_run_file(commands).as_bytes()))?;
    io_at(&path, fs::set_permissions(&path, fs::Permissions::from_mode(0o777)))
}

// How launched scripts are run.
pub struct Launcher<'a> {
    pub toolchain: &'a Toolchain,
    pub verbose: bool,
    pub no_execute: bool,
}

impl<'a> Launcher<'a> {
    // Run a script from the working directory, succeeding only on a
    // zero exit status.
    pub fn launch(&self, dir: &Path, script: &str) -> Result<(), ErrorCode> {
        if self.no_execute {
            info!("launch_command(no-execute): cd {} ; ./{}", dir.display(), script);
            return Ok(());
        }

        let dir = io_at(dir, dir.canonicalize())?;
        let mut cmd = self.toolchain.command(dir.join(script));
        cmd.current_dir(&dir);
        cmd.stdin(Stdio::null());

        let launched = if self.verbose {
            cmd.status()
        } else {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::inherit());
            cmd.output().map(|output| {
                for line in String::from_utf8_lossy(&output.stdout).lines() {
                    debug!("{}: {}", script, line);
                }
                output.status
            })
        };
        let status = launched.map_err(|source| ErrorCode::Launch {
            script: script.to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ErrorCode::Failed {
                script: script.to_string(),
                status,
            })
        }
    }
}
