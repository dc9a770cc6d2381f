//
// project.rs: Set up the working directory
//
// Before any tool runs, the working directory needs its scratch
// subdirectories, the library search order file, and a project file
// listing the HDL sources. If the user didn't give a project file we
// make one from the .v and .vhd files in the source directory.
//

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::{glob_with, MatchOptions, Pattern};
use log::{debug, info, warn};

use crate::config::Config;
use crate::errors::{io_at, ErrorCode};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Language {
    Verilog,
    Vhdl,
}

impl Language {
    fn from_extension(ext: &str) -> Option<Language> {
        match ext {
            "v" => Some(Language::Verilog),
            "vhd" => Some(Language::Vhdl),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Verilog => "verilog",
            Language::Vhdl => "vhdl",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    pub language: Language,
    pub path: PathBuf,
}

// Empty the directory but leave it in place.
pub fn remove_dir_contents(dir: &Path) -> Result<(), ErrorCode> {
    for entry in io_at(dir, fs::read_dir(dir))? {
        let entry = io_at(dir, entry)?;
        let path = entry.path();
        if io_at(&path, entry.file_type())?.is_dir() {
            io_at(&path, fs::remove_dir_all(&path))?;
        } else {
            io_at(&path, fs::remove_file(&path))?;
        }
    }
    Ok(())
}

// Find the HDL sources in a directory, sorted by name. Emacs lock
// files (".#foo.v") are skipped.
pub fn find_sources(dir: &Path) -> Result<Vec<Source>, ErrorCode> {
    let dir = io_at(dir, dir.canonicalize())?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let dir_name = dir.to_str().ok_or_else(|| ErrorCode::NonUtf8Path { path: dir.clone() })?;

    let mut sources = Vec::new();
    for ext in &["v", "vhd"] {
        let pattern = format!("{}/*.{}", Pattern::escape(dir_name), ext);
        let paths = glob_with(&pattern, options).map_err(|source| ErrorCode::BadPattern {
            pattern: pattern.clone(),
            source,
        })?;
        for entry in paths {
            let path = entry.map_err(|e| ErrorCode::Io {
                path: e.path().to_path_buf(),
                source: io::Error::from(e),
            })?;
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            if name.starts_with(".#") || !path.is_file() {
                continue;
            }
            if let Some(language) = Language::from_extension(ext) {
                sources.push(Source { language, path });
            }
        }
    }
    sources.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(sources)
}

pub fn make_project(sources: &[Source]) -> String {
    let mut buf = String::new();
    for source in sources {
        buf.push_str(&format!("{} work {}\n", source.language.name(), source.path.display()));
    }
    buf
}

fn write_file(path: &Path, contents: &str) -> Result<(), ErrorCode> {
    debug!("writing {}", path.display());
    io_at(path, fs::write(path, contents))
}

// Make sure the working directory is ready for synthesis. Returns the
// project file name to hand to synthesis: the user's file, or one we
// generated inside the working directory.
pub fn create_files(config: &Config, source_dir: &Path) -> Result<String, ErrorCode> {
    let workdir = &config.directory;

    if config.fresh && workdir.exists() {
        info!("Cleaning out {}", workdir.display());
        remove_dir_contents(workdir)?;
    }

    for dir in &[workdir.clone(), workdir.join("tmp"), workdir.join("xst")] {
        if !dir.exists() {
            io_at(dir, fs::create_dir(dir))?;
        }
    }

    write_file(&workdir.join(format!("{}.lso", config.module)), "work\n")?;

    match &config.project {
        Some(project) => Ok(project.display().to_string()),
        None => {
            let name = format!("{}.prj", config.module);
            let sources = find_sources(source_dir)?;
            if sources.is_empty() {
                warn!("no .v or .vhd files found in {}", source_dir.display());
            }
            write_file(&workdir.join(&name), &make_project(&sources))?;
            Ok(name)
        }
    }
}
