//
// errors.rs: Error codes
//
// Each failure is an ErrorCode describing what went wrong, wrapped in
// an Error that records which stage of the build it happened in
// ("setup" for anything before the first tool runs).
//

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("Error in {} stage: {}", stage, code)]
pub struct Error {
    pub code: ErrorCode,
    pub stage: &'static str,
}

#[derive(Debug, Error)]
pub enum ErrorCode {
    #[error("tool arguments must look like \"toolname: arguments\", got '{0}'")]
    BadToolArgs(String),
    #[error("unknown optimization goal '{0}' (expected 'speed' or 'area')")]
    BadOptimize(String),
    #[error("no module name given")]
    NoModule,
    #[error("{}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("source directory {} is not valid UTF-8", path.display())]
    NonUtf8Path { path: PathBuf },
    #[error("bad source pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("could not read toolchain file {}: {}", path.display(), source)]
    BadToolchain {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("tool '{tool}' not found on the search path")]
    ToolNotFound { tool: String },
    #[error("could not launch {}: {}", script, source)]
    Launch {
        script: String,
        #[source]
        source: io::Error,
    },
    #[error("{script} finished with {status}")]
    Failed { script: String, status: ExitStatus },
}

// Adapt an ErrorCode to an Error.
pub fn in_stage<Val>(stage: &'static str, res: Result<Val, ErrorCode>) -> Result<Val, Error> {
    res.map_err(|e| Error { code: e, stage })
}

// Attach the offending path to an I/O error.
pub fn io_at<Val>(path: impl Into<PathBuf>, res: io::Result<Val>) -> Result<Val, ErrorCode> {
    res.map_err(|source| ErrorCode::Io {
        path: path.into(),
        source,
    })
}
