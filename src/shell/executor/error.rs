use std::io;

use thiserror::Error;

use crate::shell::builtins::with_process_streams;

/// 执行期间可恢复的错误，发生处报告后折算成退出码
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{path}: {source}")]
    RedirectOpen { path: String, source: io::Error },

    #[error("cannot rebind descriptor {fd}: {source}")]
    Rebind { fd: i32, source: nix::Error },

    #[error("cannot create pipe: {0}")]
    PipeCreation(nix::Error),

    #[error("cannot fork: {0}")]
    ProcessCreation(nix::Error),

    #[error("wait failed: {0}")]
    Wait(nix::Error),

    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("{name}: {source}")]
    NotExecutable { name: String, source: nix::Error },

    #[error("{0}: argument contains a NUL byte")]
    InvalidArgument(String),
}

impl ExecError {
    pub fn status(&self) -> i32 {
        match self {
            ExecError::CommandNotFound(_) => super::status::NOT_FOUND,
            ExecError::NotExecutable { .. } | ExecError::InvalidArgument(_) => {
                super::status::NOT_EXECUTABLE
            }
            _ => super::status::FAILURE,
        }
    }
}

/// 在 fd 2 上输出 `error: <message>`
pub fn report(err: &ExecError) {
    log::error!("{}", err);
    with_process_streams(|streams| {
        let _ = writeln!(streams.stderr, "error: {}", err);
    });
}
