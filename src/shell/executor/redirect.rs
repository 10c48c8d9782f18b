use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, IntoRawFd, RawFd};

use log::{debug, warn};
use nix::unistd::{close, dup, dup2};

use super::error::ExecError;
use crate::shell::parser::ast::Redirections;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Read,
    Truncate,
    Append,
}

impl Mode {
    fn open(self, path: &str) -> Result<File, ExecError> {
        let mut options = OpenOptions::new();
        match self {
            Mode::Read => options.read(true),
            Mode::Truncate => options.write(true).create(true).truncate(true),
            Mode::Append => options.append(true).create(true),
        };
        options.open(path).map_err(|source| ExecError::RedirectOpen {
            path: path.to_string(),
            source,
        })
    }
}

/// 按 input / output / append / error 的顺序列出要做的重定向
fn plan(redirections: &Redirections) -> Vec<(&str, Mode, RawFd)> {
    let slots = [
        (&redirections.input, Mode::Read, libc::STDIN_FILENO),
        (&redirections.output, Mode::Truncate, libc::STDOUT_FILENO),
        (&redirections.append, Mode::Append, libc::STDOUT_FILENO),
        (&redirections.error, Mode::Truncate, libc::STDERR_FILENO),
    ];
    slots
        .into_iter()
        .filter_map(|(path, mode, fd)| path.as_deref().map(|p| (p, mode, fd)))
        .collect()
}

/// 打开文件并替换目标描述符，随后关闭打开的那个副本
fn rebind(path: &str, mode: Mode, target: RawFd) -> Result<(), ExecError> {
    let file = mode.open(path)?;
    if file.as_raw_fd() == target {
        // 目标原本是关着的，open 直接拿到了它
        let _ = file.into_raw_fd();
        return Ok(());
    }
    dup2(file.as_raw_fd(), target).map_err(|source| ExecError::Rebind { fd: target, source })?;
    debug!("重定向 fd {} -> {}", target, path);
    Ok(())
}

/// 在当前进程上永久生效，供 fork 出的子进程使用。
/// 任何一个文件打不开就立刻返回错误，调用方不再执行命令。
pub fn apply(redirections: &Redirections) -> Result<(), ExecError> {
    for (path, mode, target) in plan(redirections) {
        rebind(path, mode, target)?;
    }
    Ok(())
}

/// 不 fork 的内建命令使用：先备份标准流，drop 时还原
pub struct ScopedRedirect {
    saved: Vec<(RawFd, RawFd)>,
}

impl ScopedRedirect {
    pub fn apply(redirections: &Redirections) -> Result<Self, ExecError> {
        let mut guard = Self { saved: Vec::new() };
        for (path, mode, target) in plan(redirections) {
            if !guard.saved.iter().any(|(fd, _)| *fd == target) {
                let backup =
                    dup(target).map_err(|source| ExecError::Rebind { fd: target, source })?;
                guard.saved.push((target, backup));
            }
            // 出错时 guard 被 drop，已做的重定向随之还原
            rebind(path, mode, target)?;
        }
        Ok(guard)
    }
}

impl Drop for ScopedRedirect {
    fn drop(&mut self) {
        for (target, backup) in self.saved.drain(..).rev() {
            if let Err(e) = dup2(backup, target) {
                warn!("无法还原 fd {}: {}", target, e);
            }
            let _ = close(backup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_order() {
        let redirections = Redirections {
            input: Some("in".into()),
            output: Some("out".into()),
            append: Some("log".into()),
            error: Some("err".into()),
        };
        assert_eq!(
            plan(&redirections),
            vec![
                ("in", Mode::Read, 0),
                ("out", Mode::Truncate, 1),
                ("log", Mode::Append, 1),
                ("err", Mode::Truncate, 2),
            ]
        );
    }

    #[test]
    fn test_empty_plan() {
        assert!(plan(&Redirections::default()).is_empty());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = Mode::Read.open(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ExecError::RedirectOpen { .. }));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_truncate_and_append_modes() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let path = path.to_str().unwrap();

        Mode::Truncate.open(path).unwrap().write_all(b"old\n").unwrap();
        Mode::Truncate.open(path).unwrap().write_all(b"new\n").unwrap();
        Mode::Append.open(path).unwrap().write_all(b"more\n").unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "new\nmore\n");
    }
}
