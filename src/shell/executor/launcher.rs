use std::ffi::CString;
use std::os::unix::ffi::OsStringExt;

use log::debug;
use nix::errno::Errno;
use nix::unistd::{execv, fork, getpid, ForkResult, Pid};

use super::error::{report, ExecError};
use super::redirect;
use super::status::{wait_for, SUCCESS};
use crate::shell::builtins::{with_process_streams, Builtin};
use crate::shell::parser::ast::Redirections;
use crate::shell::signals;
use crate::utils::path::resolve_program;

/// fork 一个子进程执行 `child`，子进程以其返回值退出。
///
/// 子进程里先把信号处理恢复成默认值，并在父进程退出时跟着终止。
/// 父进程直接返回子进程 pid，不等待；调用方负责 `wait_for`。
pub fn spawn<F>(child: F) -> Result<Pid, ExecError>
where
    F: FnOnce() -> i32,
{
    let parent = getpid();
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!("创建子进程 {}", child);
            Ok(child)
        }
        Ok(ForkResult::Child) => {
            signals::restore_defaults();
            if !signals::terminate_with_parent(parent) {
                exit_child(128 + libc::SIGTERM)
            }
            let status = child();
            exit_child(status)
        }
        Err(e) => Err(ExecError::ProcessCreation(e)),
    }
}

pub fn fork_and_wait<F>(child: F) -> Result<i32, ExecError>
where
    F: FnOnce() -> i32,
{
    let pid = spawn(child)?;
    wait_for(pid)
}

/// 子进程的出口：不走父进程的退出清理逻辑
pub fn exit_child(status: i32) -> ! {
    // 只调用 _exit，不触碰任何用户态状态
    unsafe { libc::_exit(status) }
}

/// 在子进程里执行一条普通命令并等待
pub fn launch(args: &[String], redirections: &Redirections) -> Result<i32, ExecError> {
    debug!("执行命令: {}", shell_words::join(args));
    fork_and_wait(|| run_in_place(args, redirections))
}

/// 在当前进程里重定向后执行命令。exec 成功时不返回。
pub fn run_in_place(args: &[String], redirections: &Redirections) -> i32 {
    if let Err(e) = redirect::apply(redirections) {
        report(&e);
        return e.status();
    }
    exec_plain(args)
}

/// 内建命令直接执行，其余的替换当前进程映像
pub fn exec_plain(args: &[String]) -> i32 {
    let Some((name, rest)) = args.split_first() else {
        return SUCCESS;
    };
    if let Some(builtin) = Builtin::lookup(name) {
        return with_process_streams(|streams| builtin.run(rest, streams));
    }
    let err = exec_external(name, args);
    report(&err);
    err.status()
}

fn exec_external(name: &str, args: &[String]) -> ExecError {
    let Some(program) = resolve_program(name) else {
        return ExecError::CommandNotFound(name.to_string());
    };
    let Ok(program) = CString::new(program.into_os_string().into_vec()) else {
        return ExecError::InvalidArgument(name.to_string());
    };
    let argv: Result<Vec<CString>, _> = args.iter().map(|arg| CString::new(arg.as_bytes())).collect();
    let Ok(argv) = argv else {
        return ExecError::InvalidArgument(name.to_string());
    };

    match execv(&program, &argv) {
        Ok(never) => match never {},
        Err(Errno::ENOENT) | Err(Errno::ENOTDIR) => ExecError::CommandNotFound(name.to_string()),
        Err(source) => ExecError::NotExecutable {
            name: name.to_string(),
            source,
        },
    }
}
