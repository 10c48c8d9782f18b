use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{close, dup2, pipe, Pid};

use super::error::{report, ExecError};
use super::executor::Executor;
use super::launcher;
use super::status::{wait_for, FAILURE, SUCCESS};
use crate::shell::parser::ast::Command;

struct PipeEnds {
    read: OwnedFd,
    write: OwnedFd,
}

impl PipeEnds {
    fn open() -> Result<Self, ExecError> {
        let (read, write) = pipe().map_err(ExecError::PipeCreation)?;
        Ok(Self { read, write })
    }

    /// 子进程里调用：stdin 接读端，stdout 接写端，然后关掉手里的两个管道描述符
    fn attach(&self, target: RawFd) -> Result<(), ExecError> {
        let end = if target == libc::STDIN_FILENO {
            &self.read
        } else {
            &self.write
        };
        dup2(end.as_raw_fd(), target).map_err(|source| ExecError::Rebind { fd: target, source })?;
        for fd in [self.read.as_raw_fd(), self.write.as_raw_fd()] {
            if fd != target {
                let _ = close(fd);
            }
        }
        Ok(())
    }

    fn run_side(&self, executor: &Executor, side: &Command, target: RawFd) -> i32 {
        if let Err(e) = self.attach(target) {
            report(&e);
            return e.status();
        }
        executor.execute_in_child(side)
    }
}

/// 左边写、右边读，两个子进程并发执行，返回右边的退出码。
/// 左边失败时尽力终止右边，避免右边一直等输入。
pub fn exec_pipe(executor: &Executor, left: &Command, right: &Command) -> Result<i32, ExecError> {
    let ends = PipeEnds::open()?;

    let left_pid =
        launcher::spawn(|| ends.run_side(executor, left, libc::STDOUT_FILENO))?;
    let right_pid = launcher::spawn(|| ends.run_side(executor, right, libc::STDIN_FILENO));

    // 父进程不读写数据，两端都要立刻关掉，否则右边永远等不到 EOF
    drop(ends);

    let right_pid = match right_pid {
        Ok(pid) => pid,
        Err(e) => {
            if let Err(wait_err) = wait_for(left_pid) {
                report(&wait_err);
            }
            return Err(e);
        }
    };
    debug!("管道: 左 {} -> 右 {}", left_pid, right_pid);

    let left_status = wait_for(left_pid).unwrap_or_else(|e| {
        report(&e);
        FAILURE
    });
    if left_status != SUCCESS {
        cancel(right_pid);
    }

    wait_for(right_pid)
}

/// 右边可能已经退出，发信号只是请求
fn cancel(pid: Pid) {
    debug!("管道左侧失败，终止右侧 {}", pid);
    match kill(pid, Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!("无法终止进程 {}: {}", pid, e),
    }
}
