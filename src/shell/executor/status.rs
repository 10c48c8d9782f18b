use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

use super::error::ExecError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const NOT_EXECUTABLE: i32 = 126;
pub const NOT_FOUND: i32 = 127;

/// 被信号杀死的进程按 shell 惯例记为 128 + 信号值
pub fn from_wait_status(ws: WaitStatus) -> Option<i32> {
    match ws {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, sig, _core_dumped) => Some(128 + sig as i32),
        _ => None,
    }
}

/// 阻塞等待指定子进程结束，返回其退出码
pub fn wait_for(pid: Pid) -> Result<i32, ExecError> {
    loop {
        match waitpid(pid, None) {
            Ok(ws) => {
                if let Some(status) = from_wait_status(ws) {
                    debug!("子进程 {} 结束: {:?}", pid, ws);
                    return Ok(status);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ExecError::Wait(e)),
        }
    }
}
