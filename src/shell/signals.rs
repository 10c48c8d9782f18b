use log::{debug, warn};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;

/// shell 自身忽略的交互/作业控制信号
pub const JOB_CONTROL_SIGNALS: [Signal; 5] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
];

fn set_handler(signal: Signal, handler: SigHandler) -> nix::Result<SigAction> {
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    // 只安装 SIG_IGN / SIG_DFL，不涉及自定义处理函数
    unsafe { sigaction(signal, &action) }
}

/// 启动时安装，drop 时恢复原有的信号处理方式
pub struct SignalDiscipline {
    saved: Vec<(Signal, SigAction)>,
}

impl SignalDiscipline {
    pub fn ignore_job_control() -> Self {
        let mut saved = Vec::with_capacity(JOB_CONTROL_SIGNALS.len());
        for signal in JOB_CONTROL_SIGNALS {
            match set_handler(signal, SigHandler::SigIgn) {
                Ok(previous) => saved.push((signal, previous)),
                Err(e) => warn!("无法忽略信号 {}: {}", signal, e),
            }
        }
        debug!("已忽略作业控制信号");
        Self { saved }
    }
}

impl Drop for SignalDiscipline {
    fn drop(&mut self) {
        for (signal, previous) in self.saved.drain(..).rev() {
            if let Err(e) = unsafe { sigaction(signal, &previous) } {
                warn!("无法恢复信号 {}: {}", signal, e);
            }
        }
    }
}

/// fork 之后在子进程里调用。SIG_IGN 会跨 exec 继承，
/// SIGPIPE 也要复位，Rust 运行时启动时把它设成了忽略。
pub fn restore_defaults() {
    for signal in JOB_CONTROL_SIGNALS.into_iter().chain([Signal::SIGPIPE]) {
        let _ = set_handler(signal, SigHandler::SigDfl);
    }
}

/// fork 之后在子进程里调用：父进程退出时本进程收到 SIGTERM，
/// 管道右侧被终止后它派生出的进程也会依次退出。
/// 返回 false 表示设置生效之前父进程已经不在了。
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn terminate_with_parent(parent: Pid) -> bool {
    if nix::sys::prctl::set_pdeathsig(Signal::SIGTERM).is_err() {
        return true;
    }
    nix::unistd::getppid() == parent
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn terminate_with_parent(_parent: Pid) -> bool {
    true
}
