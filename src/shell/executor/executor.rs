use log::debug;

use super::error::{report, ExecError};
use super::redirect::{self, ScopedRedirect};
use super::status::SUCCESS;
use super::{launcher, pipe};
use crate::shell::builtins::{with_process_streams, Builtin};
use crate::shell::parser::ast::{Command, CommandKind, Redirections};

/// 递归解释命令树，每个节点返回一个退出码
pub struct Executor;

impl Executor {
    pub fn new() -> Self {
        Self
    }

    /// 一行输入的入口。单独的 `cd` 留在 shell 进程里，
    /// 其余整棵树都放进一个新的子进程执行。
    pub fn execute_top(&self, command: &Command) -> i32 {
        if let CommandKind::Plain(args) = &command.kind {
            if args.first().map(String::as_str) == Some("cd") {
                return self.execute(command);
            }
        }
        settle(launcher::fork_and_wait(|| self.execute_in_child(command)))
    }

    pub fn execute(&self, command: &Command) -> i32 {
        if !command.redirections.is_empty() && !matches!(command.kind, CommandKind::Plain(_)) {
            // 复合节点上的重定向：整个节点放到子进程里执行
            debug!("复合节点带重定向，进入子进程: {:?}", command.redirections);
            return settle(launcher::fork_and_wait(|| self.execute_in_child(command)));
        }
        self.execute_kind(command)
    }

    fn execute_kind(&self, command: &Command) -> i32 {
        match &command.kind {
            CommandKind::Plain(args) => self.execute_plain(args, &command.redirections),
            CommandKind::Sequence(left, right) => {
                self.execute(left);
                self.execute(right)
            }
            CommandKind::And(left, right) => {
                let status = self.execute(left);
                if status == SUCCESS {
                    self.execute(right)
                } else {
                    status
                }
            }
            CommandKind::Or(left, right) => {
                let status = self.execute(left);
                if status != SUCCESS {
                    self.execute(right)
                } else {
                    status
                }
            }
            CommandKind::Pipe(left, right) => settle(pipe::exec_pipe(self, left, right)),
            CommandKind::Void(inner) => {
                settle(launcher::fork_and_wait(|| self.execute_in_child(inner)))
            }
        }
    }

    fn execute_plain(&self, args: &[String], redirections: &Redirections) -> i32 {
        // cd 必须在当前进程执行，目录切换才能留下来
        if args.first().map(String::as_str) == Some("cd") {
            return run_cd(&args[1..], redirections);
        }
        settle(launcher::launch(args, redirections))
    }

    /// 已经身处一个执行完就退出的子进程（管道一侧、子 shell）时使用。
    /// 普通命令就地 exec，不再多 fork 一层。
    pub fn execute_in_child(&self, command: &Command) -> ! {
        let status = match redirect::apply(&command.redirections) {
            Err(e) => {
                report(&e);
                e.status()
            }
            Ok(()) => match &command.kind {
                CommandKind::Plain(args) => launcher::exec_plain(args),
                _ => self.execute_kind(command),
            },
        };
        launcher::exit_child(status)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

fn run_cd(args: &[String], redirections: &Redirections) -> i32 {
    let _redirect = match ScopedRedirect::apply(redirections) {
        Ok(guard) => guard,
        Err(e) => {
            report(&e);
            return e.status();
        }
    };
    with_process_streams(|streams| Builtin::Cd.run(args, streams))
}

fn settle(result: Result<i32, ExecError>) -> i32 {
    result.unwrap_or_else(|e| {
        report(&e);
        e.status()
    })
}
