use log::{debug, error, warn};
use std::error::Error;
use std::io::Write;

use crate::shell::executor::Executor;
use crate::shell::parser;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::signals::SignalDiscipline;
use crate::utils::config::Config;
use crate::utils::theme::Theme;

pub struct Shell<'a> {
    config: &'a Config,
    theme: Theme,
    executor: Executor,
    last_status: i32,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            theme: Theme::load_theme(&config.theme),
            executor: Executor::new(),
            last_status: 0,
        }
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("初始化 forksh...");

        // 忽略 Ctrl-C、Ctrl-Z 等作业控制信号，退出时恢复
        let _signals = SignalDiscipline::ignore_job_control();

        let mut readline = ReadlineManager::new(self.config)?;
        readline.load_history();

        println!("{}", (self.theme.prompt_style)(self.theme.welcome_message.clone()));
        debug!("forksh 准备就绪...");

        self.run_loop(&mut readline)?;
        readline.save_history();

        println!("{}", (self.theme.prompt_style)(self.theme.exit_message.clone()));
        debug!("退出 forksh...");
        Ok(())
    }

    fn run_loop(&mut self, readline: &mut ReadlineManager<'_>) -> Result<(), Box<dyn Error>> {
        loop {
            std::io::stdout().flush()?;
            let prompt = self.theme.render_prompt(self.last_status);

            match readline.readline(&prompt) {
                Ok(line) => {
                    if line.trim() == "exit" {
                        break;
                    }
                    self.handle_input(&line, readline)?;
                }
                Err(ReadlineError::Eof) => {
                    warn!("接收到 EOF 信号，退出 forksh...");
                    println!();
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("接收到中断信号...");
                }
                Err(err) => {
                    error!("发生错误: {}", err);
                    eprintln!("error: {}", err);
                }
            }
        }
        Ok(())
    }

    fn handle_input(
        &mut self,
        line: &str,
        readline: &mut ReadlineManager<'_>,
    ) -> Result<(), Box<dyn Error>> {
        if line.trim().is_empty() {
            return Ok(());
        }
        readline.add_history(line)?;

        // 解析失败的行直接跳过
        let command = match parser::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!("{}: {}", e, line);
                return Ok(());
            }
        };
        debug!("命令树: {:?}", command);

        // fork 之前清空缓冲，避免子进程重复输出
        std::io::stdout().flush()?;
        self.last_status = self.executor.execute_top(&command);
        debug!("退出码: {}", self.last_status);
        Ok(())
    }
}
