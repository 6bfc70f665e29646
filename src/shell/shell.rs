use log::{debug, error, warn};
use std::error::Error;
use std::io::Write;

use crate::shell::error::ShellError;
use crate::shell::executor::{Executor, Outcome, SymbolTable};
use crate::shell::parser::Parser;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::signals;
use crate::shell::state::ShellState;
use crate::utils::config::Config;
use crate::utils::theme::{load_theme, Theme};

const DEFAULT_PROMPT: &str = "psh> ";

pub struct Shell<'a> {
    theme: Theme,
    readline: ReadlineManager<'a>,
    executor: Executor,
    symbols: SymbolTable,
    state: ShellState,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Result<Self, Box<dyn Error>> {
        let prompt = config.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);
        Ok(Self {
            theme: load_theme(&config.theme),
            readline: ReadlineManager::new(config)?,
            executor: Executor::new(),
            symbols: SymbolTable::new(),
            state: ShellState::new(prompt),
        })
    }

    pub fn run(&mut self) -> Result<i32, Box<dyn Error>> {
        debug!("初始化 psh...");

        // 忽略 Ctrl-C 等信号，子进程在 exec 前恢复默认处理
        signals::ignore_interactive_signals();

        self.readline.load_history();
        println!("{}", self.theme.welcome_message);
        debug!("psh 准备就绪...");

        let code = self.run_loop()?;
        self.readline.save_history();
        self.symbols.teardown();

        println!("{}", self.theme.exit_message);
        debug!("退出 psh...");
        Ok(code)
    }

    fn run_loop(&mut self) -> Result<i32, Box<dyn Error>> {
        loop {
            self.report_finished_jobs();
            std::io::stdout().flush()?;
            let prompt = (self.theme.prompt_style)(&self.state.prompt);

            match self.readline.readline(&prompt) {
                Ok(line) => {
                    if let Some(code) = self.handle_input(&line)? {
                        return Ok(code);
                    }
                }
                Err(err) => match err {
                    ReadlineError::Eof => {
                        warn!("接收到 EOF 信号，退出 psh...");
                        return Ok(0);
                    }
                    ReadlineError::Interrupted => {
                        debug!("接收到中断信号...");
                    }
                    err => {
                        error!("发生错误: {}", err);
                        return Err(err.into());
                    }
                },
            }
        }
    }

    fn handle_input(&mut self, line: &str) -> Result<Option<i32>, Box<dyn Error>> {
        if line.trim().is_empty() {
            return Ok(None);
        }
        self.readline.add_history(line)?;

        // 使用 parser 解析命令
        let mut command = match Parser::new(line).and_then(|mut parser| parser.parse_command()) {
            Ok(command) => command,
            Err(e) => {
                self.report_error(&e);
                return Ok(None);
            }
        };

        if self.state.flags.parse {
            eprint!("{}", (self.theme.debug_style)(command.to_string()));
        }

        let execution = match self
            .executor
            .execute(&mut command, &mut self.symbols, &mut self.state)
        {
            Ok(execution) => execution,
            Err(e) => {
                self.report_error(&e);
                return Ok(None);
            }
        };

        for failure in &execution.failures {
            self.report_error(failure);
        }

        match execution.outcome {
            Outcome::Exit(code) => return Ok(Some(code)),
            Outcome::Background { job } => {
                let pids: Vec<String> = self
                    .executor
                    .jobs()
                    .get_jobs()
                    .iter()
                    .filter(|j| j.index == job)
                    .flat_map(|j| j.pids.iter().map(|pid| pid.to_string()))
                    .collect();
                println!("[{}] {}", job, pids.join(" "));
            }
            Outcome::Finished(0) => {}
            Outcome::Finished(status) => {
                eprintln!(
                    "{} {}",
                    self.theme.error_symbol,
                    (self.theme.error_style)(format!("exit {}", status))
                );
            }
        }
        Ok(None)
    }

    fn report_finished_jobs(&mut self) {
        for job in self.executor.reap_jobs() {
            println!("{} {}", self.theme.success_symbol, (self.theme.success_style)(job.to_string()));
        }
    }

    fn report_error(&self, e: &ShellError) {
        debug!("命令失败: {:?}", e);
        eprintln!(
            "{} {}",
            self.theme.error_symbol,
            (self.theme.error_style)(format!("psh: {}", e))
        );
    }
}
