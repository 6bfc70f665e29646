use std::env;
use std::fs::File;
use std::io::{self, Write};

use log::{debug, error, warn};
use nix::unistd::Pid;

use super::builtins::{run_builtin, BuiltinEffect};
use super::expander::expand;
use super::job_manager::{Job, JobManager};
use super::pipeline::{assemble, PipelinePlan, StageIo};
use super::process::{ForkHost, ProcessHost};
use super::symbols::SymbolTable;
use crate::shell::error::ShellError;
use crate::shell::parser::CommandLine;
use crate::shell::state::ShellState;

pub const STATUS_NOT_FOUND: i32 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Assembled,
    Launching,
    Running,
    Waited,
    Collected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Finished(i32),
    Background { job: usize },
    Exit(i32),
}

#[derive(Debug)]
pub struct Execution {
    pub outcome: Outcome,
    pub failures: Vec<ShellError>,
}

enum Launched {
    Process(Pid),
    Done(i32),
}

pub struct Executor<H: ProcessHost = ForkHost> {
    host: H,
    jobs: JobManager,
}

impl Executor<ForkHost> {
    pub fn new() -> Self {
        Self::with_host(ForkHost::new())
    }
}

impl<H: ProcessHost> Executor<H> {
    pub fn with_host(host: H) -> Self {
        Self {
            host,
            jobs: JobManager::new(),
        }
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn jobs(&self) -> &JobManager {
        &self.jobs
    }

    /// Runs one parsed line. Structural and redirection errors are returned
    /// before anything is started.
    pub fn execute(
        &mut self,
        line: &mut CommandLine,
        symbols: &mut SymbolTable,
        state: &mut ShellState,
    ) -> Result<Execution, ShellError> {
        expand(line, symbols)?;
        let plan = assemble(line)?;
        if plan.stages.is_empty() {
            return Ok(Execution {
                outcome: Outcome::Finished(0),
                failures: Vec::new(),
            });
        }
        self.run_plan(&plan, symbols, state)
    }

    fn run_plan(
        &mut self,
        plan: &PipelinePlan,
        symbols: &mut SymbolTable,
        state: &mut ShellState,
    ) -> Result<Execution, ShellError> {
        let mut phase = Phase::Assembled;
        let wiring = plan.wire()?;
        advance(&mut phase, Phase::Launching);

        let search_path = match symbols.lookup("PATH") {
            path if !path.is_empty() => path,
            _ => env::var("PATH").unwrap_or_default(),
        };

        let mut failures = Vec::new();
        let mut launched = Vec::with_capacity(plan.stages.len());
        let mut deferred = Vec::new();

        // 先启动所有外部命令，内建命令随后执行，保证其输出管道已有读端
        for (index, (stage, stage_io)) in plan.stages.iter().zip(wiring.stages).enumerate() {
            if state.flags.echo {
                eprintln!("+ {}", stage.argv.join(" "));
            }

            if stage.kind.is_builtin() {
                let StageIo { stdin, stdout } = stage_io;
                // built-ins never read; closing the read end lets the writer see EPIPE
                drop(stdin);
                deferred.push((index, stdout));
                launched.push(Launched::Done(0));
                continue;
            }

            match self.host.spawn(&stage.argv, &search_path, stage_io) {
                Ok(pid) => {
                    if state.flags.show_child {
                        eprintln!("[{}] {}", pid, stage.argv[0]);
                    }
                    launched.push(Launched::Process(pid));
                }
                Err(e) => {
                    warn!("启动阶段失败: {}", e);
                    failures.push(e);
                    launched.push(Launched::Done(STATUS_NOT_FOUND));
                }
            }
        }

        let mut exit_code = None;
        for (index, stdout) in deferred {
            let stage = &plan.stages[index];
            let result = match stdout {
                Some(fd) => {
                    let mut out = File::from(fd);
                    run_builtin(stage.kind, &stage.argv, &mut out, symbols, state)
                }
                None => {
                    let mut out = io::stdout();
                    let result = run_builtin(stage.kind, &stage.argv, &mut out, symbols, state);
                    let _ = out.flush();
                    result
                }
            };
            launched[index] = match result {
                Ok(BuiltinEffect::Status(code)) => Launched::Done(code),
                Ok(BuiltinEffect::Exit(code)) => {
                    exit_code = Some(code);
                    Launched::Done(0)
                }
                Err(e) => {
                    failures.push(e);
                    Launched::Done(1)
                }
            };
        }
        advance(&mut phase, Phase::Running);

        if let Some(code) = exit_code {
            return Ok(Execution {
                outcome: Outcome::Exit(code),
                failures,
            });
        }

        if plan.background {
            let pids: Vec<Pid> = launched
                .iter()
                .filter_map(|stage| match stage {
                    Launched::Process(pid) => Some(*pid),
                    Launched::Done(_) => None,
                })
                .collect();
            let known = match launched.last() {
                Some(Launched::Done(code)) => Some(*code),
                _ => None,
            };
            let job = self.jobs.add_job(pids, plan.describe(), known);
            advance(&mut phase, Phase::Collected);
            return Ok(Execution {
                outcome: Outcome::Background { job },
                failures,
            });
        }

        // 某个 wait 失败时仍然等待其余阶段，最后再返回第一个错误
        let mut status = 0;
        let mut wait_error = None;
        for stage in &launched {
            status = match stage {
                Launched::Process(pid) => match self.host.wait(*pid) {
                    Ok(code) => code,
                    Err(e) => {
                        error!("等待子进程 {} 失败: {}", pid, e);
                        if wait_error.is_none() {
                            wait_error = Some(e);
                        }
                        STATUS_NOT_FOUND
                    }
                },
                Launched::Done(code) => *code,
            };
        }
        advance(&mut phase, Phase::Waited);
        if let Some(e) = wait_error {
            return Err(e);
        }

        Ok(Execution {
            outcome: Outcome::Finished(status),
            failures,
        })
    }

    pub fn reap_jobs(&mut self) -> Vec<Job> {
        self.jobs.reap(&mut self.host)
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!("管道状态: {:?} -> {:?}", phase, next);
    *phase = next;
}

impl Default for Executor<ForkHost> {
    fn default() -> Self {
        Self::new()
    }
}
