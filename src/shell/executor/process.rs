use std::ffi::CString;
use std::os::fd::AsRawFd;
use std::path::PathBuf;

use log::{debug, error};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{dup2, execv, fork, write, ForkResult, Pid};

use super::pipeline::StageIo;
use crate::shell::error::ShellError;
use crate::shell::signals;
use crate::utils::path::find_file_in_path;

pub trait ProcessHost {
    fn spawn(&mut self, argv: &[String], search_path: &str, io: StageIo)
        -> Result<Pid, ShellError>;

    fn wait(&mut self, pid: Pid) -> Result<i32, ShellError>;

    // 非阻塞：进程仍在运行时返回 None
    fn poll(&mut self, pid: Pid) -> Result<Option<i32>, ShellError>;
}

#[derive(Debug, Default)]
pub struct ForkHost;

impl ForkHost {
    pub fn new() -> Self {
        ForkHost
    }

    fn resolve(command: &str, search_path: &str) -> Option<PathBuf> {
        if command.contains('/') {
            return Some(PathBuf::from(command));
        }
        find_file_in_path(command, search_path, true)
    }

    fn status_of(ws: WaitStatus) -> Option<i32> {
        match ws {
            WaitStatus::Exited(_, code) => Some(code),
            WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
            _ => None,
        }
    }
}

impl ProcessHost for ForkHost {
    fn spawn(
        &mut self,
        argv: &[String],
        search_path: &str,
        io: StageIo,
    ) -> Result<Pid, ShellError> {
        let command = argv.first().cloned().unwrap_or_default();
        let program = Self::resolve(&command, search_path).ok_or_else(|| ShellError::Spawn {
            command: command.clone(),
            reason: "command not found".to_string(),
        })?;

        // everything the child needs is allocated before fork
        let to_cstring = |s: &str| {
            CString::new(s).map_err(|_| ShellError::Spawn {
                command: command.clone(),
                reason: "argument contains a nul byte".to_string(),
            })
        };
        let c_program = to_cstring(program.to_string_lossy().as_ref())?;
        let c_args = argv
            .iter()
            .map(|arg| to_cstring(arg.as_str()))
            .collect::<Result<Vec<CString>, ShellError>>()?;
        let exec_failed = format!("psh: {}: cannot execute\n", command);

        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                signals::restore_default_signals();
                if let Some(fd) = &io.stdin {
                    let _ = dup2(fd.as_raw_fd(), libc::STDIN_FILENO);
                }
                if let Some(fd) = &io.stdout {
                    let _ = dup2(fd.as_raw_fd(), libc::STDOUT_FILENO);
                }
                let _ = execv(&c_program, &c_args);
                let _ = write(std::io::stderr(), exec_failed.as_bytes());
                unsafe { libc::_exit(126) }
            }
            Ok(ForkResult::Parent { child }) => {
                debug!("已创建子进程 {} : {}", child, program.display());
                // the parent's copies of the stage ends close here
                drop(io);
                Ok(child)
            }
            Err(e) => {
                error!("fork 失败: {}", e);
                Err(ShellError::Spawn {
                    command,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn wait(&mut self, pid: Pid) -> Result<i32, ShellError> {
        loop {
            match waitpid(pid, None) {
                Ok(ws) => {
                    if let Some(status) = Self::status_of(ws) {
                        return Ok(status);
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(ShellError::Os(e)),
            }
        }
    }

    fn poll(&mut self, pid: Pid) -> Result<Option<i32>, ShellError> {
        loop {
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => return Ok(None),
                Ok(ws) => match Self::status_of(ws) {
                    Some(status) => return Ok(Some(status)),
                    None => return Ok(None),
                },
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(ShellError::Os(e)),
            }
        }
    }
}
