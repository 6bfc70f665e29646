use std::fmt;

use log::{debug, error};
use nix::unistd::Pid;

use super::process::ProcessHost;

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Running,
    Done(i32),
}

#[derive(Debug, Clone)]
pub struct Job {
    pub index: usize,
    pub pids: Vec<Pid>,
    pub command: String,
    pub status: JobStatus,
    finished: Vec<bool>,
    last_status: Option<i32>,
    tracks_last: bool,
}

impl Job {
    fn new(index: usize, pids: Vec<Pid>, command: String, last_status: Option<i32>) -> Self {
        let finished = vec![false; pids.len()];
        let tracks_last = last_status.is_none() && !pids.is_empty();
        Self {
            index,
            pids,
            command,
            status: JobStatus::Running,
            finished,
            last_status,
            tracks_last,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            JobStatus::Running => "running".to_string(),
            JobStatus::Done(0) => "done".to_string(),
            JobStatus::Done(code) => format!("exit {}", code),
        };
        let pid = self.pids.last().map(|pid| pid.as_raw()).unwrap_or_default();
        write!(f, "[{}] {} {} {}", self.index, pid, status, self.command)
    }
}

#[derive(Default)]
pub struct JobManager {
    jobs: Vec<Job>,
}

impl JobManager {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn get_jobs(&self) -> &[Job] {
        &self.jobs
    }

    fn find_available_index(&self) -> usize {
        let mut index = 1;
        while self.jobs.iter().any(|job| job.index == index) {
            index += 1;
        }
        index
    }

    // 最后一个阶段未启动（内建命令或启动失败）时 last_status 已知
    pub fn add_job(&mut self, pids: Vec<Pid>, command: String, last_status: Option<i32>) -> usize {
        let index = self.find_available_index();
        debug!("后台任务 [{}] {:?}: {}", index, pids, command);
        self.jobs.push(Job::new(index, pids, command, last_status));
        index
    }

    pub fn reap(&mut self, host: &mut dyn ProcessHost) -> Vec<Job> {
        for job in self.jobs.iter_mut() {
            let last = job.pids.len().saturating_sub(1);
            for (i, pid) in job.pids.iter().enumerate() {
                if job.finished[i] {
                    continue;
                }
                match host.poll(*pid) {
                    Ok(Some(status)) => {
                        job.finished[i] = true;
                        if i == last && job.tracks_last {
                            job.last_status = Some(status);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // the child is gone; nothing left to wait for
                        error!("回收后台进程 {} 失败: {}", pid, e);
                        job.finished[i] = true;
                    }
                }
            }
            if job.finished.iter().all(|done| *done) {
                job.status = JobStatus::Done(job.last_status.unwrap_or_default());
            }
        }

        let (done, running): (Vec<Job>, Vec<Job>) = self
            .jobs
            .drain(..)
            .partition(|job| job.status != JobStatus::Running);
        self.jobs = running;
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::error::ShellError;
    use crate::shell::executor::pipeline::StageIo;
    use std::collections::HashMap;

    /// Processes finish after being polled `remaining` times.
    struct FakeHost {
        remaining: HashMap<i32, (usize, i32)>,
    }

    impl ProcessHost for FakeHost {
        fn spawn(&mut self, _: &[String], _: &str, _: StageIo) -> Result<Pid, ShellError> {
            unreachable!()
        }

        fn wait(&mut self, _: Pid) -> Result<i32, ShellError> {
            unreachable!()
        }

        fn poll(&mut self, pid: Pid) -> Result<Option<i32>, ShellError> {
            match self.remaining.get_mut(&pid.as_raw()) {
                Some((0, status)) => Ok(Some(*status)),
                Some((n, _)) => {
                    *n -= 1;
                    Ok(None)
                }
                None => Err(ShellError::Os(nix::Error::ECHILD)),
            }
        }
    }

    #[test]
    fn test_indices_reuse_lowest_free() {
        let mut jobs = JobManager::new();
        assert_eq!(jobs.add_job(vec![Pid::from_raw(10)], "a".to_string(), None), 1);
        assert_eq!(jobs.add_job(vec![Pid::from_raw(11)], "b".to_string(), None), 2);
        let mut host = FakeHost {
            remaining: HashMap::from([(10, (0, 0)), (11, (5, 0))]),
        };
        let done = jobs.reap(&mut host);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].index, 1);
        assert_eq!(jobs.add_job(vec![Pid::from_raw(12)], "c".to_string(), None), 1);
    }

    #[test]
    fn test_job_done_when_all_stages_finish() {
        let mut jobs = JobManager::new();
        jobs.add_job(
            vec![Pid::from_raw(20), Pid::from_raw(21)],
            "a | b".to_string(),
            None,
        );
        let mut host = FakeHost {
            remaining: HashMap::from([(20, (1, 0)), (21, (0, 3))]),
        };
        assert!(jobs.reap(&mut host).is_empty());
        assert_eq!(jobs.get_jobs().len(), 1);
        let done = jobs.reap(&mut host);
        assert_eq!(done[0].status, JobStatus::Done(3));
        assert_eq!(done[0].to_string(), "[1] 21 exit 3 a | b");
        assert!(jobs.get_jobs().is_empty());
    }

    #[test]
    fn test_job_without_processes_finishes_immediately() {
        let mut jobs = JobManager::new();
        jobs.add_job(Vec::new(), "echo hi".to_string(), Some(0));
        let mut host = FakeHost {
            remaining: HashMap::new(),
        };
        let done = jobs.reap(&mut host);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].status, JobStatus::Done(0));
    }
}
