use std::fs::File;
use std::os::fd::OwnedFd;

use log::{debug, warn};
use nix::fcntl::OFlag;
use nix::unistd::pipe2;

use crate::shell::error::ShellError;
use crate::shell::parser::{CommandLine, NodeKind, Origin};

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub kind: NodeKind,
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePlan {
    pub stages: Vec<Stage>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub background: bool,
}

// None 表示继承 shell 自身的终端
#[derive(Debug, Default)]
pub struct StageIo {
    pub stdin: Option<OwnedFd>,
    pub stdout: Option<OwnedFd>,
}

#[derive(Debug)]
pub struct Wiring {
    pub stages: Vec<StageIo>,
    pub pipes: usize,
}

// 展开每个阶段的参数链，并把首尾阶段的重定向和后台标记提升到整条管道
pub fn assemble(line: &mut CommandLine) -> Result<PipelinePlan, ShellError> {
    let layout = line.layout()?;
    let count = layout.len();
    let mut plan = PipelinePlan {
        stages: Vec::with_capacity(count),
        input: None,
        output: None,
        background: false,
    };

    for (index, words) in layout.iter().enumerate() {
        let argv: Vec<String> = words
            .iter()
            .map(|id| line.node(*id))
            .filter(|node| node.origin != Origin::Metacharacter)
            .map(|node| node.text.clone().unwrap_or_default())
            .collect();

        if argv.iter().any(|arg| arg.contains('\0')) {
            return Err(ShellError::structure(format!(
                "stage {} has an argument containing a nul byte",
                index
            )));
        }

        let head = line.node_mut(words[0]);
        if !head.kind.is_builtin() && argv.first().map_or(true, |cmd| cmd.is_empty()) {
            return Err(ShellError::structure(format!(
                "stage {} has no command to run",
                index
            )));
        }

        let first = index == 0;
        let last = index + 1 == count;
        if first {
            plan.input = head.redirect_input.clone();
        } else if let Some(path) = &head.redirect_input {
            warn!("忽略中间阶段的输入重定向: {}", path);
        }
        if last {
            plan.output = head.redirect_output.clone();
            plan.background = head.background;
        } else if let Some(path) = &head.redirect_output {
            warn!("忽略中间阶段的输出重定向: {}", path);
        }

        head.argv = argv.clone();
        plan.stages.push(Stage {
            kind: head.kind,
            argv,
        });
    }

    Ok(plan)
}

impl PipelinePlan {
    // 只打开文件、创建管道，不启动任何进程
    pub fn wire(&self) -> Result<Wiring, ShellError> {
        let mut stages: Vec<StageIo> = self.stages.iter().map(|_| StageIo::default()).collect();
        if stages.is_empty() {
            return Ok(Wiring { stages, pipes: 0 });
        }

        if let Some(path) = &self.input {
            let file = File::open(path).map_err(|source| ShellError::Redirection {
                path: path.clone(),
                source,
            })?;
            stages[0].stdin = Some(OwnedFd::from(file));
        }
        if let Some(path) = &self.output {
            let file = File::create(path).map_err(|source| ShellError::Redirection {
                path: path.clone(),
                source,
            })?;
            if let Some(last) = stages.last_mut() {
                last.stdout = Some(OwnedFd::from(file));
            }
        }

        let mut pipes = 0;
        for index in 1..stages.len() {
            // close-on-exec keeps stray ends out of unrelated children
            let (read, write) = pipe2(OFlag::O_CLOEXEC)?;
            stages[index - 1].stdout = Some(write);
            stages[index].stdin = Some(read);
            pipes += 1;
        }
        debug!("管道连接完成: {} 个阶段, {} 个管道", stages.len(), pipes);

        Ok(Wiring { stages, pipes })
    }

    pub fn describe(&self) -> String {
        let mut text = self
            .stages
            .iter()
            .map(|stage| stage.argv.join(" "))
            .collect::<Vec<String>>()
            .join(" | ");
        if let Some(path) = &self.input {
            text.push_str(&format!(" < {}", path));
        }
        if let Some(path) = &self.output {
            text.push_str(&format!(" > {}", path));
        }
        if self.background {
            text.push_str(" &");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parser::{CommandNode, Parser};
    use std::fs;
    use std::path::PathBuf;

    #[allow(clippy::unwrap_used)]
    fn parse(input: &str) -> CommandLine {
        Parser::new(input).unwrap().parse_command().unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("psh_pipeline_{}_{}", std::process::id(), name))
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_argv_and_heads() {
        let mut line = parse("grep -v foo | wc -l");
        let plan = assemble(&mut line).unwrap();
        assert_eq!(plan.stages.len(), 2);
        assert_eq!(plan.stages[0].argv, vec!["grep", "-v", "foo"]);
        assert_eq!(plan.stages[1].argv, vec!["wc", "-l"]);
        let head = line.head().unwrap();
        assert_eq!(line.node(head).argv, vec!["grep", "-v", "foo"]);
        // argument nodes never carry an argv
        let arg = line.node(head).next_word().unwrap();
        assert!(line.node(arg).argv.is_empty());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_boundary_redirections_only() {
        let mut line = parse("a < in1 > mid1 | b < in2 > mid2 | c < in3 > out3 &");
        let plan = assemble(&mut line).unwrap();
        assert_eq!(plan.input.as_deref(), Some("in1"));
        assert_eq!(plan.output.as_deref(), Some("out3"));
        assert!(plan.background);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_background_only_from_last_stage() {
        let mut line = parse("a | b");
        let head = line.head().unwrap();
        line.node_mut(head).background = true;
        let plan = assemble(&mut line).unwrap();
        assert!(!plan.background);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_metacharacters_are_not_arguments() {
        let mut line = CommandLine::new();
        let head = line.push_stage(CommandNode::command(NodeKind::Word, "ls"));
        line.push_word(head, CommandNode::word("|", Origin::Metacharacter));
        line.push_word(head, CommandNode::word("-a", Origin::Word));
        let plan = assemble(&mut line).unwrap();
        assert_eq!(plan.stages[0].argv, vec!["ls", "-a"]);
    }

    #[test]
    fn test_empty_external_command_is_rejected() {
        let mut line = CommandLine::new();
        let head = line.push_stage(CommandNode::variable("unset"));
        line.node_mut(head).text = Some(String::new());
        assert!(matches!(assemble(&mut line), Err(ShellError::Structure(_))));
    }

    #[test]
    fn test_nul_argument_is_rejected() {
        let mut line = CommandLine::new();
        let head = line.push_stage(CommandNode::command(NodeKind::Word, "ls"));
        line.push_word(head, CommandNode::word("a\0b", Origin::Word));
        assert!(matches!(assemble(&mut line), Err(ShellError::Structure(_))));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_wire_creates_one_pipe_between_stages() {
        let mut line = parse("a | b | c");
        let wiring = assemble(&mut line).unwrap().wire().unwrap();
        assert_eq!(wiring.pipes, 2);
        assert!(wiring.stages[0].stdin.is_none());
        assert!(wiring.stages[0].stdout.is_some());
        assert!(wiring.stages[1].stdin.is_some());
        assert!(wiring.stages[1].stdout.is_some());
        assert!(wiring.stages[2].stdin.is_some());
        assert!(wiring.stages[2].stdout.is_none());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_wire_single_stage_has_no_pipes() {
        let mut line = parse("a");
        let wiring = assemble(&mut line).unwrap().wire().unwrap();
        assert_eq!(wiring.pipes, 0);
        assert!(wiring.stages[0].stdin.is_none());
        assert!(wiring.stages[0].stdout.is_none());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_wire_opens_redirection_files() {
        let input = temp_path("in");
        let output = temp_path("out");
        fs::write(&input, "data\n").unwrap();
        let mut line = parse(&format!(
            "a < {} | b > {}",
            input.display(),
            output.display()
        ));
        let wiring = assemble(&mut line).unwrap().wire().unwrap();
        assert!(wiring.stages[0].stdin.is_some());
        assert!(wiring.stages[1].stdout.is_some());
        assert!(output.exists());
        fs::remove_file(input).ok();
        fs::remove_file(output).ok();
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_wire_missing_input_file() {
        let missing = temp_path("does_not_exist");
        let mut line = parse(&format!("cat < {}", missing.display()));
        let plan = assemble(&mut line).unwrap();
        match plan.wire() {
            Err(ShellError::Redirection { path, .. }) => {
                assert_eq!(path, missing.display().to_string())
            }
            other => panic!("expected redirection error, got {:?}", other),
        }
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_describe() {
        let mut line = parse("cat < in | sort > out &");
        let plan = assemble(&mut line).unwrap();
        assert_eq!(plan.describe(), "cat | sort < in > out &");
    }
}
