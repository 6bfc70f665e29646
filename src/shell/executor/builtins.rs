use std::env;
use std::io::Write;

use log::debug;

use super::symbols::SymbolTable;
use crate::shell::error::ShellError;
use crate::shell::parser::NodeKind;
use crate::shell::state::ShellState;
use crate::utils::path::current_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinEffect {
    Status(i32),
    Exit(i32),
}

/// Runs a built-in stage in-process. `out` is the stage's output, which may
/// be a pipe, a redirection file or the terminal.
pub fn run_builtin(
    kind: NodeKind,
    argv: &[String],
    out: &mut dyn Write,
    symbols: &mut SymbolTable,
    state: &mut ShellState,
) -> Result<BuiltinEffect, ShellError> {
    let args = argv.get(1..).unwrap_or_default();
    debug!("执行内建命令: {} {:?}", kind.keyword(), args);

    match kind {
        NodeKind::SetVar => builtin_set(args, out, symbols),
        NodeKind::Echo => {
            writeln!(out, "{}", args.join(" ")).map_err(|e| ShellError::builtin("echo", e.to_string()))?;
            Ok(BuiltinEffect::Status(0))
        }
        NodeKind::Cd => builtin_cd(args),
        NodeKind::ToggleParse => toggle(out, "parsecmd", &mut state.flags.parse),
        NodeKind::ToggleEcho => toggle(out, "echocmd", &mut state.flags.echo),
        NodeKind::ToggleShowChild => toggle(out, "showchild", &mut state.flags.show_child),
        NodeKind::Exit => builtin_exit(args),
        NodeKind::SetPrompt => match args {
            [prompt] => {
                state.prompt = prompt.clone();
                Ok(BuiltinEffect::Status(0))
            }
            _ => Err(ShellError::builtin("setprompt", "usage: setprompt <prompt>")),
        },
        NodeKind::Word => Err(ShellError::structure(format!(
            "{} is not a built-in",
            argv.first().map(String::as_str).unwrap_or_default()
        ))),
    }
}

fn builtin_set(
    args: &[String],
    out: &mut dyn Write,
    symbols: &mut SymbolTable,
) -> Result<BuiltinEffect, ShellError> {
    match args {
        [] => {
            let mut vars: Vec<(&str, &str)> = symbols.iter().collect();
            vars.sort();
            for (name, value) in vars {
                writeln!(out, "{} {}", name, value)
                    .map_err(|e| ShellError::builtin("set", e.to_string()))?;
            }
        }
        [name, value] => symbols.update(name, value),
        _ => return Err(ShellError::builtin("set", "usage: set <name> <value>")),
    }
    Ok(BuiltinEffect::Status(0))
}

fn builtin_cd(args: &[String]) -> Result<BuiltinEffect, ShellError> {
    let path = match args {
        [] => "~",
        [path] => path.as_str(),
        _ => return Err(ShellError::builtin("cd", "too many arguments")),
    };
    let path = shellexpand::tilde(path);
    env::set_current_dir(path.as_ref())
        .map_err(|e| ShellError::builtin("cd", format!("{}: {}", path, e)))?;
    debug!("当前目录: {}", current_dir());
    Ok(BuiltinEffect::Status(0))
}

fn builtin_exit(args: &[String]) -> Result<BuiltinEffect, ShellError> {
    match args {
        [] => Ok(BuiltinEffect::Exit(0)),
        [code] => code
            .parse::<i32>()
            .map(BuiltinEffect::Exit)
            .map_err(|_| ShellError::builtin("exit", format!("{}: numeric argument required", code))),
        _ => Err(ShellError::builtin("exit", "too many arguments")),
    }
}

fn toggle(out: &mut dyn Write, name: &'static str, flag: &mut bool) -> Result<BuiltinEffect, ShellError> {
    *flag = !*flag;
    writeln!(out, "{}: {}", name, if *flag { "on" } else { "off" })
        .map_err(|e| ShellError::builtin(name, e.to_string()))?;
    Ok(BuiltinEffect::Status(0))
}
