use log::warn;
use nix::sys::signal::{signal, SigHandler, Signal};

/// 忽略 Ctrl-C / Ctrl-\，shell 本身不应被前台命令的中断信号杀死
pub fn ignore_interactive_signals() {
    for sig in [Signal::SIGINT, Signal::SIGQUIT] {
        if let Err(e) = unsafe { signal(sig, SigHandler::SigIgn) } {
            warn!("无法忽略信号 {:?}: {}", sig, e);
        }
    }
}

/// Called in a forked child before exec. SIGPIPE is included because the
/// Rust runtime ignores it in the shell process.
pub fn restore_default_signals() {
    for sig in [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGPIPE] {
        let _ = unsafe { signal(sig, SigHandler::SigDfl) };
    }
}
