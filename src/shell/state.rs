/// Debug switches flipped by the `parsecmd`, `echocmd` and `showchild`
/// built-ins and read by the driver every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugFlags {
    pub parse: bool,
    pub echo: bool,
    pub show_child: bool,
}

#[derive(Debug, Clone)]
pub struct ShellState {
    pub flags: DebugFlags,
    pub prompt: String,
}

impl ShellState {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            flags: DebugFlags::default(),
            prompt: prompt.into(),
        }
    }
}
