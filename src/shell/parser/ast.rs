use std::fmt;

use crate::shell::error::ShellError;

/// What a stage head runs: a built-in, or `Word` for plain words and
/// external commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Word,
    SetVar,
    Echo,
    Cd,
    ToggleParse,
    ToggleEcho,
    ToggleShowChild,
    Exit,
    SetPrompt,
}

impl NodeKind {
    pub fn from_keyword(word: &str) -> Self {
        match word {
            "set" => NodeKind::SetVar,
            "echo" => NodeKind::Echo,
            "cd" => NodeKind::Cd,
            "parsecmd" => NodeKind::ToggleParse,
            "echocmd" => NodeKind::ToggleEcho,
            "showchild" => NodeKind::ToggleShowChild,
            "exit" => NodeKind::Exit,
            "setprompt" => NodeKind::SetPrompt,
            _ => NodeKind::Word,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            NodeKind::Word => "word",
            NodeKind::SetVar => "set",
            NodeKind::Echo => "echo",
            NodeKind::Cd => "cd",
            NodeKind::ToggleParse => "parsecmd",
            NodeKind::ToggleEcho => "echocmd",
            NodeKind::ToggleShowChild => "showchild",
            NodeKind::Exit => "exit",
            NodeKind::SetPrompt => "setprompt",
        }
    }

    pub fn is_builtin(&self) -> bool {
        *self != NodeKind::Word
    }
}

/// How the lexer classified the token a node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Variable,
    Word,
    QuotedString,
    Metacharacter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct CommandNode {
    pub kind: NodeKind,
    pub origin: Origin,
    pub text: Option<String>,
    pub variable_name: Option<String>,
    pub variable_value: Option<String>,
    pub background: bool,
    pub redirect_input: Option<String>,
    pub redirect_output: Option<String>,
    /// Filled in on stage heads by the assembler.
    pub argv: Vec<String>,
    pub(crate) next: Option<NodeId>,
    pub(crate) next_piped: Option<NodeId>,
}

impl CommandNode {
    fn new(kind: NodeKind, origin: Origin) -> Self {
        Self {
            kind,
            origin,
            text: None,
            variable_name: None,
            variable_value: None,
            background: false,
            redirect_input: None,
            redirect_output: None,
            argv: Vec::new(),
            next: None,
            next_piped: None,
        }
    }

    pub fn word(text: impl Into<String>, origin: Origin) -> Self {
        let mut node = Self::new(NodeKind::Word, origin);
        node.text = Some(text.into());
        node
    }

    pub fn variable(name: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Word, Origin::Variable);
        node.variable_name = Some(name.into());
        node
    }

    pub fn command(kind: NodeKind, text: impl Into<String>) -> Self {
        let mut node = Self::new(kind, Origin::Word);
        node.text = Some(text.into());
        node
    }

    pub fn next_word(&self) -> Option<NodeId> {
        self.next
    }

    pub fn next_piped(&self) -> Option<NodeId> {
        self.next_piped
    }
}

/// One parsed input line: an arena of nodes threaded by two chains.
/// `next_piped` links stage heads, `next` links the words of one stage.
/// Links are only created by `push_stage` and `push_word`.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    pub(crate) nodes: Vec<CommandNode>,
    pub(crate) head: Option<NodeId>,
    last_stage: Option<NodeId>,
}

impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    /// Appends a new stage head at the end of the pipeline.
    pub fn push_stage(&mut self, node: CommandNode) -> NodeId {
        let id = self.alloc(node);
        match self.last_stage {
            Some(last) => self.nodes[last.0].next_piped = Some(id),
            None => self.head = Some(id),
        }
        self.last_stage = Some(id);
        id
    }

    /// Appends an argument node to the end of `stage`'s word chain.
    pub fn push_word(&mut self, stage: NodeId, node: CommandNode) -> NodeId {
        let mut tail = stage;
        while let Some(next) = self.nodes[tail.0].next {
            tail = next;
        }
        let id = self.alloc(node);
        self.nodes[tail.0].next = Some(id);
        id
    }

    fn alloc(&mut self, node: CommandNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Walks both chains and returns, per stage, the head followed by its
    /// argument nodes. Every node may be reached at most once; a revisit
    /// means a cycle or a node shared between chains.
    pub fn layout(&self) -> Result<Vec<Vec<NodeId>>, ShellError> {
        let mut seen = vec![false; self.nodes.len()];
        let mut visit = |id: NodeId| -> Result<(), ShellError> {
            match seen.get_mut(id.0) {
                None => Err(ShellError::structure(format!(
                    "dangling node reference {}",
                    id.0
                ))),
                Some(true) => Err(ShellError::structure(format!(
                    "node {} is linked more than once",
                    id.0
                ))),
                Some(flag) => {
                    *flag = true;
                    Ok(())
                }
            }
        };

        let mut stages = Vec::new();
        let mut stage = self.head;
        while let Some(head) = stage {
            visit(head)?;
            let mut words = vec![head];
            let mut word = self.nodes[head.0].next;
            while let Some(id) = word {
                visit(id)?;
                words.push(id);
                word = self.nodes[id.0].next;
            }
            stage = self.nodes[head.0].next_piped;
            stages.push(words);
        }
        Ok(stages)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages = match self.layout() {
            Ok(stages) => stages,
            Err(e) => return write!(f, "<{}>", e),
        };
        for (index, words) in stages.iter().enumerate() {
            let head = self.node(words[0]);
            write!(f, "stage {} [{:?}]", index, head.kind)?;
            if let Some(path) = &head.redirect_input {
                write!(f, " <{}", path)?;
            }
            if let Some(path) = &head.redirect_output {
                write!(f, " >{}", path)?;
            }
            if head.background {
                write!(f, " &")?;
            }
            writeln!(f)?;
            for id in words {
                let node = self.node(*id);
                match node.origin {
                    Origin::Variable => writeln!(
                        f,
                        "  {:?} ${}",
                        node.origin,
                        node.variable_name.as_deref().unwrap_or_default()
                    )?,
                    _ => writeln!(
                        f,
                        "  {:?} {:?}",
                        node.origin,
                        node.text.as_deref().unwrap_or_default()
                    )?,
                }
            }
        }
        Ok(())
    }
}
