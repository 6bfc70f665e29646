use super::ast::{CommandLine, CommandNode, NodeId, NodeKind, Origin};
use super::lexer::{Lexer, Token};
use crate::shell::error::ShellError;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, ShellError> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
        })
    }

    fn next_token(&mut self) -> Result<(), ShellError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    pub fn parse_command(&mut self) -> Result<CommandLine, ShellError> {
        let mut line = CommandLine::new();
        if self.current_token == Token::EOF {
            return Ok(line);
        }

        loop {
            let stage = self.parse_stage(&mut line)?;

            match self.current_token {
                Token::Pipe => {
                    self.next_token()?;
                }
                Token::Background => {
                    line.node_mut(stage).background = true;
                    self.next_token()?;
                    if self.current_token != Token::EOF {
                        return Err(ShellError::Syntax(
                            "'&' must end the command line".to_string(),
                        ));
                    }
                    break;
                }
                _ => break,
            }
        }

        Ok(line)
    }

    fn parse_stage(&mut self, line: &mut CommandLine) -> Result<NodeId, ShellError> {
        // 解析命令名
        let head = match self.take_word()? {
            Some(node) => {
                let mut node = node;
                if node.origin == Origin::Word {
                    node.kind = NodeKind::from_keyword(node.text.as_deref().unwrap_or_default());
                }
                line.push_stage(node)
            }
            None => return Err(ShellError::Syntax("expected a command".to_string())),
        };

        // 解析参数和重定向
        loop {
            match &self.current_token {
                Token::EOF | Token::Pipe | Token::Background => break,
                Token::RedirectIn => {
                    let target = self.parse_redirection()?;
                    line.node_mut(head).redirect_input = Some(target);
                }
                Token::RedirectOut => {
                    let target = self.parse_redirection()?;
                    line.node_mut(head).redirect_output = Some(target);
                }
                _ => {
                    if let Some(node) = self.take_word()? {
                        line.push_word(head, node);
                    }
                }
            }
        }

        Ok(head)
    }

    fn take_word(&mut self) -> Result<Option<CommandNode>, ShellError> {
        let node = match &self.current_token {
            Token::Word(word) => CommandNode::word(word.clone(), Origin::Word),
            Token::Quoted(text) => CommandNode::word(text.clone(), Origin::QuotedString),
            Token::Variable(name) => CommandNode::variable(name.clone()),
            _ => return Ok(None),
        };
        self.next_token()?;
        Ok(Some(node))
    }

    fn parse_redirection(&mut self) -> Result<String, ShellError> {
        self.next_token()?; // 跳过重定向操作符

        match &self.current_token {
            Token::Word(target) | Token::Quoted(target) => {
                let target = target.clone();
                self.next_token()?;
                Ok(target)
            }
            _ => Err(ShellError::Syntax(
                "expected filename after redirection operator".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn parse(input: &str) -> CommandLine {
        Parser::new(input).unwrap().parse_command().unwrap()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let line = parse("ls -l");
        let stages = line.layout().unwrap();
        assert_eq!(stages.len(), 1);
        let head = line.node(stages[0][0]);
        assert_eq!(head.kind, NodeKind::Word);
        assert_eq!(head.text.as_deref(), Some("ls"));
        assert_eq!(line.node(stages[0][1]).text.as_deref(), Some("-l"));
        assert!(!head.background);
        assert!(head.redirect_input.is_none());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_pipeline() {
        let line = parse("cat file | grep foo | wc -l");
        let stages = line.layout().unwrap();
        assert_eq!(stages.len(), 3);
        assert_eq!(line.node(stages[1][0]).text.as_deref(), Some("grep"));
        assert_eq!(line.node(stages[2][1]).text.as_deref(), Some("-l"));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection() {
        let line = parse("sort < in.txt > \"out file.txt\"");
        let head = line.node(line.head().unwrap());
        assert_eq!(head.redirect_input.as_deref(), Some("in.txt"));
        assert_eq!(head.redirect_output.as_deref(), Some("out file.txt"));
        assert!(head.next_word().is_none());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_background() {
        let line = parse("sleep 10 | cat &");
        let stages = line.layout().unwrap();
        assert!(!line.node(stages[0][0]).background);
        assert!(line.node(stages[1][0]).background);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_builtins_and_origins() {
        let line = parse("set greeting \"hi there\" $other");
        let stages = line.layout().unwrap();
        let words: Vec<&CommandNode> = stages[0].iter().map(|id| line.node(*id)).collect();
        assert_eq!(words[0].kind, NodeKind::SetVar);
        assert_eq!(words[1].origin, Origin::Word);
        assert_eq!(words[2].origin, Origin::QuotedString);
        assert_eq!(words[3].origin, Origin::Variable);
        assert_eq!(words[3].variable_name.as_deref(), Some("other"));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_quoted_keyword_is_plain_word() {
        let line = parse("'exit'");
        assert_eq!(line.node(line.head().unwrap()).kind, NodeKind::Word);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_empty_input() {
        assert!(parse("   ").is_empty());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_syntax_errors() {
        for input in ["| ls", "ls |", "ls >", "ls & pwd", "< in"] {
            let result = Parser::new(input).unwrap().parse_command();
            assert!(
                matches!(result, Err(ShellError::Syntax(_))),
                "expected syntax error for {:?}",
                input
            );
        }
    }
}
