use std::iter::Peekable;
use std::str::Chars;

use crate::shell::error::ShellError;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Word(String),
    Variable(String),
    Quoted(String),
    Pipe,
    RedirectIn,
    RedirectOut,
    Background,
    EOF,
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ShellError> {
        self.skip_whitespace();

        let token = match self.peek_char() {
            None => Token::EOF,
            Some(c) => match c {
                '|' => {
                    self.read_char();
                    Token::Pipe
                }
                '&' => {
                    self.read_char();
                    Token::Background
                }
                '<' => {
                    self.read_char();
                    Token::RedirectIn
                }
                '>' => {
                    self.read_char();
                    Token::RedirectOut
                }
                '"' | '\'' => self.read_quoted_string()?,
                '$' => self.read_variable(),
                _ => self.read_word(),
            },
        };
        Ok(token)
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }

    fn is_boundary(c: char) -> bool {
        c.is_whitespace() || "<>|&\"'".contains(c)
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while let Some(c) = self.peek_char() {
            if Self::is_boundary(c) {
                break;
            }
            self.read_char();
            word.push(c);
        }

        Token::Word(word)
    }

    fn read_variable(&mut self) -> Token {
        self.read_char(); // '$'
        let mut name = String::new();

        while let Some(c) = self.peek_char() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            self.read_char();
            name.push(c);
        }

        if name.is_empty() {
            // a bare '$' is an ordinary word
            match self.read_word() {
                Token::Word(rest) => Token::Word(format!("${}", rest)),
                other => other,
            }
        } else {
            Token::Variable(name)
        }
    }

    fn read_quoted_string(&mut self) -> Result<Token, ShellError> {
        let quote = self.read_char().unwrap_or_default();
        let mut string = String::new();
        let mut escaped = false;

        while let Some(c) = self.read_char() {
            match (escaped, c) {
                (true, _) => {
                    string.push(c);
                    escaped = false;
                }
                (false, '\\') => escaped = true,
                (false, c) if c == quote => return Ok(Token::Quoted(string)),
                (false, c) => string.push(c),
            }
        }

        Err(ShellError::Syntax(format!("unterminated {} quote", quote)))
    }
}
