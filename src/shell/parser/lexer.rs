use std::iter::Peekable;
use std::str::Chars;

use super::ParseError;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Word(String),
    Pipe,
    AndIf,
    OrIf,
    Semi,
    LParen,
    RParen,
    Redirect(RedirectOp),
    Background,
    EOF,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum RedirectOp {
    Input,  // <
    Output, // >
    Append, // >>
    Error,  // 2>
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

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        let token = match self.peek_char() {
            None => Token::EOF,
            Some(c) => match c {
                '|' => {
                    self.read_char();
                    if self.eat('|') {
                        Token::OrIf
                    } else {
                        Token::Pipe
                    }
                }
                '&' => {
                    self.read_char();
                    if self.eat('&') {
                        Token::AndIf
                    } else {
                        Token::Background
                    }
                }
                ';' => {
                    self.read_char();
                    Token::Semi
                }
                '(' => {
                    self.read_char();
                    Token::LParen
                }
                ')' => {
                    self.read_char();
                    Token::RParen
                }
                '<' => {
                    self.read_char();
                    Token::Redirect(RedirectOp::Input)
                }
                '>' => {
                    self.read_char();
                    if self.eat('>') {
                        Token::Redirect(RedirectOp::Append)
                    } else {
                        Token::Redirect(RedirectOp::Output)
                    }
                }
                '"' => self.read_quoted_string(true)?,
                '\'' => self.read_quoted_string(false)?,
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

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.read_char();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || ";<>|&()\"'".contains(c) {
                break;
            }
            word.push(c);
            self.read_char();
        }

        // `2>` 只在单独成词时才是 stderr 重定向
        if word == "2" && self.eat('>') {
            return Token::Redirect(RedirectOp::Error);
        }

        Token::Word(expand_full(&word))
    }

    fn read_quoted_string(&mut self, expand: bool) -> Result<Token, ParseError> {
        let quote = self.read_char().unwrap_or_default();
        let mut string = String::new();
        let mut escaped = false;

        loop {
            let c = self
                .read_char()
                .ok_or_else(|| ParseError::new(format!("unterminated quote {}", quote)))?;
            match (escaped, c) {
                (true, _) => {
                    string.push(c);
                    escaped = false;
                }
                (false, '\\') => escaped = true,
                (false, c) if c == quote => break,
                (false, c) => string.push(c),
            }
        }

        if expand {
            string = expand_env(&string);
        }
        Ok(Token::Word(string))
    }
}

fn expand_full(word: &str) -> String {
    shellexpand::full(word)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| word.to_string())
}

fn expand_env(word: &str) -> String {
    shellexpand::env(word)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| word.to_string())
}
