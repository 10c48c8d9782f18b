use super::ast::{Command, CommandKind, Redirections};
use super::lexer::{Lexer, RedirectOp, Token};
use super::ParseError;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
        })
    }

    fn next_token(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    /// 解析整行；空行返回 `Ok(None)`
    pub fn parse_line(&mut self) -> Result<Option<Command>, ParseError> {
        if self.current_token == Token::EOF {
            return Ok(None);
        }
        let command = self.parse_list()?;
        match &self.current_token {
            Token::EOF => Ok(Some(command)),
            token => Err(ParseError::new(format!("unexpected {:?}", token))),
        }
    }

    // list := andor ( ';' andor )* ';'?
    fn parse_list(&mut self) -> Result<Command, ParseError> {
        let mut left = self.parse_and_or()?;
        while self.current_token == Token::Semi {
            self.next_token()?;
            if matches!(self.current_token, Token::EOF | Token::RParen) {
                break;
            }
            let right = self.parse_and_or()?;
            left = Command::sequence(left, right);
        }
        Ok(left)
    }

    // andor := pipeline ( ('&&' | '||') pipeline )*
    fn parse_and_or(&mut self) -> Result<Command, ParseError> {
        let mut left = self.parse_pipeline()?;
        loop {
            let is_and = match self.current_token {
                Token::AndIf => true,
                Token::OrIf => false,
                _ => return Ok(left),
            };
            self.next_token()?;
            let right = self.parse_pipeline()?;
            left = if is_and {
                Command::and(left, right)
            } else {
                Command::or(left, right)
            };
        }
    }

    // pipeline := unit ( '|' unit )*
    fn parse_pipeline(&mut self) -> Result<Command, ParseError> {
        let mut left = self.parse_unit()?;
        while self.current_token == Token::Pipe {
            self.next_token()?;
            let right = self.parse_unit()?;
            left = Command::pipe(left, right);
        }
        Ok(left)
    }

    // unit := '(' list ')' redirect* | simple
    fn parse_unit(&mut self) -> Result<Command, ParseError> {
        if self.current_token != Token::LParen {
            return self.parse_simple_command();
        }

        self.next_token()?;
        let inner = self.parse_list()?;
        if self.current_token != Token::RParen {
            return Err(ParseError::new("expected ')'"));
        }
        self.next_token()?;

        let mut redirections = Redirections::default();
        while let Token::Redirect(op) = self.current_token {
            self.parse_redirection(op, &mut redirections)?;
        }
        Ok(Command::void(inner).with_redirections(redirections))
    }

    fn parse_simple_command(&mut self) -> Result<Command, ParseError> {
        let mut args = Vec::new();
        let mut redirections = Redirections::default();

        // 解析参数和重定向
        loop {
            match &self.current_token {
                Token::Word(word) => {
                    args.push(word.clone());
                    self.next_token()?;
                }
                Token::Redirect(op) => {
                    let op = *op;
                    self.parse_redirection(op, &mut redirections)?;
                }
                Token::Background => {
                    return Err(ParseError::new("background jobs are not supported"));
                }
                _ => break,
            }
        }

        if args.is_empty() && redirections.is_empty() {
            return Err(ParseError::new(format!(
                "expected command, found {:?}",
                self.current_token
            )));
        }

        Ok(Command::from_kind(CommandKind::Plain(args)).with_redirections(redirections))
    }

    fn parse_redirection(
        &mut self,
        operator: RedirectOp,
        redirections: &mut Redirections,
    ) -> Result<(), ParseError> {
        self.next_token()?; // 跳过重定向操作符

        let filename = match &self.current_token {
            Token::Word(filename) => filename.clone(),
            _ => return Err(ParseError::new("expected filename after redirection")),
        };
        self.next_token()?;

        // 同类重定向出现多次时以最后一个为准
        let slot = match operator {
            RedirectOp::Input => &mut redirections.input,
            RedirectOp::Output => &mut redirections.output,
            RedirectOp::Append => &mut redirections.append,
            RedirectOp::Error => &mut redirections.error,
        };
        *slot = Some(filename);
        Ok(())
    }
}

/// 把一行输入解析成命令树
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    Parser::new(line)?.parse_line()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn parse_ok(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(parse_ok("ls -l"), Command::plain(["ls", "-l"]));
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn test_precedence() {
        // `;` < `&&`/`||` < `|`
        let expected = Command::sequence(
            Command::and(
                Command::plain(["a"]),
                Command::pipe(Command::plain(["b"]), Command::plain(["c"])),
            ),
            Command::or(Command::plain(["d"]), Command::plain(["e"])),
        );
        assert_eq!(parse_ok("a && b | c; d || e"), expected);
    }

    #[test]
    fn test_left_associative_pipeline() {
        let expected = Command::pipe(
            Command::pipe(Command::plain(["a"]), Command::plain(["b"])),
            Command::plain(["c"]),
        );
        assert_eq!(parse_ok("a | b | c"), expected);
    }

    #[test]
    fn test_subshell_with_redirection() {
        let expected = Command::void(Command::sequence(
            Command::plain(["cd", "/tmp"]),
            Command::plain(["ls"]),
        ))
        .with_redirections(Redirections {
            output: Some("out.txt".to_string()),
            ..Redirections::default()
        });
        assert_eq!(parse_ok("(cd /tmp; ls) > out.txt"), expected);
    }

    #[test]
    fn test_redirections() {
        let cmd = parse_ok("sort < in.txt >> log.txt 2> err.txt -r");
        assert_eq!(
            cmd,
            Command::plain(["sort", "-r"]).with_redirections(Redirections {
                input: Some("in.txt".to_string()),
                output: None,
                append: Some("log.txt".to_string()),
                error: Some("err.txt".to_string()),
            })
        );
    }

    #[test]
    fn test_trailing_semicolon() {
        assert_eq!(parse_ok("true;"), Command::plain(["true"]));
    }

    #[test]
    fn test_errors() {
        assert!(parse("| ls").is_err());
        assert!(parse("ls &&").is_err());
        assert!(parse("(ls").is_err());
        assert!(parse("ls )").is_err());
        assert!(parse("sleep 10 &").is_err());
        assert!(parse("cat >").is_err());
    }
}
