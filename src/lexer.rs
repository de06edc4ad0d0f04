//! Turns expression text into a token stream (spec.md §4.3).

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    IntLit(u64),
    FloatLit(f64),
    Ident(String),
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
    AndAnd,
    OrOr,
    Eof,
}

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_byte(), Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            self.pos += 1;
        }
    }

    /// Produces the full token stream, including a trailing `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, CoreError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok == Token::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, CoreError> {
        self.skip_whitespace();
        let Some(b) = self.peek_byte() else {
            return Ok(Token::Eof);
        };

        if b.is_ascii_digit() {
            return self.lex_number();
        }
        if b == b'_' || b.is_ascii_alphabetic() {
            return Ok(self.lex_ident());
        }

        self.pos += 1;
        Ok(match b {
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'%' => Token::Percent,
            b'~' => Token::Tilde,
            b'^' => Token::Caret,
            b'&' => {
                if self.peek_byte() == Some(b'&') {
                    self.pos += 1;
                    Token::AndAnd
                } else {
                    Token::Amp
                }
            }
            b'|' => {
                if self.peek_byte() == Some(b'|') {
                    self.pos += 1;
                    Token::OrOr
                } else {
                    Token::Pipe
                }
            }
            b'!' => {
                if self.peek_byte() == Some(b'=') {
                    self.pos += 1;
                    Token::Ne
                } else {
                    Token::Bang
                }
            }
            b'=' => {
                if self.peek_byte() == Some(b'=') {
                    self.pos += 1;
                    Token::EqEq
                } else {
                    return Err(CoreError::Parse(format!(
                        "unexpected '=' at byte {}; did you mean '=='?",
                        self.pos - 1
                    )));
                }
            }
            b'<' => {
                if self.peek_byte() == Some(b'<') {
                    self.pos += 1;
                    Token::Shl
                } else if self.peek_byte() == Some(b'=') {
                    self.pos += 1;
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            b'>' => {
                if self.peek_byte() == Some(b'>') {
                    self.pos += 1;
                    Token::Shr
                } else if self.peek_byte() == Some(b'=') {
                    self.pos += 1;
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            other => {
                return Err(CoreError::Parse(format!(
                    "unexpected character '{}' at byte {}",
                    other as char,
                    self.pos - 1
                )))
            }
        })
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek_byte(), Some(b) if b == b'_' || b.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        Token::Ident(self.src[start..self.pos].to_string())
    }

    fn lex_number(&mut self) -> Result<Token, CoreError> {
        let start = self.pos;
        if self.peek_byte() == Some(b'0')
            && matches!(self.peek_byte_at(1), Some(b'x') | Some(b'X'))
        {
            self.pos += 2;
            let digits_start = self.pos;
            while matches!(self.peek_byte(), Some(b) if b.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            if self.pos == digits_start {
                return Err(CoreError::Parse(format!(
                    "malformed hex literal at byte {start}"
                )));
            }
            let value = u64::from_str_radix(&self.src[digits_start..self.pos], 16)
                .map_err(|e| CoreError::Parse(format!("malformed hex literal: {e}")))?;
            return Ok(Token::IntLit(value));
        }

        while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }

        let mut is_float = false;
        if self.peek_byte() == Some(b'.')
            && matches!(self.peek_byte_at(1), Some(b) if b.is_ascii_digit())
        {
            is_float = true;
            self.pos += 1;
            while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek_byte(), Some(b'e') | Some(b'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        let text = &self.src[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Token::FloatLit)
                .map_err(|e| CoreError::Parse(format!("malformed float literal: {e}")))
        } else {
            text.parse::<u64>()
                .map(Token::IntLit)
                .map_err(|e| CoreError::Parse(format!("malformed integer literal: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap()
    }

    #[test]
    fn lexes_a_cast_expression() {
        let tokens = lex("(s32)*0x1000 + 1");
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Ident("s32".into()),
                Token::RParen,
                Token::Star,
                Token::IntLit(0x1000),
                Token::Plus,
                Token::IntLit(1),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_two_char_operators_greedily() {
        assert_eq!(
            lex("a << b >= c"),
            vec![
                Token::Ident("a".into()),
                Token::Shl,
                Token::Ident("b".into()),
                Token::Ge,
                Token::Ident("c".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_a_float_literal_with_exponent() {
        assert_eq!(lex("1.5e3"), vec![Token::FloatLit(1500.0), Token::Eof]);
    }

    #[test]
    fn rejects_single_equals() {
        assert!(Lexer::new("a = b").tokenize().is_err());
    }
}
