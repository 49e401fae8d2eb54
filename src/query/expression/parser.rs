//! Tokenizer and parser for object-query expressions.
//!
//! Grammar (one chain per input):
//!
//! ```text
//! chain   := path ( "." IDENT [ "(" args ")" ] )*
//! path    := IDENT ( "::" IDENT )*
//! args    := arg ( "," arg )* [","]
//! arg     := IDENT ":" literal | literal [ "=>" literal ]
//! literal := atom [ (".." | "...") atom ]
//! atom    := INT | FLOAT | STRING | SYMBOL | true | false | nil
//!          | "[" literal,* "]" | "{" pair,* "}"
//! ```
//!
//! Keyword arguments are gathered into one trailing hash argument.

use super::ExpressionError;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// A literal argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Array(Vec<Literal>),
    Hash(Vec<(String, Literal)>),
    Range {
        start: Box<Literal>,
        end: Box<Literal>,
        exclusive: bool,
    },
}

impl Literal {
    /// Column-ish name carried by a symbol or string.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Literal::Symbol(s) | Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Nil => f.write_str("nil"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Float(x) => write!(f, "{x:?}"),
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::Symbol(s) => write!(f, ":{s}"),
            Literal::Array(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Literal::Hash(pairs) => {
                let parts: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Literal::Range {
                start,
                end,
                exclusive,
            } => write!(f, "{start}{}{end}", if *exclusive { "..." } else { ".." }),
        }
    }
}

/// One `.method(args)` step.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub args: Vec<Literal>,
}

/// A parsed expression: a type path followed by method calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub path: Vec<String>,
    pub calls: Vec<Call>,
}

impl Chain {
    /// `LearnHub::Course` style rendering of the root path.
    pub fn root(&self) -> String {
        self.path.join("::")
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Dot,
    DotDot,
    DotDotDot,
    DoubleColon,
    Colon,
    Arrow,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "'{s}'"),
            Token::Int(n) => write!(f, "'{n}'"),
            Token::Float(x) => write!(f, "'{x}'"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Symbol(s) => write!(f, "':{s}'"),
            Token::Dot => f.write_str("'.'"),
            Token::DotDot => f.write_str("'..'"),
            Token::DotDotDot => f.write_str("'...'"),
            Token::DoubleColon => f.write_str("'::'"),
            Token::Colon => f.write_str("':'"),
            Token::Arrow => f.write_str("'=>'"),
            Token::Comma => f.write_str("','"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }

            let token = match c {
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '[' => self.single(Token::LBracket),
                ']' => self.single(Token::RBracket),
                '{' => self.single(Token::LBrace),
                '}' => self.single(Token::RBrace),
                ',' => self.single(Token::Comma),
                '.' => self.dots(),
                ':' => self.colon()?,
                '=' => {
                    self.chars.next();
                    if self.chars.next_if_eq(&'>').is_none() {
                        return Err(ExpressionError::syntax("unexpected '='"));
                    }
                    Token::Arrow
                }
                '\'' | '"' => self.string(c)?,
                '-' => {
                    self.chars.next();
                    if !self.chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                        return Err(ExpressionError::syntax("unexpected '-'"));
                    }
                    self.number(true)?
                }
                c if c.is_ascii_digit() => self.number(false)?,
                c if is_ident_start(c) => Token::Ident(self.ident()),
                other => {
                    return Err(ExpressionError::syntax(format!(
                        "unexpected character '{other}'"
                    )))
                }
            };
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn single(&mut self, token: Token) -> Token {
        self.chars.next();
        token
    }

    fn dots(&mut self) -> Token {
        self.chars.next();
        if self.chars.next_if_eq(&'.').is_none() {
            return Token::Dot;
        }
        if self.chars.next_if_eq(&'.').is_some() {
            Token::DotDotDot
        } else {
            Token::DotDot
        }
    }

    fn colon(&mut self) -> Result<Token, ExpressionError> {
        self.chars.next();
        let next = self.chars.peek().copied();
        match next {
            Some(':') => {
                self.chars.next();
                Ok(Token::DoubleColon)
            }
            Some(c) if is_ident_start(c) => Ok(Token::Symbol(self.ident())),
            Some(q) if q == '"' || q == '\'' => match self.string(q)? {
                Token::Str(s) => Ok(Token::Symbol(s)),
                _ => Err(ExpressionError::syntax("invalid symbol")),
            },
            _ => Ok(Token::Colon),
        }
    }

    /// Identifiers may end in `?` or `!` (`exists?`).
    fn ident(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.chars.next_if(|c| is_ident_char(*c)) {
            name.push(c);
        }
        if let Some(suffix) = self.chars.next_if(|c| *c == '?' || *c == '!') {
            name.push(suffix);
        }
        name
    }

    fn number(&mut self, negative: bool) -> Result<Token, ExpressionError> {
        let mut digits = String::new();
        if negative {
            digits.push('-');
        }
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '_') {
            if c != '_' {
                digits.push(c);
            }
        }

        // A fraction needs a digit after the dot; `1..5` is a range.
        let mut lookahead = self.chars.clone();
        let is_fraction = lookahead.next() == Some('.')
            && lookahead.next().is_some_and(|c| c.is_ascii_digit());

        if is_fraction {
            self.chars.next();
            digits.push('.');
            while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit()) {
                digits.push(c);
            }
            return digits
                .parse()
                .map(Token::Float)
                .map_err(|_| ExpressionError::syntax(format!("invalid number '{digits}'")));
        }

        digits
            .parse()
            .map(Token::Int)
            .map_err(|_| ExpressionError::syntax(format!("invalid number '{digits}'")))
    }

    fn string(&mut self, quote: char) -> Result<Token, ExpressionError> {
        self.chars.next();
        let mut value = String::new();
        loop {
            match self.chars.next() {
                None => return Err(ExpressionError::syntax("unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\\') => match self.chars.next() {
                    Some('n') if quote == '"' => value.push('\n'),
                    Some('t') if quote == '"' => value.push('\t'),
                    Some(c) if c == quote || c == '\\' => value.push(c),
                    Some(c) => {
                        value.push('\\');
                        value.push(c);
                    }
                    None => return Err(ExpressionError::syntax("unterminated string literal")),
                },
                Some(c) => value.push(c),
            }
        }
        Ok(Token::Str(value))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), ExpressionError> {
        match self.next() {
            Some(t) if t == *token => Ok(()),
            Some(t) => Err(ExpressionError::syntax(format!(
                "unexpected {t}, expecting {token}"
            ))),
            None => Err(ExpressionError::syntax(format!(
                "unexpected end of input, expecting {token}"
            ))),
        }
    }

    fn chain(&mut self) -> Result<Chain, ExpressionError> {
        let mut path = vec![self.ident("a type name")?];
        while self.eat(&Token::DoubleColon) {
            path.push(self.ident("a type name")?);
        }

        let mut calls = Vec::new();
        while self.eat(&Token::Dot) {
            let method = self.ident("a method name")?;
            let args = if self.eat(&Token::LParen) {
                self.args()?
            } else {
                Vec::new()
            };
            calls.push(Call { method, args });
        }

        match self.next() {
            None => Ok(Chain { path, calls }),
            Some(t) => Err(ExpressionError::syntax(format!(
                "unexpected {t}, expecting end of input"
            ))),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, ExpressionError> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            Some(t) => Err(ExpressionError::syntax(format!(
                "unexpected {t}, expecting {what}"
            ))),
            None => Err(ExpressionError::syntax(format!(
                "unexpected end of input, expecting {what}"
            ))),
        }
    }

    /// Arguments after `(` up to and including `)`.
    fn args(&mut self) -> Result<Vec<Literal>, ExpressionError> {
        let mut positional = Vec::new();
        let mut keywords = Vec::new();

        while !self.eat(&Token::RParen) {
            if let Some(pair) = self.keyword_pair()? {
                keywords.push(pair);
            } else {
                let value = self.literal()?;
                if self.eat(&Token::Arrow) {
                    let key = hash_key(&value)?;
                    keywords.push((key, self.literal()?));
                } else if !keywords.is_empty() {
                    return Err(ExpressionError::syntax(
                        "positional argument follows keyword argument",
                    ));
                } else {
                    positional.push(value);
                }
            }

            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen)?;
                break;
            }
        }

        if !keywords.is_empty() {
            positional.push(Literal::Hash(keywords));
        }
        Ok(positional)
    }

    /// `name: value` or `"name": value`.
    fn keyword_pair(&mut self) -> Result<Option<(String, Literal)>, ExpressionError> {
        let key = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Ident(name)), Some(Token::Colon))
            | (Some(Token::Str(name)), Some(Token::Colon)) => name.clone(),
            _ => return Ok(None),
        };
        self.pos += 2;
        Ok(Some((key, self.literal()?)))
    }

    fn literal(&mut self) -> Result<Literal, ExpressionError> {
        let start = self.atom()?;
        let exclusive = match self.peek() {
            Some(Token::DotDot) => false,
            Some(Token::DotDotDot) => true,
            _ => return Ok(start),
        };
        self.pos += 1;
        let end = self.atom()?;
        Ok(Literal::Range {
            start: Box::new(start),
            end: Box::new(end),
            exclusive,
        })
    }

    fn atom(&mut self) -> Result<Literal, ExpressionError> {
        match self.next() {
            Some(Token::Int(n)) => Ok(Literal::Int(n)),
            Some(Token::Float(x)) => Ok(Literal::Float(x)),
            Some(Token::Str(s)) => Ok(Literal::Str(s)),
            Some(Token::Symbol(s)) => Ok(Literal::Symbol(s)),
            Some(Token::Ident(word)) => match word.as_str() {
                "true" => Ok(Literal::Bool(true)),
                "false" => Ok(Literal::Bool(false)),
                "nil" => Ok(Literal::Nil),
                _ => Err(ExpressionError::unknown_name(format!(
                    "undefined local variable or method '{word}'"
                ))),
            },
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                while !self.eat(&Token::RBracket) {
                    items.push(self.literal()?);
                    if !self.eat(&Token::Comma) {
                        self.expect(&Token::RBracket)?;
                        break;
                    }
                }
                Ok(Literal::Array(items))
            }
            Some(Token::LBrace) => {
                let mut pairs = Vec::new();
                while !self.eat(&Token::RBrace) {
                    let pair = match self.keyword_pair()? {
                        Some(pair) => pair,
                        None => {
                            let key = hash_key(&self.atom()?)?;
                            self.expect(&Token::Arrow)?;
                            (key, self.literal()?)
                        }
                    };
                    pairs.push(pair);
                    if !self.eat(&Token::Comma) {
                        self.expect(&Token::RBrace)?;
                        break;
                    }
                }
                Ok(Literal::Hash(pairs))
            }
            Some(t) => Err(ExpressionError::syntax(format!("unexpected {t}"))),
            None => Err(ExpressionError::syntax("unexpected end of input")),
        }
    }
}

fn hash_key(literal: &Literal) -> Result<String, ExpressionError> {
    literal
        .as_name()
        .map(str::to_string)
        .ok_or_else(|| ExpressionError::syntax(format!("unsupported hash key {literal}")))
}

/// Parses one expression.
pub fn parse(input: &str) -> Result<Chain, ExpressionError> {
    let tokens = Lexer::new(input.trim()).tokenize()?;
    if tokens.is_empty() {
        return Err(ExpressionError::syntax("empty expression"));
    }
    Parser { tokens, pos: 0 }.chain()
}
