//! Lexer (tokenizer) for bracket-headed source code
//!
//! Converts raw source text into [`Token`]s on demand: the parser pulls one
//! token at a time with [`Lexer::next_token`], so the stream is never
//! materialised. Whitespace, `//` line comments and `/* */` block comments
//! are skipped before every token, and the current line is tracked for
//! diagnostics.
//!
//! Identifiers are interned: the first occurrence of a spelling is inserted
//! into the word table (which starts out holding the reserved words), and
//! every later occurrence hands back the same shared name.

use super::types::Type;
use log::trace;
use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// All token variants produced by the lexer.
#[derive(Debug, Clone)]
pub enum Token {
    /// Wildcard: equal to every token
    Any,

    // Operators
    Plus,    // +
    Minus,   // -
    Times,   // *
    Divide,  // /
    Less,    // <
    LEqual,  // <=
    Equal,   // ==
    GEqual,  // >=
    Greater, // >
    Not,     // !
    NEqual,  // !=
    Assign,  // =
    And,     // &&
    Or,      // ||

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBrack,
    RBrack,
    Colon,
    Semi,
    Comma,

    // Keywords
    If,
    Else,
    While,
    Do,
    Break,
    Return,
    Struct,

    // Literals and names
    Identifier(Rc<str>),
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    StringLiteral(String),
    Type(Type),

    /// End of input
    Eof,
}

impl PartialEq for Token {
    fn eq(&self, other: &Token) -> bool {
        match (self, other) {
            (Token::Any, _) | (_, Token::Any) => true,
            (Token::Identifier(a), Token::Identifier(b)) => a == b,
            (Token::Boolean(a), Token::Boolean(b)) => a == b,
            (Token::Integer(a), Token::Integer(b)) => a == b,
            (Token::Decimal(a), Token::Decimal(b)) => a == b,
            (Token::StringLiteral(a), Token::StringLiteral(b)) => a == b,
            (Token::Type(a), Token::Type(b)) => a == b,
            (Token::Identifier(_), _)
            | (Token::Boolean(_), _)
            | (Token::Integer(_), _)
            | (Token::Decimal(_), _)
            | (Token::StringLiteral(_), _)
            | (Token::Type(_), _) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Any => write!(f, "any token"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Times => write!(f, "'*'"),
            Token::Divide => write!(f, "'/'"),
            Token::Less => write!(f, "'<'"),
            Token::LEqual => write!(f, "'<='"),
            Token::Equal => write!(f, "'=='"),
            Token::GEqual => write!(f, "'>='"),
            Token::Greater => write!(f, "'>'"),
            Token::Not => write!(f, "'!'"),
            Token::NEqual => write!(f, "'!='"),
            Token::Assign => write!(f, "'='"),
            Token::And => write!(f, "'&&'"),
            Token::Or => write!(f, "'||'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBrack => write!(f, "'['"),
            Token::RBrack => write!(f, "']'"),
            Token::Colon => write!(f, "':'"),
            Token::Semi => write!(f, "';'"),
            Token::Comma => write!(f, "','"),
            Token::If => write!(f, "'if'"),
            Token::Else => write!(f, "'else'"),
            Token::While => write!(f, "'while'"),
            Token::Do => write!(f, "'do'"),
            Token::Break => write!(f, "'break'"),
            Token::Return => write!(f, "'return'"),
            Token::Struct => write!(f, "'struct'"),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::Boolean(value) => write!(f, "boolean {}", value),
            Token::Integer(value) => write!(f, "integer {}", value),
            Token::Decimal(value) => write!(f, "decimal {}", value),
            Token::StringLiteral(s) => write!(f, "string \"{}\"", s),
            Token::Type(ty) => write!(f, "type {}", ty),
            Token::Eof => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} near line {line}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
}

/// Lexer for bracket-headed source
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    words: FxHashMap<String, Token>,
    failed: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        let mut words = FxHashMap::default();
        for (spelling, token) in [
            ("true", Token::Boolean(true)),
            ("false", Token::Boolean(false)),
            ("if", Token::If),
            ("else", Token::Else),
            ("while", Token::While),
            ("do", Token::Do),
            ("break", Token::Break),
            ("return", Token::Return),
            ("struct", Token::Struct),
            ("char", Token::Type(Type::Char)),
            ("int", Token::Type(Type::Int)),
            ("float", Token::Type(Type::Float)),
            ("bool", Token::Type(Type::Bool)),
            ("void", Token::Type(Type::Void)),
        ] {
            words.insert(spelling.to_string(), token);
        }

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            words,
            failed: false,
        }
    }

    /// Line of the most recently consumed character
    pub fn line(&self) -> usize {
        self.line
    }

    /// Interned token for a spelling, if it has been seen (or is reserved)
    pub fn word(&self, spelling: &str) -> Option<&Token> {
        self.words.get(spelling)
    }

    /// Number of entries in the word table
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Whether any token other than end-of-input remains.
    ///
    /// A lexical error in the trailing trivia counts as a remaining token so
    /// that the next call to [`Lexer::next_token`] reports it.
    pub fn has_token(&mut self) -> bool {
        let (position, line) = (self.position, self.line);
        match self.skip_trivia() {
            Ok(()) => !self.is_at_end(),
            Err(_) => {
                self.position = position;
                self.line = line;
                true
            }
        }
    }

    /// Get next token
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;

        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let ch = self.current();
        let token = if ch.is_ascii_digit() {
            self.number_literal()?
        } else if ch.is_ascii_alphabetic() || ch == '_' {
            self.identifier_or_keyword()
        } else if ch == '"' {
            self.string_literal()?
        } else {
            self.operator()?
        };

        trace!("line {}: {}", self.line, token);
        Ok(token)
    }

    /// Parse numeric literal: integer, or decimal when a '.' is followed by digits
    fn number_literal(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        while self.current().is_ascii_digit() {
            self.advance();
        }

        let is_decimal =
            self.current() == '.' && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit());
        if is_decimal {
            self.advance();
            while self.current().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.input[start..self.position].iter().collect();
        if is_decimal {
            text.parse::<f64>()
                .map(Token::Decimal)
                .map_err(|_| self.error("malformed decimal literal"))
        } else {
            text.parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| self.error("integer literal is too large"))
        }
    }

    /// Parse identifier or keyword, interning novel spellings
    fn identifier_or_keyword(&mut self) -> Token {
        let mut word = String::new();
        while self.current().is_ascii_alphanumeric() || self.current() == '_' {
            word.push(self.current());
            self.advance();
        }

        if let Some(token) = self.words.get(&word) {
            return token.clone();
        }

        let token = Token::Identifier(Rc::from(word.as_str()));
        self.words.insert(word, token.clone());
        token
    }

    /// Parse string literal
    fn string_literal(&mut self) -> Result<Token, LexError> {
        let start_line = self.line;
        self.advance(); // opening quote
        let mut string = String::new();

        loop {
            if self.is_at_end() {
                return Err(LexError {
                    message: "unterminated string literal".to_string(),
                    line: start_line,
                });
            }

            match self.current() {
                '"' => {
                    self.advance();
                    return Ok(Token::StringLiteral(string));
                }
                '\\' => {
                    self.advance();
                    let unescaped = match self.current() {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '\\' => '\\',
                        '"' => '"',
                        '0' => '\0',
                        _ if self.is_at_end() => continue,
                        other => {
                            return Err(self.error(format!("unknown escape sequence: \\{}", other)));
                        }
                    };
                    string.push(unescaped);
                    self.advance();
                }
                ch => {
                    string.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Operators and punctuation; two-character operators win over their prefix
    fn operator(&mut self) -> Result<Token, LexError> {
        let ch = self.current();
        self.advance();

        let pair = match (ch, self.current()) {
            ('<', '=') => Some(Token::LEqual),
            ('>', '=') => Some(Token::GEqual),
            ('=', '=') => Some(Token::Equal),
            ('!', '=') => Some(Token::NEqual),
            ('&', '&') => Some(Token::And),
            ('|', '|') => Some(Token::Or),
            _ => None,
        };
        if let Some(token) = pair {
            self.advance();
            return Ok(token);
        }

        match ch {
            '+' => Ok(Token::Plus),
            '-' => Ok(Token::Minus),
            '*' => Ok(Token::Times),
            '/' => Ok(Token::Divide),
            '<' => Ok(Token::Less),
            '>' => Ok(Token::Greater),
            '!' => Ok(Token::Not),
            '=' => Ok(Token::Assign),
            '{' => Ok(Token::LBrace),
            '}' => Ok(Token::RBrace),
            '(' => Ok(Token::LParen),
            ')' => Ok(Token::RParen),
            '[' => Ok(Token::LBrack),
            ']' => Ok(Token::RBrack),
            ':' => Ok(Token::Colon),
            ';' => Ok(Token::Semi),
            ',' => Ok(Token::Comma),
            _ => Err(self.error(format!("unrecognized character '{}'", ch))),
        }
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.current() {
                ' ' | '\t' | '\r' | '\n' if !self.is_at_end() => {
                    self.advance();
                }
                '/' if self.peek_ahead(1) == Some('/') => {
                    while !self.is_at_end() && self.current() != '\n' {
                        self.advance();
                    }
                }
                '/' if self.peek_ahead(1) == Some('*') => {
                    let start_line = self.line;
                    self.advance();
                    self.advance();
                    loop {
                        if self.is_at_end() {
                            return Err(LexError {
                                message: "unterminated block comment".to_string(),
                                line: start_line,
                            });
                        }
                        if self.current() == '*' && self.peek_ahead(1) == Some('/') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Current character, or the NUL sentinel past the end of the buffer
    fn current(&self) -> char {
        self.input.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) {
        if let Some(&ch) = self.input.get(self.position) {
            if ch == '\n' {
                self.line += 1;
            }
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            line: self.line,
        }
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    /// Yields tokens up to (not including) end of input, stopping after the
    /// first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(Token::Eof) => None,
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
