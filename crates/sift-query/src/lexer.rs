//! Query lexer (tokenizer).
//!
//! Converts a query string into a stream of tokens for the parser.

use std::{iter::Peekable, str::Chars};

use crate::error::LexError;

/// A token in the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word.
    Term(String),

    /// A quoted phrase (the quotes are stripped, content preserved).
    Phrase(String),

    /// A word ending in `*` (the star is stripped).
    Prefix(String),

    /// A lone `*`, only meaningful in `*:*`.
    Star,

    /// The AND keyword.
    And,

    /// The OR keyword.
    Or,

    /// The NOT keyword.
    Not,

    /// Mandatory prefix (+).
    Plus,

    /// Prohibited prefix (-).
    Minus,

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// Field prefix (e.g., "title:" produces FieldPrefix("title")).
    FieldPrefix(String),

    /// Boost operator with factor (e.g., "^2.5" produces Boost(2.5)).
    Boost(f32),
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Creates an error at a specific position.
    fn error_at(&self, message: impl Into<String>, position: usize) -> LexError {
        LexError::new(message, position, self.input)
    }

    /// Tokenizes the entire input, returning all tokens with their byte offsets.
    fn tokenize(mut self) -> Result<Vec<(usize, Token)>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let start = self.position;
            match self.next_token()? {
                Some(token) => tokens.push((start, token)),
                None => break,
            }
        }

        Ok(tokens)
    }

    /// Returns the next token, or None if at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        match ch {
            '"' => self.read_phrase(),
            '(' => {
                self.advance();
                Ok(Some(Token::LParen))
            }
            ')' => {
                self.advance();
                Ok(Some(Token::RParen))
            }
            '+' => {
                self.advance();
                Ok(Some(Token::Plus))
            }
            '-' => {
                self.advance();
                Ok(Some(Token::Minus))
            }
            '^' => self.read_boost(),
            _ => self.read_word(),
        }
    }

    /// Reads a quoted phrase.
    fn read_phrase(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        self.advance(); // opening quote

        let mut content = String::new();

        loop {
            match self.chars.peek() {
                Some(&'"') => {
                    self.advance();
                    return Ok(Some(Token::Phrase(content)));
                }
                Some(&ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => {
                    return Err(self.error_at("unclosed quote", start_pos));
                }
            }
        }
    }

    /// Reads a term, keyword, wildcard, or field prefix.
    fn read_word(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        let mut word = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' || ch == '^' {
                break;
            }

            if ch == ':' {
                self.advance();
                if word.is_empty() {
                    return Err(self.error_at("field name missing before ':'", start_pos));
                }
                return Ok(Some(Token::FieldPrefix(word)));
            }

            word.push(ch);
            self.advance();
        }

        let token = match word.as_str() {
            "" => return Ok(None),
            "AND" | "&&" => Token::And,
            "OR" | "||" => Token::Or,
            "NOT" => Token::Not,
            "*" => Token::Star,
            _ => match word.strip_suffix('*') {
                Some(prefix) if prefix.contains('*') => {
                    return Err(self.error_at(
                        "only trailing wildcards are supported",
                        start_pos,
                    ));
                }
                Some(prefix) => Token::Prefix(prefix.to_string()),
                None if word.contains('*') => {
                    return Err(self.error_at(
                        "only trailing wildcards are supported",
                        start_pos,
                    ));
                }
                None => Token::Term(word),
            },
        };

        Ok(Some(token))
    }

    /// Reads a boost operator (^N or ^N.N).
    fn read_boost(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        self.advance(); // '^'

        let mut number = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() || (ch == '.' && !number.contains('.')) {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if number.is_empty() {
            return Err(self.error_at("expected number after '^'", start_pos));
        }

        match number.parse::<f32>() {
            Ok(factor) => Ok(Some(Token::Boost(factor))),
            Err(_) => Err(self.error_at(format!("invalid boost value: {}", number), start_pos)),
        }
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Tokenizes a query string, keeping the byte offset where each token starts.
pub fn tokenize_with_positions(input: &str) -> Result<Vec<(usize, Token)>, LexError> {
    Lexer::new(input).tokenize()
}
