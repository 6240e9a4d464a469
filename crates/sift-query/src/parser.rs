//! Query parser.
//!
//! Parses a token stream into a query tree using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query    → clauses
//! clauses  → clause (("AND" | "OR")? clause)*
//! clause   → ("+" | "-" | "NOT")? primary ("^" NUMBER)?
//! primary  → value | FIELD_PREFIX (value | "(" clauses ")") | "*:*" | "(" clauses ")"
//! value    → TERM | PHRASE | PREFIX
//! ```
//!
//! Bare clauses are optional (`Should`), `+` makes a clause mandatory and `-`
//! or `NOT` prohibits it. `a AND b` makes both sides mandatory; `OR` is the
//! default and only separates clauses. A parenthesized group always produces a
//! boolean query, so `+(a b)` is a mandatory disjunction.

use std::mem;

use crate::{
    ast::{Clause, MATCH_ALL_FIELD, Occur, Query},
    error::{ParseError, QueryError},
    lexer::{Token, tokenize_with_positions},
};

/// Deepest parenthesized nesting accepted.
pub const MAX_DEPTH: usize = 128;

/// Recursive descent parser for query expressions.
struct Parser {
    /// Token stream to parse, with byte offsets.
    tokens: Vec<(usize, Token)>,
    /// Current position in token stream.
    position: usize,
    /// Byte length of the input, reported for errors at end of input.
    input_len: usize,
    /// Number of groups currently open.
    depth: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<(usize, Token)>, input_len: usize) -> Self {
        Self {
            tokens,
            position: 0,
            input_len,
            depth: 0,
        }
    }

    /// Parses the token stream into a query, using `default_field` for unfielded values.
    fn parse(mut self, default_field: &str) -> Result<Option<Query>, ParseError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let mut clauses = self.parse_clauses(default_field)?;

        if let Some(token) = self.peek() {
            return Err(ParseError::new(
                format!("unexpected token: {token:?}"),
                Some(self.offset()),
            ));
        }

        if clauses.len() == 1 && clauses[0].occur == Occur::Should {
            return Ok(clauses.pop().map(|c| c.query));
        }

        Ok(Some(Query::Boolean(clauses)))
    }

    /// Parses: clauses → clause (("AND" | "OR")? clause)*
    ///
    /// Stops at a closing parenthesis or end of input.
    fn parse_clauses(&mut self, field: &str) -> Result<Vec<Clause>, ParseError> {
        let mut clauses: Vec<Clause> = Vec::new();

        while let Some(token) = self.peek() {
            match token {
                Token::RParen => break,
                Token::And => {
                    let Some(previous) = clauses.last_mut() else {
                        return Err(ParseError::new(
                            "unexpected AND (needs a clause before it)",
                            Some(self.offset()),
                        ));
                    };
                    if previous.occur == Occur::Should {
                        previous.occur = Occur::Must;
                    }
                    self.advance();
                    let mut next = self.parse_operand("AND", field)?;
                    if next.occur == Occur::Should {
                        next.occur = Occur::Must;
                    }
                    clauses.push(next);
                }
                Token::Or => {
                    if clauses.is_empty() {
                        return Err(ParseError::new(
                            "unexpected OR (needs a clause before it)",
                            Some(self.offset()),
                        ));
                    }
                    self.advance();
                    clauses.push(self.parse_operand("OR", field)?);
                }
                _ => clauses.push(self.parse_clause(field)?),
            }
        }

        Ok(clauses)
    }

    /// Parses the clause following a binary keyword.
    fn parse_operand(&mut self, keyword: &str, field: &str) -> Result<Clause, ParseError> {
        match self.peek() {
            None | Some(Token::RParen) => Err(ParseError::new(
                format!("{keyword} requires a clause after it"),
                Some(self.offset()),
            )),
            _ => self.parse_clause(field),
        }
    }

    /// Parses: clause → ("+" | "-" | "NOT")? primary ("^" NUMBER)?
    fn parse_clause(&mut self, field: &str) -> Result<Clause, ParseError> {
        let occur = match self.peek() {
            Some(Token::Plus) => Occur::Must,
            Some(Token::Minus | Token::Not) => Occur::MustNot,
            _ => Occur::Should,
        };
        if occur != Occur::Should {
            self.advance();
        }

        let query = self.parse_primary(field)?;
        let query = self.maybe_apply_boost(query);
        Ok(Clause { occur, query })
    }

    /// Applies a boost suffix if the current token is one.
    fn maybe_apply_boost(&mut self, query: Query) -> Query {
        if let Some(Token::Boost(factor)) = self.peek().cloned() {
            self.advance();
            Query::boost(query, factor)
        } else {
            query
        }
    }

    /// Parses: primary → value | FIELD_PREFIX (...) | "*:*" | "(" clauses ")"
    fn parse_primary(&mut self, field: &str) -> Result<Query, ParseError> {
        match self.peek().cloned() {
            Some(Token::Term(_) | Token::Phrase(_) | Token::Prefix(_)) => self.parse_value(field),

            Some(Token::FieldPrefix(name)) => {
                self.advance();
                self.parse_field_expr(&name)
            }

            Some(Token::LParen) => self.parse_group(field),

            Some(Token::Star) => Err(ParseError::new(
                "bare '*' is only valid as *:* or field:*",
                Some(self.offset()),
            )),

            Some(Token::RParen) => Err(ParseError::new(
                "unexpected closing parenthesis",
                Some(self.offset()),
            )),

            Some(Token::And | Token::Or) => Err(ParseError::new(
                "unexpected operator after a clause prefix",
                Some(self.offset()),
            )),

            Some(Token::Plus | Token::Minus | Token::Not) => Err(ParseError::new(
                "a clause can only have one of +, - or NOT",
                Some(self.offset()),
            )),

            Some(Token::Boost(_)) => Err(ParseError::new(
                "unexpected boost (needs a clause before it)",
                Some(self.offset()),
            )),

            None => Err(ParseError::new(
                "unexpected end of query",
                Some(self.input_len),
            )),
        }
    }

    /// Parses the expression after a field prefix.
    fn parse_field_expr(&mut self, name: &str) -> Result<Query, ParseError> {
        if name == MATCH_ALL_FIELD {
            return if self.check(&Token::Star) {
                self.advance();
                Ok(Query::MatchAll)
            } else {
                Err(ParseError::new(
                    "expected '*' after field '*:'",
                    Some(self.offset()),
                ))
            };
        }

        match self.peek() {
            Some(Token::Term(_) | Token::Phrase(_) | Token::Prefix(_)) => self.parse_value(name),
            Some(Token::Star) => {
                self.advance();
                Ok(Query::Prefix {
                    field: name.to_string(),
                    prefix: String::new(),
                })
            }
            Some(Token::LParen) => self.parse_group(name),
            _ => Err(ParseError::new(
                format!("expected a value after field '{name}:'"),
                Some(self.offset()),
            )),
        }
    }

    /// Parses a TERM, PHRASE or PREFIX token into a leaf query, consuming the token.
    fn parse_value(&mut self, field: &str) -> Result<Query, ParseError> {
        let offset = self.offset();
        let query = match self.peek().cloned() {
            Some(Token::Term(text)) => Query::term(field, text),
            Some(Token::Prefix(prefix)) => Query::Prefix {
                field: field.to_string(),
                prefix,
            },
            Some(Token::Phrase(text)) => {
                let mut terms: Vec<String> = text.split_whitespace().map(String::from).collect();
                match terms.len() {
                    0 => return Err(ParseError::new("empty phrase", Some(offset))),
                    1 => Query::term(field, terms.remove(0)),
                    _ => Query::Phrase {
                        field: field.to_string(),
                        terms,
                    },
                }
            }
            _ => return Err(ParseError::new("expected a term or phrase", Some(offset))),
        };
        self.advance();
        Ok(query)
    }

    /// Parses a parenthesized group, consuming the surrounding parentheses.
    fn parse_group(&mut self, field: &str) -> Result<Query, ParseError> {
        let open = self.offset();
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(
                format!("query nested too deeply (more than {MAX_DEPTH} groups)"),
                Some(open),
            ));
        }
        self.advance(); // (
        self.depth += 1;
        let clauses = self.parse_clauses(field)?;
        self.depth -= 1;

        if !self.check(&Token::RParen) {
            return Err(ParseError::new(
                "expected closing parenthesis",
                Some(self.offset()),
            ));
        }
        self.advance(); // )

        if clauses.is_empty() {
            return Err(ParseError::new("empty group", Some(open)));
        }

        Ok(Query::Boolean(clauses))
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(_, token)| token)
    }

    /// Returns the byte offset of the current token, or the input length at the end.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .map_or(self.input_len, |(offset, _)| *offset)
    }

    /// Checks if the current token matches the given token kind.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| mem::discriminant(t) == mem::discriminant(token))
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses a query string into a query tree.
///
/// Unfielded values are searched in `default_field`. Returns `Ok(None)` for
/// empty queries, `Ok(Some(query))` for valid queries, or `Err(QueryError)`
/// for invalid syntax.
pub fn parse(input: &str, default_field: &str) -> Result<Option<Query>, QueryError> {
    let tokens = tokenize_with_positions(input).map_err(QueryError::from)?;
    Parser::new(tokens, input.len())
        .parse(default_field)
        .map_err(|e| QueryError::from(e).with_query(input))
}
