//! Query syntax and query trees for sift.
//!
//! Stored queries are written in a small Lucene-like language:
//!
//! - **Terms**: `rust` or `title:rust` - a token in the default or named field
//! - **Phrases**: `body:"error handling"` - consecutive tokens
//! - **Prefixes**: `title:ru*` - any token starting with a prefix
//! - **Occurrence**: `+required -prohibited optional`
//! - **Keywords**: `a AND b`, `a OR b`, `NOT a`
//! - **Grouping**: `+(a b) c` and `title:(a b)`
//! - **Match all**: `*:*`
//! - **Boosting**: `rust^2.5`
//!
//! # Example
//!
//! ```
//! use sift_query::{Occur, Query, parse};
//!
//! let query = parse("+title:guide (rust golang) -deprecated", "body")
//!     .unwrap()
//!     .unwrap();
//! assert!(query.is_conjunction());
//! let Query::Boolean(clauses) = query else { unreachable!() };
//! assert_eq!(clauses[2].occur, Occur::MustNot);
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{Clause, MATCH_ALL_FIELD, Occur, Query};
pub use error::{LexError, ParseError, QueryError, QueryErrorKind};
pub use lexer::{Token, tokenize_with_positions};
pub use parser::{MAX_DEPTH, parse};
