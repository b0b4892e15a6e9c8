//! The syntax-tree contract consumed by the analyzer, plus a small reference parser.
//!
//! The analyzer only depends on the types in [`tree`]. The parser understands a
//! compact C-like statement language (functions, imports, `if`/`else`, loops,
//! `do`/`on fail`, `lock`, calls and remote actions) and exists so that documents can
//! be round-tripped without a host compiler in the loop.

mod lexer;
mod parser;
pub mod tree;

pub use parser::{parse_block, parse_module};
pub use tree::*;
