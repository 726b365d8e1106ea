//! Fragment template language.
//!
//! A template is a set of named fragments:
//!
//! ```text
//! {{#fragment cursor}}
//! @interface {{table.cursor}} : CursorBase
//! {{#each columns as column}}
//! -({{column.arg_type}}){{column.name}};
//! {{/each}}
//! @end
//! {{/fragment}}
//! ```
//!
//! Tags:
//! - `{{path}}` substitutes a scalar value.
//! - `{{#each path as name [sep="text"]}}...{{/each}}` repeats over a list,
//!   binding `name` and `loop.index`, `loop.ordinal`, `loop.first`,
//!   `loop.last`.
//! - `{{#if [not] path [== "text" | != "text"]}}...{{else if ...}}...{{else}}...{{/if}}`.
//! - `{{> name}}` expands another fragment in the current scope.
//! - `{{! comment}}` is dropped.
//!
//! Block tags alone on their line consume the line.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Fragment, Node, Path, Template};
pub use parser::parse;
