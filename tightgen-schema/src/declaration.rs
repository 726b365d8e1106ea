//! `DEFINE_TABLE` declaration scanner.
//!
//! Scans arbitrary source text (typically a header) for table declarations
//! of the form
//!
//! ```text
//! DEFINE_TABLE(Person,
//!     (String, Name),
//!     (Int?, Age),
//!     (Table<Child>, Kids))
//! ```
//!
//! `?` after a type marks an optional column and `Table<Name>` a subtable.
//! Comments, string literals and the macro's own `#define` are skipped;
//! all other text is ignored.

use crate::error::{ParseError, SchemaError};
use crate::registry::TypeRegistry;
use crate::schema::{ColumnDecl, SchemaSet, TableSchema, TableSchemaBuilder};
use crate::types::TypeTag;
use std::iter::Peekable;
use std::str::CharIndices;

/// Keyword introducing a table declaration.
pub const DECLARATION_KEYWORD: &str = "DEFINE_TABLE";

/// Parses every `DEFINE_TABLE` declaration in `source`.
///
/// # Arguments
/// * `source` - Text to scan
/// * `registry` - Registry used to resolve column types
///
/// # Returns
/// The declared tables in source order.
///
/// # Errors
/// Returns `SchemaError::Parse` with the line and column of a malformed
/// declaration, `SchemaError::UnknownType` for a type the registry does not
/// hold, and the validation errors of [`TableSchemaBuilder::build`] and
/// [`SchemaSet::push`].
pub fn parse_declarations(source: &str, registry: &TypeRegistry) -> Result<SchemaSet, SchemaError> {
    let set = DeclarationScanner::new(source).scan(registry)?;
    tracing::debug!("Scanned {} table declarations", set.len());
    Ok(set)
}

struct DeclarationScanner<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
}

impl<'a> DeclarationScanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
        }
    }

    fn scan(&mut self, registry: &TypeRegistry) -> Result<SchemaSet, SchemaError> {
        let mut set = SchemaSet::new();
        let mut after_define = false;

        loop {
            self.skip_trivia();
            match self.peek_char() {
                None => break,
                Some(quote @ ('"' | '\'')) => {
                    self.skip_quoted(quote);
                    after_define = false;
                }
                Some(c) if is_ident_start(c) || c.is_ascii_digit() => {
                    let ident = self.identifier();
                    if ident == DECLARATION_KEYWORD && !after_define {
                        self.skip_trivia();
                        if self.peek_char() == Some('(') {
                            set.push(self.declaration(registry)?)?;
                        }
                        after_define = false;
                    } else {
                        after_define = ident == "define";
                    }
                }
                Some(_) => {
                    self.advance();
                    after_define = false;
                }
            }
        }

        Ok(set)
    }

    /// Parses a declaration body, starting at its opening parenthesis.
    fn declaration(&mut self, registry: &TypeRegistry) -> Result<TableSchema, SchemaError> {
        self.expect('(', "expected '(' after DEFINE_TABLE")?;
        self.skip_trivia();
        let table = self.required_identifier("expected table name")?;
        let mut builder = TableSchemaBuilder::new(table.clone());

        loop {
            self.skip_trivia();
            match self.peek_char() {
                Some(')') => {
                    self.advance();
                    break;
                }
                Some(',') => {
                    self.advance();
                }
                _ => return Err(self.error("expected ',' or ')'").into()),
            }

            self.skip_trivia();
            builder.push(self.column(&table, registry)?);
        }

        builder.build()
    }

    /// Parses `(Type[<Table>][?], Name)`.
    fn column(&mut self, table: &str, registry: &TypeRegistry) -> Result<ColumnDecl, SchemaError> {
        self.expect('(', "expected '(' to open a column")?;
        self.skip_trivia();
        let (type_line, type_column) = (self.line, self.column);
        let type_name = self.required_identifier("expected column type")?;

        self.skip_trivia();
        let subtable = if self.peek_char() == Some('<') {
            self.advance();
            self.skip_trivia();
            let target = self.required_identifier("expected subtable name")?;
            self.skip_trivia();
            self.expect('>', "expected '>' after subtable name")?;
            self.skip_trivia();
            Some(target)
        } else {
            None
        };

        let optional = self.peek_char() == Some('?');
        if optional {
            self.advance();
        }

        self.skip_trivia();
        self.expect(',', "expected ',' between column type and name")?;
        self.skip_trivia();
        let name = self.required_identifier("expected column name")?;
        self.skip_trivia();
        self.expect(')', "expected ')' to close a column")?;

        let type_tag = registry.resolve(&type_name, table, &name)?;
        match (type_tag, subtable.is_some()) {
            (TypeTag::Table, false) => {
                return Err(ParseError::declaration(
                    type_line,
                    type_column,
                    format!("subtable column '{name}' must be written Table<Name>"),
                )
                .into());
            }
            (TypeTag::Table, true) | (_, false) => {}
            (other, true) => {
                return Err(ParseError::declaration(
                    type_line,
                    type_column,
                    format!("type {other} of column '{name}' takes no table argument"),
                )
                .into());
            }
        }

        Ok(ColumnDecl {
            name,
            type_tag,
            optional,
            subtable,
        })
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            self.advance();
        }
        self.source[start..self.pos].to_string()
    }

    fn required_identifier(&mut self, message: &str) -> Result<String, ParseError> {
        match self.peek_char() {
            Some(c) if is_ident_start(c) => Ok(self.identifier()),
            _ => Err(self.error(message)),
        }
    }

    fn expect(&mut self, expected: char, message: &str) -> Result<(), ParseError> {
        if self.peek_char() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::declaration(self.line, self.column, message)
    }

    /// Skips a string or character literal. C literals end at the line end.
    fn skip_quoted(&mut self, quote: char) {
        self.advance();
        while let Some(c) = self.peek_char() {
            match c {
                '\n' => return,
                '\\' => {
                    self.advance();
                    if self.peek_char() != Some('\n') {
                        self.advance();
                    }
                }
                c if c == quote => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skips whitespace, line comments and block comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => match self.peek_next_char() {
                    Some('/') => {
                        while let Some(c) = self.peek_char() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        loop {
                            match self.peek_char() {
                                None => break,
                                Some('*') if self.peek_next_char() == Some('/') => {
                                    self.advance();
                                    self.advance();
                                    break;
                                }
                                _ => {
                                    self.advance();
                                }
                            }
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        let (i, c) = self.chars.next()?;
        self.pos = i + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<SchemaSet, SchemaError> {
        parse_declarations(source, &TypeRegistry::new())
    }

    #[test]
    fn test_single_declaration() {
        let set =
            parse("DEFINE_TABLE(Person, (String, Name), (Int, Age))").expect("Failed to parse");
        assert_eq!(set.len(), 1);
        let person = set.get("Person").expect("Person missing");
        let columns: Vec<_> = person
            .columns()
            .iter()
            .map(|c| (c.name(), c.type_tag(), c.index()))
            .collect();
        assert_eq!(
            columns,
            vec![("Name", TypeTag::String, 0), ("Age", TypeTag::Int, 1)]
        );
    }

    #[test]
    fn test_optional_and_subtable_columns() {
        let source = r#"
            DEFINE_TABLE(Child, (String, Name))
            DEFINE_TABLE(Parent,
                (Int?, Age),
                (Table<Child>, Kids))
        "#;
        let set = parse(source).expect("Failed to parse");
        let parent = set.get("Parent").expect("Parent missing");
        assert!(parent.column("Age").is_some_and(|c| c.is_optional()));
        assert_eq!(parent.column("Kids").and_then(|c| c.subtable()), Some("Child"));
    }

    #[test]
    fn test_surrounding_text_is_ignored() {
        let source = r#"
            #import "tightdb.h"
            #define DEFINE_TABLE(name, ...) expand(name)
            // DEFINE_TABLE(Commented, (Int, x))
            /* DEFINE_TABLE(Blocked, (Int, x)) */
            const char *s = "DEFINE_TABLE(Quoted, (Int, x))";
            MY_DEFINE_TABLE(NotOurs, (Int, x))
            DEFINE_TABLE(Real, (Bool, flag))
            int main() { return 0; }
        "#;
        let set = parse(source).expect("Failed to parse");
        let names: Vec<_> = set.iter().map(TableSchema::name).collect();
        assert_eq!(names, vec!["Real"]);
    }

    #[test]
    fn test_malformed_declaration_reports_position() {
        let err = parse("\n  DEFINE_TABLE(Person, (String Name))")
            .expect_err("missing comma should fail");
        match err {
            SchemaError::Parse(ParseError::Declaration { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 32);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_type() {
        let err = parse("DEFINE_TABLE(Person, (Text, Name))").expect_err("Text should fail");
        assert!(matches!(
            err,
            SchemaError::UnknownType { ref table, ref column, ref type_name }
                if table == "Person" && column == "Name" && type_name == "Text"
        ));
    }

    #[test]
    fn test_zero_columns() {
        let err = parse("DEFINE_TABLE(Empty)").expect_err("zero width should fail");
        assert!(matches!(err, SchemaError::EmptySchema { .. }));
    }

    #[test]
    fn test_table_without_argument() {
        let err = parse("DEFINE_TABLE(P, (Table, Kids))").expect_err("bare Table should fail");
        assert!(matches!(err, SchemaError::Parse(ParseError::Declaration { .. })));
        let err = parse("DEFINE_TABLE(P, (Int<X>, Kids))").expect_err("Int<X> should fail");
        assert!(matches!(err, SchemaError::Parse(ParseError::Declaration { .. })));
    }

    #[test]
    fn test_unterminated_declaration() {
        let err = parse("DEFINE_TABLE(Person, (String, Name)")
            .expect_err("missing ')' should fail");
        assert!(matches!(err, SchemaError::Parse(ParseError::Declaration { .. })));
    }
}
