//! Schema validation utilities.
//!
//! Identifier rules keep generated names injective: table names never
//! contain an underscore, so the first `_` of a generated type name always
//! separates the table from the artifact suffix.

use crate::error::SchemaError;
use crate::naming;
use crate::schema::{SchemaSet, TableSchema};
use crate::types::TypeTag;
use std::collections::HashSet;

/// C and Objective-C keywords, which cannot name a class or a property.
const KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Bool", "id", "self", "super", "nil",
    "Nil", "YES", "NO", "BOOL", "SEL", "IMP", "Class", "in", "out", "inout", "bycopy",
    "byref", "oneway",
];

/// Classes the generated code declares or derives from.
const RESERVED_TABLE_NAMES: &[&str] = &[
    "Table", "Query", "TableView", "CursorBase", "OCAccessor", "OCSpec", "OCMixed",
    "OCDecimal128", "OCObjectId", "OCDate", "NSObject", "NSString", "NSData", "NSDate",
    "NSNumber", "NSUInteger", "NSInteger", "NSError", "NSFastEnumeration",
];

/// Table name prefixes of the column proxy and query accessor classes.
const RESERVED_TABLE_PREFIXES: &[&str] = &["OCColumnProxy", "OCXQueryAccessor"];

/// Selectors and locals of the generated classes that a column property
/// would shadow.
const RESERVED_COLUMN_NAMES: &[&str] = &[
    "ndx", "add", "insertAtIndex", "where", "objectAtIndex", "lastObject", "getCursor",
    "count", "init", "initWithTable", "_initRaw", "_checkType", "_addColumns", "insertDone",
    "updateFromSpec", "getSpec", "getTable", "group", "or", "endgroup", "subtable", "parent",
    "findAll", "getFastEnumStart", "incrementFastEnum", "class", "description", "hash",
];

/// Validates a table name: an ASCII letter followed by letters or digits,
/// naming none of the classes the generated code builds on.
///
/// # Errors
/// Returns `SchemaError::InvalidIdentifier` if the name is rejected.
pub fn validate_table_name(name: &str) -> Result<(), SchemaError> {
    let reject = |reason| SchemaError::InvalidIdentifier {
        kind: "table",
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(reject("name is empty")),
        Some(c) if !c.is_ascii_alphabetic() => return Err(reject("must start with a letter")),
        Some(_) => {}
    }
    if chars.any(|c| !c.is_ascii_alphanumeric()) {
        return Err(reject("only letters and digits are allowed"));
    }
    if KEYWORDS.contains(&name) {
        return Err(reject("is a C or Objective-C keyword"));
    }
    if RESERVED_TABLE_NAMES.contains(&name)
        || RESERVED_TABLE_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
    {
        return Err(reject("is reserved by the generated API"));
    }
    Ok(())
}

/// Validates a column name: a C identifier that is neither a keyword nor a
/// selector of the generated classes.
///
/// # Errors
/// Returns `SchemaError::InvalidIdentifier` if the name is rejected.
pub fn validate_column_name(name: &str) -> Result<(), SchemaError> {
    let reject = |reason| SchemaError::InvalidIdentifier {
        kind: "column",
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(reject("name is empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(reject("must start with a letter or underscore"));
        }
        Some(_) => {}
    }
    if chars.any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
        return Err(reject("only letters, digits and underscores are allowed"));
    }
    if KEYWORDS.contains(&name) {
        return Err(reject("is a C or Objective-C keyword"));
    }
    if RESERVED_COLUMN_NAMES.contains(&name) {
        return Err(reject("is reserved by the generated API"));
    }
    Ok(())
}

/// Validates a fully built table.
///
/// # Errors
/// Returns the first `SchemaError` found: empty table, bad identifiers,
/// duplicate columns (names differing only in the case of their first
/// letter count as duplicates), optional columns of non-optional types, or subtable
/// references on the wrong type.
pub fn validate_table(schema: &TableSchema) -> Result<(), SchemaError> {
    validate_table_name(schema.name())?;

    if schema.columns().is_empty() {
        return Err(SchemaError::EmptySchema {
            table: schema.name().to_string(),
        });
    }

    // Setters and aggregate selectors capitalize the column name, so `age`
    // and `Age` collide.
    let mut seen = HashSet::new();
    for (position, column) in schema.columns().iter().enumerate() {
        validate_column_name(column.name())?;

        if !seen.insert(naming::capitalize(column.name())) {
            return Err(SchemaError::DuplicateColumn {
                table: schema.name().to_string(),
                column: column.name().to_string(),
            });
        }

        if column.index() != position {
            return Err(SchemaError::validation(format!(
                "column '{}' of table '{}' has index {} at position {}",
                column.name(),
                schema.name(),
                column.index(),
                position
            )));
        }

        let tag = column.type_tag();
        if column.is_optional() && !tag.capabilities().is_optional_capable() {
            return Err(SchemaError::NotOptionalCapable {
                table: schema.name().to_string(),
                column: column.name().to_string(),
                type_name: tag.name().to_string(),
            });
        }

        match (tag, column.subtable()) {
            (TypeTag::Table, None) => {
                return Err(SchemaError::validation(format!(
                    "subtable column '{}' of table '{}' does not name its table",
                    column.name(),
                    schema.name()
                )));
            }
            (TypeTag::Table, Some(_)) | (_, None) => {}
            (other, Some(_)) => {
                return Err(SchemaError::validation(format!(
                    "column '{}' of table '{}' has type {} but names a subtable",
                    column.name(),
                    schema.name(),
                    other
                )));
            }
        }
    }

    Ok(())
}

/// Validates that every subtable column of `schema` names a table already
/// present in `set`.
///
/// Requiring the referenced table to come earlier keeps emission order
/// valid and rules out reference cycles.
///
/// # Errors
/// Returns `SchemaError::UnknownType` for the first dangling reference.
pub fn validate_subtable_references(
    set: &SchemaSet,
    schema: &TableSchema,
) -> Result<(), SchemaError> {
    for column in schema.columns() {
        if let Some(target) = column.subtable() {
            if set.get(target).is_none() {
                return Err(SchemaError::unknown_type(
                    schema.name(),
                    column.name(),
                    format!("Table<{target}>"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert!(validate_table_name("Person").is_ok());
        assert!(validate_table_name("Table2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2Fast").is_err());
        assert!(validate_table_name("My_Table").is_err());
        assert!(validate_table_name("Caf\u{e9}").is_err());
    }

    #[test]
    fn test_column_names() {
        assert!(validate_column_name("Name").is_ok());
        assert!(validate_column_name("_hidden").is_ok());
        assert!(validate_column_name("first_name").is_ok());
        assert!(validate_column_name("").is_err());
        assert!(validate_column_name("9lives").is_err());
        assert!(validate_column_name("with space").is_err());
    }

    #[test]
    fn test_reserved_table_names() {
        for name in ["Query", "Table", "TableView", "CursorBase", "OCColumnProxyInt", "id"] {
            let err = validate_table_name(name).expect_err("reserved table name should fail");
            assert!(matches!(
                err,
                SchemaError::InvalidIdentifier { kind: "table", .. }
            ));
        }
        assert!(validate_table_name("Queries").is_ok());
        assert!(validate_table_name("TableOfContents").is_ok());
    }

    #[test]
    fn test_reserved_column_names() {
        for name in [
            "ndx", "or", "group", "parent", "findAll", "where", "add", "lastObject", "int",
            "return", "self",
        ] {
            let err = validate_column_name(name).expect_err("reserved column name should fail");
            assert!(matches!(
                err,
                SchemaError::InvalidIdentifier { kind: "column", .. }
            ));
        }
        assert!(validate_column_name("Group").is_ok());
        assert!(validate_column_name("index").is_ok());
        assert!(validate_column_name("value").is_ok());
    }

    #[test]
    fn test_keyword_reason() {
        let err = validate_column_name("while").expect_err("keyword should fail");
        assert!(err.to_string().contains("keyword"));
        let err = validate_column_name("findAll").expect_err("selector should fail");
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_columns_differing_in_first_letter_case_are_duplicates() {
        let err = TableSchema::builder("T")
            .column("age", TypeTag::Int)
            .column("Age", TypeTag::Int)
            .build()
            .expect_err("age and Age should collide");
        assert!(matches!(
            err,
            SchemaError::DuplicateColumn { ref column, .. } if column == "Age"
        ));
    }

    #[test]
    fn test_columns_differing_past_first_letter_are_distinct() {
        let schema = TableSchema::builder("T")
            .column("aGE", TypeTag::Int)
            .column("age", TypeTag::Int)
            .build()
            .expect("Failed to build table with distinct columns");
        assert_eq!(schema.width(), 2);
    }

    #[test]
    fn test_invalid_identifier_reports_kind() {
        let err = validate_table_name("bad_name").expect_err("underscore should be rejected");
        assert!(err.to_string().contains("invalid table name 'bad_name'"));
    }
}
