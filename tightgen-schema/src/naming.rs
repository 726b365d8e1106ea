//! Names of generated types.
//!
//! Every generated type name is derived from the table name, the artifact
//! kind and, for query accessors, the column name:
//!
//! | Artifact | Name |
//! |----------|------|
//! | Table | `Person` |
//! | Cursor | `Person_Cursor` |
//! | Query | `Person_Query` |
//! | View | `Person_View` |
//! | QueryAccessor | `Person_QueryAccessor_Name` |
//!
//! Table names never contain `_`, so [`parse_type_name`] inverts
//! [`type_name`] and two distinct inputs can never produce the same name.

use std::fmt;

/// Kind of a generated per-table artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Typed row accessor.
    Cursor,
    /// Typed table.
    Table,
    /// Per-column predicate builder.
    QueryAccessor,
    /// Typed query.
    Query,
    /// Query result view.
    View,
}

impl ArtifactKind {
    /// Every kind, in pipeline order.
    pub const ALL: [ArtifactKind; 5] = [
        Self::Cursor,
        Self::Table,
        Self::QueryAccessor,
        Self::Query,
        Self::View,
    ];

    /// Returns the kind name, which is also the template fragment rendering it.
    #[must_use]
    pub const fn fragment(&self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::Table => "table",
            Self::QueryAccessor => "query_accessor",
            Self::Query => "query",
            Self::View => "view",
        }
    }

    const fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::Table => None,
            Self::Cursor => Some("Cursor"),
            Self::QueryAccessor => Some("QueryAccessor"),
            Self::Query => Some("Query"),
            Self::View => Some("View"),
        }
    }

    /// Returns true if names of this kind carry a column name.
    #[must_use]
    pub const fn is_per_column(&self) -> bool {
        matches!(self, Self::QueryAccessor)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cursor => "Cursor",
            Self::Table => "Table",
            Self::QueryAccessor => "QueryAccessor",
            Self::Query => "Query",
            Self::View => "View",
        };
        f.write_str(name)
    }
}

/// A generated type name split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    /// Table the type belongs to.
    pub table: String,
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Column, for query accessors.
    pub column: Option<String>,
}

/// Derives the type name of an artifact.
///
/// `column` is only used for [`ArtifactKind::QueryAccessor`]; returns
/// `None` if a query accessor is requested without a column.
#[must_use]
pub fn type_name(table: &str, kind: ArtifactKind, column: Option<&str>) -> Option<String> {
    match (kind.suffix(), kind.is_per_column(), column) {
        (None, _, _) => Some(table.to_string()),
        (Some(suffix), true, Some(column)) => Some(format!("{table}_{suffix}_{column}")),
        (Some(_), true, None) => None,
        (Some(suffix), false, _) => Some(format!("{table}_{suffix}")),
    }
}

/// Returns the table type name.
#[must_use]
pub fn table_type(table: &str) -> String {
    table.to_string()
}

/// Returns the cursor type name.
#[must_use]
pub fn cursor_type(table: &str) -> String {
    format!("{table}_Cursor")
}

/// Returns the query type name.
#[must_use]
pub fn query_type(table: &str) -> String {
    format!("{table}_Query")
}

/// Returns the view type name.
#[must_use]
pub fn view_type(table: &str) -> String {
    format!("{table}_View")
}

/// Returns the query accessor type name for a column.
#[must_use]
pub fn query_accessor_type(table: &str, column: &str) -> String {
    format!("{table}_QueryAccessor_{column}")
}

/// Splits a generated type name back into table, kind and column.
///
/// Returns `None` for strings no call to [`type_name`] with a valid table
/// name can produce.
#[must_use]
pub fn parse_type_name(name: &str) -> Option<TypeName> {
    let (table, rest) = match name.split_once('_') {
        Some((table, rest)) => (table, Some(rest)),
        None => (name, None),
    };
    if table.is_empty() {
        return None;
    }

    let (kind, column) = match rest {
        None => (ArtifactKind::Table, None),
        Some("Cursor") => (ArtifactKind::Cursor, None),
        Some("Query") => (ArtifactKind::Query, None),
        Some("View") => (ArtifactKind::View, None),
        Some(rest) => {
            let column = rest.strip_prefix("QueryAccessor_")?;
            if column.is_empty() {
                return None;
            }
            (ArtifactKind::QueryAccessor, Some(column.to_string()))
        }
    };

    Some(TypeName {
        table: table.to_string(),
        kind,
        column,
    })
}

/// Returns the setter selector stem for a column: `Age` → `setAge`,
/// `name` → `setName`.
#[must_use]
pub fn setter_name(column: &str) -> String {
    format!("set{}", capitalize(column))
}

/// Upper-cases the first character of an identifier.
#[must_use]
pub fn capitalize(ident: &str) -> String {
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_type_names() {
        assert_eq!(table_type("Person"), "Person");
        assert_eq!(cursor_type("Person"), "Person_Cursor");
        assert_eq!(query_type("Person"), "Person_Query");
        assert_eq!(view_type("Person"), "Person_View");
        assert_eq!(query_accessor_type("Person", "Age"), "Person_QueryAccessor_Age");
    }

    #[test]
    fn test_type_name_matches_helpers() {
        assert_eq!(
            type_name("Person", ArtifactKind::Cursor, None),
            Some(cursor_type("Person"))
        );
        assert_eq!(
            type_name("Person", ArtifactKind::QueryAccessor, Some("first_name")),
            Some(query_accessor_type("Person", "first_name"))
        );
        assert_eq!(type_name("Person", ArtifactKind::QueryAccessor, None), None);
    }

    #[test]
    fn test_parse_type_name() {
        let parsed = parse_type_name("Person_QueryAccessor_first_name").expect("Failed to parse");
        assert_eq!(parsed.table, "Person");
        assert_eq!(parsed.kind, ArtifactKind::QueryAccessor);
        assert_eq!(parsed.column.as_deref(), Some("first_name"));

        assert_eq!(
            parse_type_name("Person").map(|n| n.kind),
            Some(ArtifactKind::Table)
        );
        assert!(parse_type_name("Person_Cursorx").is_none());
        assert!(parse_type_name("_Cursor").is_none());
        assert!(parse_type_name("Person_QueryAccessor_").is_none());
    }

    #[test]
    fn test_setter_name() {
        assert_eq!(setter_name("Age"), "setAge");
        assert_eq!(setter_name("name"), "setName");
        assert_eq!(setter_name("_x"), "set_x");
    }

    #[test]
    fn test_fragment_names() {
        let fragments: Vec<_> = ArtifactKind::ALL.iter().map(ArtifactKind::fragment).collect();
        assert_eq!(fragments, vec!["cursor", "table", "query_accessor", "query", "view"]);
    }

    fn table_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9]{0,8}"
    }

    fn column_name() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_]{0,8}"
    }

    fn kind() -> impl Strategy<Value = ArtifactKind> {
        prop::sample::select(ArtifactKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_parse_inverts_type_name(
            table in table_name(),
            kind in kind(),
            column in column_name(),
        ) {
            let name = type_name(&table, kind, Some(&column)).expect("Failed to derive name");
            let parsed = parse_type_name(&name).expect("Failed to parse derived name");
            prop_assert_eq!(parsed.table, table);
            prop_assert_eq!(parsed.kind, kind);
            prop_assert_eq!(parsed.column, kind.is_per_column().then_some(column));
        }

        #[test]
        fn prop_distinct_inputs_never_collide(
            a in (table_name(), kind(), column_name()),
            b in (table_name(), kind(), column_name()),
        ) {
            let name_a = type_name(&a.0, a.1, Some(&a.2)).expect("Failed to derive name");
            let name_b = type_name(&b.0, b.1, Some(&b.2)).expect("Failed to derive name");
            let same_input = a.0 == b.0 && a.1 == b.1 && (!a.1.is_per_column() || a.2 == b.2);
            prop_assert_eq!(name_a == name_b, same_input);
        }
    }
}
