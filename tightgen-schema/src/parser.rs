//! XML schema parser.
//!
//! This module parses table definitions of the form
//!
//! ```xml
//! <tables>
//!   <table name="Child">
//!     <column name="Name" type="String"/>
//!   </table>
//!   <table name="Person">
//!     <column name="Name" type="String"/>
//!     <column name="Age" type="Int" optional="true"/>
//!     <column name="Kids" type="Table" table="Child"/>
//!   </table>
//! </tables>
//! ```
//!
//! into a [`SchemaSet`]. Column types are resolved against a
//! [`TypeRegistry`], so a type the registry does not hold fails here.

use crate::error::{ParseError, SchemaError};
use crate::registry::TypeRegistry;
use crate::schema::{ColumnDecl, SchemaSet, TableSchema, TableSchemaBuilder};
use crate::types::TypeTag;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parses an XML table schema from a string.
///
/// # Arguments
/// * `xml` - XML schema content
/// * `registry` - Registry used to resolve column types
///
/// # Returns
/// The tables in document order.
///
/// # Errors
/// Returns `SchemaError::Parse` if the XML is malformed or contains
/// unexpected elements, and the validation errors of
/// [`TableSchemaBuilder::build`] and [`SchemaSet::push`] for the tables.
pub fn parse_schema_set(xml: &str, registry: &TypeRegistry) -> Result<SchemaSet, SchemaError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut set: Option<SchemaSet> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes).map_err(ParseError::from)?;
                match name {
                    "tables" if set.is_none() => set = Some(SchemaSet::new()),
                    "table" if set.is_some() => {
                        let table = parse_table(&mut reader, e, registry)?;
                        if let Some(set) = set.as_mut() {
                            set.push(table)?;
                        }
                    }
                    other => {
                        return Err(ParseError::unknown_element(other, "document").into());
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes).map_err(ParseError::from)?;
                match name {
                    "tables" if set.is_none() => set = Some(SchemaSet::new()),
                    "table" if set.is_some() => {
                        let table_name = required_attr(e, "table", "name")?;
                        return Err(SchemaError::EmptySchema { table: table_name });
                    }
                    other => {
                        return Err(ParseError::unknown_element(other, "document").into());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e).into()),
            _ => {}
        }
        buf.clear();
    }

    let set = set.ok_or_else(|| ParseError::InvalidStructure {
        message: "No tables element found".to_string(),
    })?;
    tracing::debug!("Parsed XML schema with {} tables", set.len());
    Ok(set)
}

/// Parses one `<table>` element up to and including its end tag.
fn parse_table(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    registry: &TypeRegistry,
) -> Result<TableSchema, SchemaError> {
    let table_name = required_attr(start, "table", "name")?;
    let mut builder = TableSchemaBuilder::new(table_name.clone());
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes).map_err(ParseError::from)?;
                if name != "column" {
                    return Err(ParseError::unknown_element(name, "table").into());
                }
                builder.push(parse_column(e, &table_name, registry)?);
            }
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes).map_err(ParseError::from)?;
                if name != "column" {
                    return Err(ParseError::unknown_element(name, "table").into());
                }
                builder.push(parse_column(e, &table_name, registry)?);
                skip_to_end(reader, "column")?;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"table" => break,
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure {
                    message: format!("unterminated table '{table_name}'"),
                }
                .into());
            }
            Err(e) => return Err(ParseError::Xml(e).into()),
            _ => {}
        }
        buf.clear();
    }

    builder.build()
}

/// Parses the attributes of a `<column>` element.
fn parse_column(
    e: &BytesStart<'_>,
    table: &str,
    registry: &TypeRegistry,
) -> Result<ColumnDecl, SchemaError> {
    let mut name = None;
    let mut type_name = None;
    let mut optional = false;
    let mut subtable = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(ParseError::from)?;
        let value = std::str::from_utf8(&attr.value).map_err(ParseError::from)?;

        match key {
            "name" => name = Some(value.to_string()),
            "type" => type_name = Some(value.to_string()),
            "optional" => {
                optional = match value {
                    "true" => true,
                    "false" => false,
                    _ => return Err(ParseError::invalid_attr("column", "optional", value).into()),
                }
            }
            "table" => subtable = Some(value.to_string()),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("column", "name"))?;
    let type_name = type_name.ok_or_else(|| ParseError::missing_attr("column", "type"))?;
    let type_tag = registry.resolve(&type_name, table, &name)?;

    if type_tag == TypeTag::Table && subtable.is_none() {
        return Err(ParseError::missing_attr("column", "table").into());
    }

    Ok(ColumnDecl {
        name,
        type_tag,
        optional,
        subtable,
    })
}

fn required_attr(e: &BytesStart<'_>, element: &str, attribute: &str) -> Result<String, ParseError> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == attribute.as_bytes() {
            return Ok(std::str::from_utf8(&attr.value)?.to_string());
        }
    }
    Err(ParseError::missing_attr(element, attribute))
}

fn skip_to_end(reader: &mut Reader<&[u8]>, element: &str) -> Result<(), ParseError> {
    let mut buf = Vec::new();
    let mut depth = 1;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure {
                    message: format!("unterminated {element}"),
                });
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }
}
