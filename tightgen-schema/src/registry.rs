//! Read-only registry of the storage types the generator may emit.
//!
//! The registry is built once at start-up and passed by reference to the
//! emitter. Lookups for a tag outside the registered set fail instead of
//! falling back to a default type.

use crate::error::SchemaError;
use crate::schema::TableSchema;
use crate::types::{Aggregate, CapabilitySet, TypeTag, ValueTypeDescriptor};
use std::collections::BTreeMap;

/// Generation facts for one registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    /// The type tag.
    pub tag: TypeTag,
    /// Supported query operations.
    pub capabilities: CapabilitySet,
    /// Value types used in the generated API.
    pub value_type: ValueTypeDescriptor,
}

impl RegistryEntry {
    fn for_tag(tag: TypeTag) -> Self {
        Self {
            tag,
            capabilities: tag.capabilities(),
            value_type: tag.value_type(),
        }
    }
}

/// Registry of the types a storage engine supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    entries: BTreeMap<TypeTag, RegistryEntry>,
}

impl TypeRegistry {
    /// Creates a registry holding every [`TypeTag`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_tags(TypeTag::ALL)
    }

    /// Creates a registry restricted to the given tags.
    ///
    /// Useful for engines that only implement part of the type set; schemas
    /// using any other tag are rejected.
    #[must_use]
    pub fn with_tags(tags: impl IntoIterator<Item = TypeTag>) -> Self {
        let entries = tags
            .into_iter()
            .map(|tag| (tag, RegistryEntry::for_tag(tag)))
            .collect();
        Self { entries }
    }

    /// Returns true if the tag is registered.
    #[must_use]
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Returns the number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no tag is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the registered entries in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// Returns the registry entry for a tag.
    ///
    /// # Errors
    /// Returns `SchemaError::UnregisteredType` if the tag is not registered.
    pub fn entry(&self, tag: TypeTag) -> Result<&RegistryEntry, SchemaError> {
        self.entries
            .get(&tag)
            .ok_or_else(|| SchemaError::UnregisteredType {
                type_name: tag.name().to_string(),
            })
    }

    /// Returns the capability set of a tag.
    ///
    /// # Errors
    /// Returns `SchemaError::UnregisteredType` if the tag is not registered.
    pub fn capabilities_of(&self, tag: TypeTag) -> Result<CapabilitySet, SchemaError> {
        self.entry(tag).map(|entry| entry.capabilities)
    }

    /// Returns the value types of a tag.
    ///
    /// # Errors
    /// Returns `SchemaError::UnregisteredType` if the tag is not registered.
    pub fn value_type_of(&self, tag: TypeTag) -> Result<ValueTypeDescriptor, SchemaError> {
        self.entry(tag).map(|entry| entry.value_type)
    }

    /// Returns the engine method-name fragment of a tag.
    ///
    /// # Errors
    /// Returns `SchemaError::UnregisteredType` if the tag is not registered.
    pub fn method_fragment_of(&self, tag: TypeTag) -> Result<&'static str, SchemaError> {
        self.entry(tag).map(|entry| entry.value_type.method)
    }

    /// Returns the result type of an aggregate over a tag, or `None` when
    /// the tag does not support it.
    ///
    /// # Errors
    /// Returns `SchemaError::UnregisteredType` if the tag is not registered.
    pub fn aggregate_result_type(
        &self,
        tag: TypeTag,
        aggregate: Aggregate,
    ) -> Result<Option<&'static str>, SchemaError> {
        self.entry(tag)
            .map(|entry| entry.tag.aggregate_result_type(aggregate))
    }

    /// Resolves an external type spelling for a column.
    ///
    /// # Errors
    /// Returns `SchemaError::UnknownType` naming the table and column if the
    /// spelling is not a known tag or the tag is not registered.
    pub fn resolve(
        &self,
        type_name: &str,
        table: &str,
        column: &str,
    ) -> Result<TypeTag, SchemaError> {
        TypeTag::from_name(type_name)
            .filter(|tag| self.contains(*tag))
            .ok_or_else(|| SchemaError::unknown_type(table, column, type_name))
    }

    /// Checks that every column of a schema uses a registered tag.
    ///
    /// # Errors
    /// Returns `SchemaError::UnknownType` for the first column whose tag is
    /// not registered.
    pub fn check_schema(&self, schema: &TableSchema) -> Result<(), SchemaError> {
        for column in schema.columns() {
            if !self.contains(column.type_tag()) {
                return Err(SchemaError::unknown_type(
                    schema.name(),
                    column.name(),
                    column.type_tag().name(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
