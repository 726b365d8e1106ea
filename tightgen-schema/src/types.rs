//! Storage type tags and their generation facts.
//!
//! Every fact in this module is a pure function of the [`TypeTag`]: the
//! query operations a column of that type supports, the value types used
//! in the generated accessor API, and the method-name fragment used to
//! call the storage engine. Nothing here can be overridden per column.

use std::fmt;

/// Storage type of a column.
///
/// The set is closed; a schema that names any other type fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// Signed 64-bit integer.
    Int,
    /// Boolean.
    Bool,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// UTF-8 string.
    String,
    /// Opaque byte blob.
    Binary,
    /// Point in time.
    Date,
    /// 128-bit decimal.
    Decimal128,
    /// 12-byte object identifier.
    ObjectId,
    /// RFC 4122 UUID.
    Uuid,
    /// Dynamically typed value.
    Mixed,
    /// Nested table of another generated type.
    Table,
}

impl TypeTag {
    /// Every tag, in declaration order.
    pub const ALL: [TypeTag; 12] = [
        Self::Int,
        Self::Bool,
        Self::Float,
        Self::Double,
        Self::String,
        Self::Binary,
        Self::Date,
        Self::Decimal128,
        Self::ObjectId,
        Self::Uuid,
        Self::Mixed,
        Self::Table,
    ];

    /// Returns the canonical spelling of the tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::Bool => "Bool",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::Binary => "Binary",
            Self::Date => "Date",
            Self::Decimal128 => "Decimal128",
            Self::ObjectId => "ObjectId",
            Self::Uuid => "Uuid",
            Self::Mixed => "Mixed",
            Self::Table => "Table",
        }
    }

    /// Parses a tag from its external spelling.
    ///
    /// Accepts the canonical names plus the aliases `Any` (for `Mixed`) and
    /// `UUID`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Any" => Some(Self::Mixed),
            "UUID" => Some(Self::Uuid),
            _ => Self::ALL.into_iter().find(|tag| tag.name() == name),
        }
    }

    /// Returns the capability set of the tag.
    #[must_use]
    pub const fn capabilities(&self) -> CapabilitySet {
        use Aggregate::*;
        use Predicate::*;

        const NUMERIC: &[Predicate] = &[Equal, NotEqual, Greater, Less, Between];
        const MATCHING: &[Predicate] = &[Equal, NotEqual, BeginsWith, EndsWith, Contains];
        const IDENTITY: &[Predicate] = &[Equal, NotEqual];
        const ALL_AGGREGATES: &[Aggregate] = &[Minimum, Maximum, Sum, Average];

        match self {
            Self::Int | Self::Float | Self::Double | Self::Decimal128 => {
                CapabilitySet::new(NUMERIC, ALL_AGGREGATES, false, true)
            }
            Self::Bool => CapabilitySet::new(&[Equal], &[], false, true),
            Self::String => CapabilitySet::new(MATCHING, &[], true, true),
            Self::Binary => CapabilitySet::new(MATCHING, &[], false, true),
            Self::Date => CapabilitySet::new(NUMERIC, &[Minimum, Maximum], false, true),
            Self::ObjectId => CapabilitySet::new(NUMERIC, &[], false, true),
            Self::Uuid => CapabilitySet::new(IDENTITY, &[], false, true),
            Self::Mixed => CapabilitySet::new(IDENTITY, &[], false, false),
            Self::Table => CapabilitySet::new(&[], &[], false, false),
        }
    }

    /// Returns the value types used for the tag in the Objective-C binding.
    #[must_use]
    pub const fn value_type(&self) -> ValueTypeDescriptor {
        match self {
            Self::Int => {
                ValueTypeDescriptor::new("int64_t", "NSNumber *", "COLUMN_TYPE_INT", "Int")
            }
            Self::Bool => {
                ValueTypeDescriptor::new("BOOL", "NSNumber *", "COLUMN_TYPE_BOOL", "Bool")
            }
            Self::Float => {
                ValueTypeDescriptor::new("float", "NSNumber *", "COLUMN_TYPE_FLOAT", "Float")
            }
            Self::Double => {
                ValueTypeDescriptor::new("double", "NSNumber *", "COLUMN_TYPE_DOUBLE", "Double")
            }
            Self::String => {
                ValueTypeDescriptor::new("NSString *", "NSString *", "COLUMN_TYPE_STRING", "String")
            }
            Self::Binary => {
                ValueTypeDescriptor::new("NSData *", "NSData *", "COLUMN_TYPE_BINARY", "Binary")
            }
            Self::Date => {
                ValueTypeDescriptor::new("NSDate *", "NSDate *", "COLUMN_TYPE_DATE", "Date")
            }
            Self::Decimal128 => ValueTypeDescriptor::new(
                "OCDecimal128 *",
                "OCDecimal128 *",
                "COLUMN_TYPE_DECIMAL",
                "Decimal",
            ),
            Self::ObjectId => ValueTypeDescriptor::new(
                "OCObjectId *",
                "OCObjectId *",
                "COLUMN_TYPE_OBJECT_ID",
                "ObjectId",
            ),
            Self::Uuid => {
                ValueTypeDescriptor::new("NSUUID *", "NSUUID *", "COLUMN_TYPE_UUID", "UUID")
            }
            Self::Mixed => {
                ValueTypeDescriptor::new("OCMixed *", "OCMixed *", "COLUMN_TYPE_MIXED", "Mixed")
            }
            Self::Table => {
                ValueTypeDescriptor::new("Table *", "Table *", "COLUMN_TYPE_TABLE", "Subtable")
            }
        }
    }

    /// Returns the result type of an aggregate over a column of this tag,
    /// or `None` when the tag does not support the aggregate.
    #[must_use]
    pub fn aggregate_result_type(&self, aggregate: Aggregate) -> Option<&'static str> {
        if !self.capabilities().aggregates.contains(&aggregate) {
            return None;
        }
        let native = self.value_type().native;
        let widened = match self {
            Self::Int => match aggregate {
                Aggregate::Average => "double",
                _ => native,
            },
            Self::Float => match aggregate {
                Aggregate::Sum | Aggregate::Average => "double",
                _ => native,
            },
            _ => native,
        };
        Some(widened)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row predicate a query accessor can build for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Predicate {
    /// Value equals the operand.
    Equal,
    /// Value differs from the operand.
    NotEqual,
    /// Value is strictly greater than the operand.
    Greater,
    /// Value is strictly less than the operand.
    Less,
    /// Value lies in the closed range `[from, to]`.
    Between,
    /// Value starts with the operand.
    BeginsWith,
    /// Value ends with the operand.
    EndsWith,
    /// Value contains the operand.
    Contains,
}

impl Predicate {
    /// Every predicate, in declaration order.
    pub const ALL: [Predicate; 8] = [
        Self::Equal,
        Self::NotEqual,
        Self::Greater,
        Self::Less,
        Self::Between,
        Self::BeginsWith,
        Self::EndsWith,
        Self::Contains,
    ];

    /// Returns the method name used in the generated API.
    #[must_use]
    pub const fn method_name(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::Greater => "greater",
            Self::Less => "less",
            Self::Between => "between",
            Self::BeginsWith => "beginsWith",
            Self::EndsWith => "endsWith",
            Self::Contains => "contains",
        }
    }

    /// Returns how many operands the predicate takes.
    #[must_use]
    pub const fn arity(&self) -> usize {
        match self {
            Self::Between => 2,
            _ => 1,
        }
    }

    /// Returns the shape name templates dispatch on: `range` for two
    /// operands, `match` for substring predicates, `compare` otherwise.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Between => "range",
            Self::BeginsWith | Self::EndsWith | Self::Contains => "match",
            _ => "compare",
        }
    }
}

/// Aggregate function over the rows matched by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Aggregate {
    /// Smallest value.
    Minimum,
    /// Largest value.
    Maximum,
    /// Sum of values.
    Sum,
    /// Arithmetic mean.
    Average,
}

impl Aggregate {
    /// Returns the method name used in the generated API.
    #[must_use]
    pub const fn method_name(&self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Sum => "sum",
            Self::Average => "average",
        }
    }

    /// Returns the short name used by the storage engine (`min`, `max`,
    /// `sum`, `avg`).
    #[must_use]
    pub const fn engine_name(&self) -> &'static str {
        match self {
            Self::Minimum => "min",
            Self::Maximum => "max",
            Self::Sum => "sum",
            Self::Average => "avg",
        }
    }
}

/// Query and storage capabilities of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet {
    /// Predicates a query accessor exposes, in emission order.
    pub predicates: &'static [Predicate],
    /// Aggregates a query exposes, in emission order.
    pub aggregates: &'static [Aggregate],
    /// Whether predicates take a case-sensitivity flag.
    pub case_sensitive_match: bool,
    /// Whether a column of this type may be declared optional.
    pub optional_capable: bool,
}

impl CapabilitySet {
    const fn new(
        predicates: &'static [Predicate],
        aggregates: &'static [Aggregate],
        case_sensitive_match: bool,
        optional_capable: bool,
    ) -> Self {
        Self {
            predicates,
            aggregates,
            case_sensitive_match,
            optional_capable,
        }
    }

    /// Returns true if the predicate is supported.
    #[must_use]
    pub fn supports(&self, predicate: Predicate) -> bool {
        self.predicates.contains(&predicate)
    }

    /// Returns true if the aggregate is supported.
    #[must_use]
    pub fn supports_aggregate(&self, aggregate: Aggregate) -> bool {
        self.aggregates.contains(&aggregate)
    }

    /// Returns true if values can be tested for equality.
    #[must_use]
    pub fn supports_equality(&self) -> bool {
        self.supports(Predicate::Equal)
    }

    /// Returns true if values can be ordered.
    #[must_use]
    pub fn supports_ordering(&self) -> bool {
        self.supports(Predicate::Greater) && self.supports(Predicate::Less)
    }

    /// Returns true if values can be searched for substrings.
    #[must_use]
    pub fn supports_substring_match(&self) -> bool {
        self.supports(Predicate::Contains)
    }

    /// Returns true if minimum and maximum are available.
    #[must_use]
    pub fn supports_min_max(&self) -> bool {
        self.supports_aggregate(Aggregate::Minimum) && self.supports_aggregate(Aggregate::Maximum)
    }

    /// Returns true if sum is available.
    #[must_use]
    pub fn supports_sum(&self) -> bool {
        self.supports_aggregate(Aggregate::Sum)
    }

    /// Returns true if average is available.
    #[must_use]
    pub fn supports_average(&self) -> bool {
        self.supports_aggregate(Aggregate::Average)
    }

    /// Returns true if columns of the type may be optional.
    #[must_use]
    pub const fn is_optional_capable(&self) -> bool {
        self.optional_capable
    }
}

/// Value types used for a tag in the generated API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueTypeDescriptor {
    /// Type of getter results and setter arguments.
    pub native: &'static str,
    /// Type used when the column is optional; accepts `nil`.
    pub nullable: &'static str,
    /// Storage engine column type constant.
    pub type_id: &'static str,
    /// Fragment spliced into engine method names (`getInt`, `insertInt:`).
    pub method: &'static str,
}

impl ValueTypeDescriptor {
    const fn new(
        native: &'static str,
        nullable: &'static str,
        type_id: &'static str,
        method: &'static str,
    ) -> Self {
        Self {
            native,
            nullable,
            type_id,
            method,
        }
    }
}
