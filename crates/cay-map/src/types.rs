//! Column types and the object-level value types they map to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// JDBC-style SQL column type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlType {
    Array,
    Bigint,
    Binary,
    Bit,
    Blob,
    Boolean,
    Char,
    Clob,
    Date,
    Decimal,
    Double,
    Float,
    Integer,
    Longvarchar,
    Longvarbinary,
    Numeric,
    Real,
    Smallint,
    Tinyint,
    Time,
    Timestamp,
    Varbinary,
    Varchar,
    Other,
    Null,
}

const ALL_SQL_TYPES: [SqlType; 25] = [
    SqlType::Array,
    SqlType::Bigint,
    SqlType::Binary,
    SqlType::Bit,
    SqlType::Blob,
    SqlType::Boolean,
    SqlType::Char,
    SqlType::Clob,
    SqlType::Date,
    SqlType::Decimal,
    SqlType::Double,
    SqlType::Float,
    SqlType::Integer,
    SqlType::Longvarchar,
    SqlType::Longvarbinary,
    SqlType::Numeric,
    SqlType::Real,
    SqlType::Smallint,
    SqlType::Tinyint,
    SqlType::Time,
    SqlType::Timestamp,
    SqlType::Varbinary,
    SqlType::Varchar,
    SqlType::Other,
    SqlType::Null,
];

impl SqlType {
    /// Upper-case SQL name, e.g. `"VARCHAR"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Array => "ARRAY",
            Self::Bigint => "BIGINT",
            Self::Binary => "BINARY",
            Self::Bit => "BIT",
            Self::Blob => "BLOB",
            Self::Boolean => "BOOLEAN",
            Self::Char => "CHAR",
            Self::Clob => "CLOB",
            Self::Date => "DATE",
            Self::Decimal => "DECIMAL",
            Self::Double => "DOUBLE",
            Self::Float => "FLOAT",
            Self::Integer => "INTEGER",
            Self::Longvarchar => "LONGVARCHAR",
            Self::Longvarbinary => "LONGVARBINARY",
            Self::Numeric => "NUMERIC",
            Self::Real => "REAL",
            Self::Smallint => "SMALLINT",
            Self::Tinyint => "TINYINT",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Varbinary => "VARBINARY",
            Self::Varchar => "VARCHAR",
            Self::Other => "OTHER",
            Self::Null => "NULL",
        }
    }

    /// Parse a SQL type name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_SQL_TYPES
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Object-level type of a mapped attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Long,
    Integer,
    Short,
    Byte,
    Boolean,
    Float,
    Double,
    Decimal,
    String,
    Date,
    Bytes,
}

impl ValueType {
    /// The value type a column of `sql_type` maps to, if any.
    ///
    /// `ARRAY`, `OTHER` and `NULL` columns have no default mapping.
    pub fn for_sql_type(sql_type: SqlType) -> Option<Self> {
        let mapped = match sql_type {
            SqlType::Bigint => Self::Long,
            SqlType::Binary
            | SqlType::Blob
            | SqlType::Longvarbinary
            | SqlType::Varbinary => Self::Bytes,
            SqlType::Bit | SqlType::Boolean => Self::Boolean,
            SqlType::Clob | SqlType::Char | SqlType::Longvarchar | SqlType::Varchar => Self::String,
            SqlType::Date | SqlType::Time | SqlType::Timestamp => Self::Date,
            SqlType::Decimal | SqlType::Numeric => Self::Decimal,
            SqlType::Double => Self::Double,
            SqlType::Float | SqlType::Real => Self::Float,
            SqlType::Integer => Self::Integer,
            SqlType::Smallint | SqlType::Tinyint => Self::Short,
            SqlType::Array | SqlType::Other | SqlType::Null => return None,
        };
        Some(mapped)
    }

    /// Name of the boxed form, e.g. `"Integer"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Long => "Long",
            Self::Integer => "Integer",
            Self::Short => "Short",
            Self::Byte => "Byte",
            Self::Boolean => "Boolean",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::Date => "Date",
            Self::Bytes => "Bytes",
        }
    }

    /// Name of the non-nullable primitive form, if the type has one.
    pub fn primitive_name(&self) -> Option<&'static str> {
        match self {
            Self::Long => Some("long"),
            Self::Integer => Some("int"),
            Self::Short => Some("short"),
            Self::Byte => Some("byte"),
            Self::Boolean => Some("boolean"),
            Self::Float => Some("float"),
            Self::Double => Some("double"),
            Self::Decimal | Self::String | Self::Date | Self::Bytes => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_names_roundtrip() {
        for t in ALL_SQL_TYPES {
            assert_eq!(SqlType::from_name(t.name()), Some(t));
        }
        assert_eq!(SqlType::from_name("varchar"), Some(SqlType::Varchar));
        assert_eq!(SqlType::from_name("JSONB"), None);
    }

    #[test]
    fn serde_uses_sql_names() {
        let json = serde_json::to_string(&SqlType::Longvarchar).unwrap();
        assert_eq!(json, "\"LONGVARCHAR\"");
    }

    #[test]
    fn column_type_mapping() {
        assert_eq!(ValueType::for_sql_type(SqlType::Varchar), Some(ValueType::String));
        assert_eq!(ValueType::for_sql_type(SqlType::Bigint), Some(ValueType::Long));
        assert_eq!(ValueType::for_sql_type(SqlType::Tinyint), Some(ValueType::Short));
        assert_eq!(ValueType::for_sql_type(SqlType::Timestamp), Some(ValueType::Date));
        assert_eq!(ValueType::for_sql_type(SqlType::Numeric), Some(ValueType::Decimal));
        assert_eq!(ValueType::for_sql_type(SqlType::Other), None);
    }

    #[test]
    fn primitives_only_for_numeric_and_boolean() {
        assert_eq!(ValueType::Integer.primitive_name(), Some("int"));
        assert_eq!(ValueType::Boolean.primitive_name(), Some("boolean"));
        assert_eq!(ValueType::String.primitive_name(), None);
        assert_eq!(ValueType::Decimal.primitive_name(), None);
    }
}
