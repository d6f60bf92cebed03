//! Column descriptions supplied by the tileset metadata.
//!
//! Parsing the tileset metadata itself happens elsewhere; the decoders only
//! need each column's name, nullability and type, and for struct columns
//! their child fields.

use std::fmt;

/// Scalar property types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Boolean,
    Int8,
    UInt8,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
}

impl ScalarType {
    /// Whether integer values of this type are zigzag coded.
    pub fn is_signed(self) -> bool {
        matches!(self, ScalarType::Int8 | ScalarType::Int32 | ScalarType::Int64)
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Boolean => "BOOLEAN",
            ScalarType::Int8 => "INT_8",
            ScalarType::UInt8 => "UINT_8",
            ScalarType::Int32 => "INT_32",
            ScalarType::UInt32 => "UINT_32",
            ScalarType::Int64 => "INT_64",
            ScalarType::UInt64 => "UINT_64",
            ScalarType::Float => "FLOAT",
            ScalarType::Double => "DOUBLE",
            ScalarType::String => "STRING",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Child of a struct column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub nullable: bool,
    pub field_type: FieldType,
}

/// Type of a struct child
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    Complex(ComplexColumn),
}

impl Field {
    pub fn scalar(name: impl Into<String>, scalar_type: ScalarType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            nullable,
            field_type: FieldType::Scalar(scalar_type),
        }
    }

    /// Optional string leaf, the only child shape a shared dictionary holds.
    pub fn string(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::String, true)
    }

    pub fn is_string(&self) -> bool {
        self.field_type == FieldType::Scalar(ScalarType::String)
    }
}

/// Struct column, e.g. localized names sharing one dictionary
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComplexColumn {
    pub children: Vec<Field>,
}

/// Type of a property column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Scalar(ScalarType),
    Complex(ComplexColumn),
}

/// A property column description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub nullable: bool,
    pub column_type: ColumnType,
}

impl Column {
    pub fn scalar(name: impl Into<String>, scalar_type: ScalarType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            nullable,
            column_type: ColumnType::Scalar(scalar_type),
        }
    }

    /// Struct column whose string children share one dictionary.
    pub fn shared_dictionary(name: impl Into<String>, children: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
            column_type: ColumnType::Complex(ComplexColumn { children }),
        }
    }

    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.column_type {
            ColumnType::Scalar(scalar_type) => Some(scalar_type),
            ColumnType::Complex(_) => None,
        }
    }

    pub fn children(&self) -> &[Field] {
        match &self.column_type {
            ColumnType::Scalar(_) => &[],
            ColumnType::Complex(complex) => &complex.children,
        }
    }

    /// Full name of a struct child: `column:child`, or just the column name
    /// for the child called `default`.
    pub fn child_name(&self, child: &str) -> String {
        if child == "default" {
            self.name.clone()
        } else {
            format!("{}:{}", self.name, child)
        }
    }
}
