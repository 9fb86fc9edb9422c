//! Scalar type descriptors for component fields.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scalar type descriptor.
///
/// Every component field is declared with one of these. Integer widths are
/// preserved so values read back from a store can be narrowed to the width
/// the component declares.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// The null type (only value: null). Never a field type.
    Null,
    /// Boolean type.
    Bool,
    /// 8-bit signed integer.
    I8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
    /// UTF-8 text.
    Text,
}

impl Type {
    /// Returns true for any integer width.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Returns true for any float width.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Returns true for integer and float types.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Checks if a value of type `actual` may be compared with or assigned
    /// to a field of this type.
    ///
    /// - Integer fields accept integers of any width
    /// - Float fields accept floats and integers (numeric promotion)
    /// - Everything else must match exactly
    #[must_use]
    pub const fn accepts(self, actual: Type) -> bool {
        match (self, actual) {
            (Self::I8 | Self::I16 | Self::I32 | Self::I64, a) => a.is_integer(),
            (Self::F32 | Self::F64, a) => a.is_numeric(),
            (Self::Null, Self::Null) | (Self::Bool, Self::Bool) | (Self::Text, Self::Text) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
