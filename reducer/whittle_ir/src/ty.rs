//! Value types for the operation graph.
//!
//! Types are semantic classifiers attached to result slots. They are
//! immutable once assigned — a rewrite may reroute *uses* of a value,
//! but never changes the type observed at a use site.
//!
//! The model is deliberately small: scalars plus fixed-length vectors
//! of scalars, which is enough to express every reduction the engine
//! ships with. Vector-ness is the reference "qualifies for erasure"
//! classification used by the poison-substitution rule.

use std::fmt;

/// Scalar element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    I1,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Index,
}

impl ScalarType {
    /// Printed name, matching the textual IR syntax.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::I1 => "i1",
            ScalarType::I8 => "i8",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
            ScalarType::Index => "index",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type of a single result value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// A scalar value.
    Scalar(ScalarType),
    /// A fixed-length vector of scalars, e.g. `vector<4xf32>`.
    Vector { lanes: u32, elem: ScalarType },
}

impl Type {
    /// Returns `true` for vector types.
    ///
    /// This is the reference qualification predicate for poison
    /// substitution: vector-producing operations are the ones replaced
    /// with poison markers of the same type.
    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector { .. })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(s) => write!(f, "{s}"),
            Type::Vector { lanes, elem } => write!(f, "vector<{lanes}x{elem}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ScalarType, Type};

    #[test]
    fn scalar_display() {
        assert_eq!(Type::Scalar(ScalarType::I32).to_string(), "i32");
        assert_eq!(Type::Scalar(ScalarType::Index).to_string(), "index");
    }

    #[test]
    fn vector_display() {
        let ty = Type::Vector {
            lanes: 4,
            elem: ScalarType::F32,
        };
        assert_eq!(ty.to_string(), "vector<4xf32>");
    }

    #[test]
    fn vector_classification() {
        assert!(Type::Vector {
            lanes: 2,
            elem: ScalarType::I64,
        }
        .is_vector());
        assert!(!Type::Scalar(ScalarType::F32).is_vector());
    }

    #[test]
    fn type_equality_is_structural() {
        let a = Type::Vector {
            lanes: 4,
            elem: ScalarType::F32,
        };
        let b = Type::Vector {
            lanes: 4,
            elem: ScalarType::F32,
        };
        let c = Type::Vector {
            lanes: 8,
            elem: ScalarType::F32,
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
