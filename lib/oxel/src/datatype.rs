//! Typed literals and datatype restrictions `f.(op, v)`.

use oxsdatatypes::{Boolean, Date, Double, Float, Integer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Comparison operator of a datatype restriction.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub enum Operator {
    Equals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equals => "=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
        })
    }
}

/// A typed literal value.
///
/// Equality and hashing are structural (two `NaN` doubles are the same literal),
/// ordering between values is only defined for literals of the same type.
#[derive(Debug, Clone)]
pub enum Literal {
    Boolean(Boolean),
    Date(Date),
    Double(Double),
    Float(Float),
    Integer(Integer),
    Long(Integer),
    String(String),
}

impl Literal {
    /// Compares two values of the same type.
    pub fn partial_cmp_value(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => a.partial_cmp(b),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Integer(b)) | (Self::Long(a), Self::Long(b)) => {
                Some(a.cmp(b))
            }
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Is `<`, `>`, `<=` and `>=` meaningful for this type?
    pub fn is_ordered(&self) -> bool {
        !matches!(self, Self::Boolean(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::Double(_) => "double",
            Self::Float(_) => "float",
            Self::Integer(_) => "integer",
            Self::Long(_) => "long",
            Self::String(_) => "string",
        }
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a.is_identical_with(*b),
            (Self::Float(a), Self::Float(b)) => a.is_identical_with(*b),
            (Self::Integer(a), Self::Integer(b)) | (Self::Long(a), Self::Long(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Boolean(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
            Self::Double(v) => v.to_be_bytes().hash(state),
            Self::Float(v) => v.to_be_bytes().hash(state),
            Self::Integer(v) | Self::Long(v) => v.hash(state),
            Self::String(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Integer(v) | Self::Long(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for Literal {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Boolean(value.into())
    }
}

impl From<f64> for Literal {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Double(value.into())
    }
}

impl From<f32> for Literal {
    #[inline]
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}

impl From<i32> for Literal {
    #[inline]
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for Literal {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Long(value.into())
    }
}

impl From<Date> for Literal {
    #[inline]
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl From<&str> for Literal {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Literal {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// The `(op, v)` part of a datatype restriction.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Datatype {
    pub operator: Operator,
    pub value: Literal,
}

impl Datatype {
    #[inline]
    pub fn new(operator: Operator, value: impl Into<Literal>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }

    /// Does every value satisfying `self` also satisfy `other`?
    ///
    /// Values are considered dense: `< 5` does not entail `<= 4` even for integers.
    pub fn entails(&self, other: &Self) -> bool {
        let Some(order) = self.value.partial_cmp_value(&other.value) else {
            return false;
        };
        let (le, lt, ge, gt) = (
            order.is_le(),
            order.is_lt(),
            order.is_ge(),
            order.is_gt(),
        );
        match (self.operator, other.operator) {
            (Operator::Equals, Operator::Equals) => order.is_eq(),
            (Operator::Equals, Operator::LessThan) => lt,
            (Operator::Equals, Operator::LessThanOrEqual) => le,
            (Operator::Equals, Operator::GreaterThan) => gt,
            (Operator::Equals, Operator::GreaterThanOrEqual) => ge,
            (Operator::LessThan, Operator::LessThan | Operator::LessThanOrEqual)
            | (Operator::LessThanOrEqual, Operator::LessThanOrEqual) => le,
            (Operator::LessThanOrEqual, Operator::LessThan) => lt,
            (Operator::GreaterThan, Operator::GreaterThan | Operator::GreaterThanOrEqual)
            | (Operator::GreaterThanOrEqual, Operator::GreaterThanOrEqual) => ge,
            (Operator::GreaterThanOrEqual, Operator::GreaterThan) => gt,
            (
                Operator::LessThan | Operator::LessThanOrEqual,
                Operator::Equals | Operator::GreaterThan | Operator::GreaterThanOrEqual,
            )
            | (
                Operator::GreaterThan | Operator::GreaterThanOrEqual,
                Operator::Equals | Operator::LessThan | Operator::LessThanOrEqual,
            ) => false,
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.value)
    }
}
