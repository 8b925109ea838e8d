//! Serializable predicate AST and the builder used to construct it.
//!
//! ```
//! use tessera::query::{path, Value};
//!
//! let predicate = path("Post.Title").eq("Hello") & !path("IsDeleted").eq(true);
//! let empty: Vec<Value> = Vec::new();
//! let either = path("Username").is_in(empty) | path("IsEnabled").eq(true);
//! # let _ = (predicate, either);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::value::{Record, Value};

/// A dotted property path relative to some entity, e.g. `Post.Author.Username`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    pub fn parse(path: &str) -> Self {
        PropertyPath(
            path.split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        PropertyPath(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment: the property the path ends at.
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// All segments but the last.
    pub fn parent(&self) -> PropertyPath {
        PropertyPath(self.0[..self.0.len().saturating_sub(1)].to_vec())
    }

    pub fn join(&self, other: &PropertyPath) -> PropertyPath {
        PropertyPath(self.0.iter().chain(other.0.iter()).cloned().collect())
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for PropertyPath {
    fn from(path: &str) -> Self {
        PropertyPath::parse(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "like",
        }
    }

    /// The operator matching exactly the rows this one rejects, among non-null rows.
    pub fn negate(&self) -> Option<CompareOp> {
        match self {
            CompareOp::Eq => Some(CompareOp::Ne),
            CompareOp::Ne => Some(CompareOp::Eq),
            CompareOp::Lt => Some(CompareOp::Ge),
            CompareOp::Le => Some(CompareOp::Gt),
            CompareOp::Gt => Some(CompareOp::Le),
            CompareOp::Ge => Some(CompareOp::Lt),
            CompareOp::Like => None,
        }
    }

    /// The operator to use when the operands swap sides.
    pub fn flip(&self) -> CompareOp {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            other => *other,
        }
    }
}

/// Boolean (and operand) expression over the properties of one root entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// Membership of a property value in a literal list
    In {
        path: PropertyPath,
        values: Vec<Value>,
    },
    /// True when some element of a one-to-many collection satisfies `predicate`
    /// (or exists at all when there is no predicate). The predicate is relative to
    /// the child entity.
    Any {
        collection: PropertyPath,
        predicate: Option<Box<Expr>>,
    },
    PathRef(PropertyPath),
    Literal(Value),
}

/// A property path operand.
pub fn path(path: &str) -> Expr {
    Expr::PathRef(PropertyPath::parse(path))
}

/// A literal operand.
pub fn literal(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    fn compare(self, op: CompareOp, right: impl Into<Expr>) -> Expr {
        Expr::Compare {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    pub fn eq(self, right: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Eq, right)
    }

    pub fn ne(self, right: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Ne, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Lt, right)
    }

    pub fn le(self, right: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Le, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Gt, right)
    }

    pub fn ge(self, right: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Ge, right)
    }

    pub fn is_null(self) -> Expr {
        self.compare(CompareOp::Eq, Expr::Literal(Value::Null))
    }

    pub fn is_not_null(self) -> Expr {
        self.compare(CompareOp::Ne, Expr::Literal(Value::Null))
    }

    /// `like` with a caller-supplied pattern; wildcards are not escaped.
    pub fn like(self, pattern: &str) -> Expr {
        self.compare(CompareOp::Like, pattern)
    }

    pub fn contains(self, text: &str) -> Expr {
        self.like(&format!("%{}%", text))
    }

    pub fn starts_with(self, text: &str) -> Expr {
        self.like(&format!("{}%", text))
    }

    pub fn ends_with(self, text: &str) -> Expr {
        self.like(&format!("%{}", text))
    }

    /// Membership test. Only valid on a property path; anything else is rejected at
    /// translation time.
    pub fn is_in<I, V>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        match self {
            Expr::PathRef(path) => Expr::In { path, values },
            other => Expr::Compare {
                left: Box::new(other),
                op: CompareOp::Eq,
                right: Box::new(Expr::Literal(Value::Collection(Vec::new()))),
            },
        }
    }

    /// Some element of this collection satisfies `predicate`.
    pub fn any(self, predicate: Expr) -> Expr {
        self.any_inner(Some(predicate))
    }

    /// The collection is not empty.
    pub fn any_exists(self) -> Expr {
        self.any_inner(None)
    }

    fn any_inner(self, predicate: Option<Expr>) -> Expr {
        let collection = match self {
            Expr::PathRef(path) => path,
            _ => PropertyPath(Vec::new()),
        };
        Expr::Any {
            collection,
            predicate: predicate.map(Box::new),
        }
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl std::ops::BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        self.and(rhs)
    }
}

impl std::ops::BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        self.or(rhs)
    }
}

macro_rules! expr_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Expr::Literal(v.into())
                }
            }
        )*
    };
}

expr_from_literal!(
    bool,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    uuid::Uuid,
    chrono::NaiveDateTime,
    Value,
    Record,
);
