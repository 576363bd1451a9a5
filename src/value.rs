//! Script-facing values and host object handles.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value passed between the script interpreter and host handlers.
///
/// Script functions return one of these to the interpreter; commands return
/// [`Value::Null`]. Numbers are uniformly `f64`, matching the interpreter's
/// numeric model.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value (commands, cancelled calls).
    Null,
    /// Boolean.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Str(String),
}

impl Value {
    /// Boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric payload, if this is a `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Cheap clonable handle to a host object resolved by name.
///
/// Hosts hand these out from their node resolver (see
/// [`DispatchContext`](crate::dispatch::DispatchContext)); handlers get them
/// back as typed arguments and downcast to the concrete type they expect.
#[derive(Clone)]
pub struct NodeRef(Arc<dyn Any + Send + Sync>);

impl NodeRef {
    /// Wrap a host object.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wrap an already-shared host object.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self(value)
    }

    /// Borrow the underlying object as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Clone out the underlying `Arc<T>`, if the object is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).downcast().ok()
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").finish()
    }
}
