//! Source-level types

use std::fmt;

/// µC type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    /// Signed 32-bit integer
    Int,
    /// Unsigned 8-bit character
    Char,
    /// Array of `element`; `size` is `None` for a decayed array parameter
    Array { element: Box<Type>, size: Option<usize> },
    Function { return_type: Box<Type>, params: Vec<Type> },
}

impl Type {
    pub fn array_of(element: Type, size: Option<usize>) -> Self {
        Type::Array {
            element: Box::new(element),
            size,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// `int` or `char`
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Int | Type::Char)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Known element count of an array type
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Type::Array { size, .. } => *size,
            _ => None,
        }
    }

    /// Storage size in bytes; a decayed array occupies one address word
    pub fn size(&self) -> usize {
        match self {
            Type::Void | Type::Function { .. } => 0,
            Type::Int => 4,
            Type::Char => 1,
            Type::Array { element, size: Some(n) } => element.size() * n,
            Type::Array { size: None, .. } => 4,
        }
    }

    /// Whether a value of type `self` may be stored into a `target` location.
    /// Scalars convert freely; arrays never do.
    pub fn assignable_to(&self, target: &Type) -> bool {
        self.is_scalar() && target.is_scalar()
    }

    /// Whether an argument of type `self` may be passed for a parameter of type `param`
    pub fn passable_to(&self, param: &Type) -> bool {
        match (self, param) {
            (Type::Array { element: a, .. }, Type::Array { element: p, .. }) => a == p,
            _ => self.assignable_to(param),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int => write!(f, "int"),
            Type::Char => write!(f, "char"),
            Type::Array { element, size: Some(n) } => write!(f, "{}[{}]", element, n),
            Type::Array { element, size: None } => write!(f, "{}[]", element),
            Type::Function { return_type, params } => {
                write!(f, "{}(", return_type)?;
                if params.is_empty() {
                    write!(f, "void")?;
                }
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ")")
            }
        }
    }
}
