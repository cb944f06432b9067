//! IR-level types with size and alignment

use crate::frontend::ast::Type;
use std::fmt;

/// Size in bytes of an `int` and of an address
pub const WORD_SIZE: usize = 4;

/// Type of an IR value or storage location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IrType {
    pub kind: IrTypeKind,
    /// Size in bytes
    pub size: usize,
    /// Alignment in bytes
    pub align: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrTypeKind {
    /// No value
    Void,
    /// Signed 32-bit integer
    I32,
    /// Unsigned 8-bit integer
    U8,
    /// Owned array storage of `len` elements
    Array { element: Box<IrType>, len: usize },
    /// Base address of an array owned elsewhere (a decayed parameter)
    ArrayRef { element: Box<IrType> },
}

impl IrType {
    pub fn void() -> Self {
        Self { kind: IrTypeKind::Void, size: 0, align: 1 }
    }

    pub fn i32() -> Self {
        Self { kind: IrTypeKind::I32, size: WORD_SIZE, align: WORD_SIZE }
    }

    pub fn u8() -> Self {
        Self { kind: IrTypeKind::U8, size: 1, align: 1 }
    }

    /// Array type; the size saturates so oversized arrays can be rejected later
    pub fn array(element: IrType, len: usize) -> Self {
        let size = element.size.saturating_mul(len);
        let align = element.align;
        Self {
            kind: IrTypeKind::Array { element: Box::new(element), len },
            size,
            align,
        }
    }

    pub fn array_ref(element: IrType) -> Self {
        Self {
            kind: IrTypeKind::ArrayRef { element: Box::new(element) },
            size: WORD_SIZE,
            align: WORD_SIZE,
        }
    }

    /// Lower a checked source type. Function types have no IR value form.
    pub fn from_source(ty: &Type) -> Self {
        match ty {
            Type::Void => Self::void(),
            Type::Int => Self::i32(),
            Type::Char => Self::u8(),
            Type::Array { element, size: Some(len) } => Self::array(Self::from_source(element), *len),
            Type::Array { element, size: None } => Self::array_ref(Self::from_source(element)),
            Type::Function { .. } => panic!("internal error: function type has no IR representation"),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, IrTypeKind::Void)
    }

    /// `i32` or `u8`
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, IrTypeKind::I32 | IrTypeKind::U8)
    }

    pub fn is_array_ref(&self) -> bool {
        matches!(self.kind, IrTypeKind::ArrayRef { .. })
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IrTypeKind::Void => write!(f, "void"),
            IrTypeKind::I32 => write!(f, "i32"),
            IrTypeKind::U8 => write!(f, "u8"),
            IrTypeKind::Array { element, len } => write!(f, "[{} x {}]", len, element),
            IrTypeKind::ArrayRef { element } => write!(f, "&[{}]", element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_and_alignment() {
        let chars = IrType::from_source(&Type::array_of(Type::Char, Some(7)));
        assert_eq!((chars.size, chars.align), (7, 1));
        let ints = IrType::from_source(&Type::array_of(Type::Int, Some(8)));
        assert_eq!((ints.size, ints.align), (32, 4));
        let param = IrType::from_source(&Type::array_of(Type::Char, None));
        assert!(param.is_array_ref());
        assert_eq!((param.size, param.align), (WORD_SIZE, WORD_SIZE));
        assert_eq!(param, IrType::array_ref(IrType::u8()));
    }

    #[test]
    fn test_display() {
        assert_eq!(IrType::array(IrType::i32(), 8).to_string(), "[8 x i32]");
        assert_eq!(IrType::array_ref(IrType::u8()).to_string(), "&[u8]");
    }

    #[test]
    fn test_oversized_array_saturates() {
        let huge = IrType::array(IrType::i32(), usize::MAX / 2);
        assert_eq!(huge.size, usize::MAX);
    }
}
