pub use num::{NumCast, One, ToPrimitive, Zero};
use std::cmp::PartialEq;
use std::fmt;

pub use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// The element type a `Tensor` was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    U8,
    U32,
    U64,
    U128,
    Usize,
    I8,
    I32,
    I64,
    I128,
    F32,
    F64,
}

impl DType {
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::U8 => "u8",
            DType::U32 => "u32",
            DType::U64 => "u64",
            DType::U128 => "u128",
            DType::Usize => "usize",
            DType::I8 => "i8",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::I128 => "i128",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        write!(f, "{name}")
    }
}

pub trait Numeric:
    Add<Output = Self>
    + AddAssign
    + Copy
    + Clone
    + One
    + Mul<Output = Self>
    + Sub<Output = Self>
    + PartialEq
    + PartialOrd
    + Zero
    + NumCast
    + std::fmt::Debug
    + std::fmt::Display
{
    const DTYPE: DType;
}
// https://stackoverflow.com/questions/42381185/specifying-generic-parameter-to-belong-to-a-small-set-of-types
macro_rules! numeric_impl {
    ($($t: ty => $dtype: ident),+) => {
        $(
            impl Numeric for $t {
                const DTYPE: DType = DType::$dtype;
            }
        )+
    }
}

numeric_impl!(
    usize => Usize,
    u8 => U8,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    i8 => I8,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    f32 => F32,
    f64 => F64
);

#[test]
fn test_dtype_is_float() {
    assert!(f32::DTYPE.is_float());
    assert!(f64::DTYPE.is_float());
    assert!(!i32::DTYPE.is_float());
    assert!(!usize::DTYPE.is_float());
    assert_eq!(format!("{}", i64::DTYPE), "i64");
}
