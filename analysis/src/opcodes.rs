use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::AnalysisError;

/// Primitive operations issued by a CORDIC engine.
///
/// The discriminant is the code an instrumented engine hands to a live
/// [`EventSink`](crate::EventSink); the serialized name is the token that
/// appears in a text trace.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[repr(u16)]
pub enum Op {
    // Bookkeeping, no hardware behind these
    #[strum(serialize = "push_constant")]
    PushConstant = 0x00,
    #[strum(serialize = "pop_value")]
    PopValue = 0x01,
    #[strum(serialize = "assign")]
    Assign = 0x02,

    // Shifts
    #[strum(serialize = "lshift")]
    Lshift = 0x03,
    #[strum(serialize = "rshift")]
    Rshift = 0x04,

    // Arithmetic
    #[strum(serialize = "add")]
    Add = 0x05,
    #[strum(serialize = "sub")]
    Sub = 0x06,
    #[strum(serialize = "mad")]
    Mad = 0x07,
    #[strum(serialize = "mul")]
    Mul = 0x08,
    #[strum(serialize = "sqr")]
    Sqr = 0x09,
    #[strum(serialize = "dad")]
    Dad = 0x0a,
    #[strum(serialize = "div")]
    Div = 0x0b,
    #[strum(serialize = "one_over")]
    OneOver = 0x0c,
    #[strum(serialize = "sqrt")]
    Sqrt = 0x0d,
    #[strum(serialize = "one_over_sqrt")]
    OneOverSqrt = 0x0e,

    // Exponentials and logarithms
    #[strum(serialize = "exp")]
    Exp = 0x0f,
    #[strum(serialize = "pow")]
    Pow = 0x10,
    #[strum(serialize = "powc")]
    Powc = 0x11,
    #[strum(serialize = "pow2")]
    Pow2 = 0x12,
    #[strum(serialize = "pow10")]
    Pow10 = 0x13,
    #[strum(serialize = "log")]
    Log = 0x14,
    #[strum(serialize = "logb")]
    Logb = 0x15,
    #[strum(serialize = "logc")]
    Logc = 0x16,
    #[strum(serialize = "log2")]
    Log2 = 0x17,
    #[strum(serialize = "log10")]
    Log10 = 0x18,

    // Trigonometric
    #[strum(serialize = "sin")]
    Sin = 0x19,
    #[strum(serialize = "cos")]
    Cos = 0x1a,
    #[strum(serialize = "sincos")]
    Sincos = 0x1b,
    #[strum(serialize = "tan")]
    Tan = 0x1c,
    #[strum(serialize = "asin")]
    Asin = 0x1d,
    #[strum(serialize = "acos")]
    Acos = 0x1e,
    #[strum(serialize = "atan")]
    Atan = 0x1f,
    #[strum(serialize = "atan2")]
    Atan2 = 0x20,

    // Coordinate conversions
    #[strum(serialize = "polar_to_rect")]
    PolarToRect = 0x21,
    #[strum(serialize = "rect_to_polar")]
    RectToPolar = 0x22,
    #[strum(serialize = "norm")]
    Norm = 0x23,
    #[strum(serialize = "normh")]
    Normh = 0x24,

    // Hyperbolic
    #[strum(serialize = "sinh")]
    Sinh = 0x25,
    #[strum(serialize = "cosh")]
    Cosh = 0x26,
    #[strum(serialize = "sinhcosh")]
    Sinhcosh = 0x27,
    #[strum(serialize = "tanh")]
    Tanh = 0x28,
    #[strum(serialize = "asinh")]
    Asinh = 0x29,
    #[strum(serialize = "acosh")]
    Acosh = 0x2a,
    #[strum(serialize = "atanh")]
    Atanh = 0x2b,
    #[strum(serialize = "atanh2")]
    Atanh2 = 0x2c,
}

impl Op {
    /// Resolves a raw operation code handed over by a live engine.
    pub fn from_code(code: u16) -> Result<Self, AnalysisError> {
        Self::try_from(code).map_err(|_| AnalysisError::UnknownOperation(format!("0x{code:x}")))
    }

    /// The token naming this operation in a text trace.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Position of this operation in an [`OpHistogram`](crate::OpHistogram).
    pub fn index(self) -> usize {
        u16::from(self) as usize
    }

    /// Bookkeeping operations map to no hardware and are left out of cost
    /// reports.
    pub const fn is_free(self) -> bool {
        matches!(self, Op::PushConstant | Op::Assign | Op::PopValue)
    }

    /// Operations producing two results at once.
    pub const fn is_paired(self) -> bool {
        matches!(self, Op::Sincos | Op::Sinhcosh)
    }

    /// Number of pending results an `opN` event of this operation produces.
    pub const fn result_count(self) -> usize {
        match self {
            Op::Assign => 0,
            op if op.is_paired() => 2,
            _ => 1,
        }
    }

    /// Whether operand `slot` is written rather than read, and so is exempt
    /// from the assigned-before-use check.
    pub const fn is_output_slot(self, slot: usize) -> bool {
        match self {
            Op::Assign => slot == 0,
            op if op.is_paired() => slot == 1 || slot == 2,
            _ => false,
        }
    }
}
