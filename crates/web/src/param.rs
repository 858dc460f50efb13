//! Typed handler parameters.
//!
//! A handler declares its parameters through its argument types: each argument type
//! implements [`FromParam`], which names the [`ParamKind`] parser used to convert the raw
//! request value and whether the argument is nullable (`Option<T>`). The binder produces a
//! [`ParamValue`] per parameter and the handler turns the positional values back into its
//! argument tuple through [`FromParams`].

use std::fmt;

/// The closed set of parsers a raw request value can be converted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Char,
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Str,
}

/// A converted request value, or `Absent` for a nullable parameter that was not supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Char(char),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Absent,
}

/// Name and type of one declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub nullable: bool,
}

impl ParamSpec {
    pub fn new(name: &'static str, kind: ParamKind, nullable: bool) -> Self {
        Self { name, kind, nullable }
    }
}

impl ParamKind {
    /// Converts `raw` with the parser of this kind, `None` when it is not a valid value.
    ///
    /// Surrounding whitespace is ignored except for strings, which are taken verbatim.
    /// Booleans accept `true` and `false` in any letter case.
    pub fn parse(self, raw: &str) -> Option<ParamValue> {
        let trimmed = raw.trim();
        let value = match self {
            ParamKind::Bool => {
                if trimmed.eq_ignore_ascii_case("true") {
                    ParamValue::Bool(true)
                } else if trimmed.eq_ignore_ascii_case("false") {
                    ParamValue::Bool(false)
                } else {
                    return None;
                }
            }
            ParamKind::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => ParamValue::Char(c),
                    _ => return None,
                }
            }
            ParamKind::I32 => ParamValue::I32(trimmed.parse().ok()?),
            ParamKind::I64 => ParamValue::I64(trimmed.parse().ok()?),
            ParamKind::U32 => ParamValue::U32(trimmed.parse().ok()?),
            ParamKind::U64 => ParamValue::U64(trimmed.parse().ok()?),
            ParamKind::F32 => ParamValue::F32(trimmed.parse().ok()?),
            ParamKind::F64 => ParamValue::F64(trimmed.parse().ok()?),
            ParamKind::Str => ParamValue::Str(raw.to_owned()),
        };
        Some(value)
    }

    /// Human readable name used in conversion error messages.
    pub fn description(self) -> &'static str {
        match self {
            ParamKind::Bool => "boolean",
            ParamKind::Char => "character",
            ParamKind::I32 | ParamKind::I64 => "integer",
            ParamKind::U32 | ParamKind::U64 => "non-negative integer",
            ParamKind::F32 | ParamKind::F64 => "number",
            ParamKind::Str => "string",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A type a single handler argument can be bound to.
pub trait FromParam: Sized + Send + 'static {
    const KIND: ParamKind;
    const NULLABLE: bool;

    /// Converts a bound value, `None` when the value does not belong to this type.
    fn from_param(value: ParamValue) -> Option<Self>;
}

macro_rules! impl_from_param {
    ($ty:ty, $kind:ident) => {
        impl FromParam for $ty {
            const KIND: ParamKind = ParamKind::$kind;
            const NULLABLE: bool = false;

            fn from_param(value: ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$kind(value) => Some(value),
                    _ => None,
                }
            }
        }

        impl FromParam for Option<$ty> {
            const KIND: ParamKind = ParamKind::$kind;
            const NULLABLE: bool = true;

            fn from_param(value: ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$kind(value) => Some(Some(value)),
                    ParamValue::Absent => Some(None),
                    _ => None,
                }
            }
        }
    };
}

impl_from_param!(bool, Bool);
impl_from_param!(char, Char);
impl_from_param!(i32, I32);
impl_from_param!(i64, I64);
impl_from_param!(u32, U32);
impl_from_param!(u64, U64);
impl_from_param!(f32, F32);
impl_from_param!(f64, F64);
impl_from_param!(String, Str);

/// The argument tuple of a handler, built from positional bound values.
pub trait FromParams: Sized + Send + 'static {
    /// Kind and nullability of each argument, in declaration order.
    fn kinds() -> Vec<(ParamKind, bool)>;

    /// `None` when the values do not match [`FromParams::kinds`].
    fn from_params(values: Vec<ParamValue>) -> Option<Self>;
}

/// impl `FromParams` for tuples, from 0 to 12 elements
macro_rules! impl_from_params_for_tuple ({ $($param:ident)* } => {
    impl<$($param,)*> FromParams for ($($param,)*)
    where
        $($param: FromParam,)*
    {
        fn kinds() -> Vec<(ParamKind, bool)> {
            vec![$(($param::KIND, $param::NULLABLE),)*]
        }

        #[allow(unused_mut, unused_variables, non_snake_case)]
        fn from_params(values: Vec<ParamValue>) -> Option<Self> {
            if values.len() != Self::kinds().len() {
                return None;
            }
            let mut values = values.into_iter();
            Some(($($param::from_param(values.next()?)?,)*))
        }
    }
});

impl_from_params_for_tuple! {}
impl_from_params_for_tuple! { A }
impl_from_params_for_tuple! { A B }
impl_from_params_for_tuple! { A B C }
impl_from_params_for_tuple! { A B C D }
impl_from_params_for_tuple! { A B C D E }
impl_from_params_for_tuple! { A B C D E F }
impl_from_params_for_tuple! { A B C D E F G }
impl_from_params_for_tuple! { A B C D E F G H }
impl_from_params_for_tuple! { A B C D E F G H I }
impl_from_params_for_tuple! { A B C D E F G H I J }
impl_from_params_for_tuple! { A B C D E F G H I J K }
impl_from_params_for_tuple! { A B C D E F G H I J K L }
