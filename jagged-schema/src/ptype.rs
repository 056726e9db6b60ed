use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use arrow_buffer::ArrowNativeType;
use half::f16;
use jagged_error::{JaggedError, JaggedResult, jagged_err};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Physical type of the values held by a primitive node.
///
/// The names match the ones used in serialized schemas, e.g. `"int64"`, `"float32"` or
/// `"datetime64[ns]"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PType {
    /// One byte per value, zero is `false`.
    Bool,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// IEEE 754 half precision float.
    F16,
    /// IEEE 754 single precision float.
    F32,
    /// IEEE 754 double precision float.
    F64,
    /// Timestamp, stored as a signed 64-bit count of `TimeUnit`s.
    DateTime64(TimeUnit),
    /// Duration, stored as a signed 64-bit count of `TimeUnit`s.
    TimeDelta64(TimeUnit),
}

/// The unit counted by a temporal type, written as the bracketed suffix of its name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    /// No unit, written without a suffix.
    #[default]
    Generic,
    /// Years.
    Years,
    /// Months.
    Months,
    /// Weeks.
    Weeks,
    /// Days.
    Days,
    /// Hours.
    Hours,
    /// Minutes.
    Minutes,
    /// Seconds.
    Seconds,
    /// Milliseconds.
    Milliseconds,
    /// Microseconds.
    Microseconds,
    /// Nanoseconds.
    Nanoseconds,
    /// Picoseconds.
    Picoseconds,
    /// Femtoseconds.
    Femtoseconds,
    /// Attoseconds.
    Attoseconds,
}

impl TimeUnit {
    const ALL: [TimeUnit; 14] = [
        TimeUnit::Generic,
        TimeUnit::Years,
        TimeUnit::Months,
        TimeUnit::Weeks,
        TimeUnit::Days,
        TimeUnit::Hours,
        TimeUnit::Minutes,
        TimeUnit::Seconds,
        TimeUnit::Milliseconds,
        TimeUnit::Microseconds,
        TimeUnit::Nanoseconds,
        TimeUnit::Picoseconds,
        TimeUnit::Femtoseconds,
        TimeUnit::Attoseconds,
    ];

    /// The code of this unit inside the brackets, empty for [`TimeUnit::Generic`].
    pub const fn code(self) -> &'static str {
        match self {
            TimeUnit::Generic => "",
            TimeUnit::Years => "Y",
            TimeUnit::Months => "M",
            TimeUnit::Weeks => "W",
            TimeUnit::Days => "D",
            TimeUnit::Hours => "h",
            TimeUnit::Minutes => "m",
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Picoseconds => "ps",
            TimeUnit::Femtoseconds => "fs",
            TimeUnit::Attoseconds => "as",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = JaggedError;

    fn from_str(s: &str) -> JaggedResult<Self> {
        TimeUnit::ALL
            .into_iter()
            .filter(|unit| *unit != TimeUnit::Generic)
            .find(|unit| unit.code() == s)
            .ok_or_else(|| jagged_err!("unknown time unit: {s}"))
    }
}

/// A Rust type that can back the values of a primitive node.
pub trait NativePType:
    ArrowNativeType + Send + Sync + Copy + Debug + Default + PartialEq + PartialOrd + 'static
{
    /// The storage [`PType`] of this Rust type.
    const PTYPE: PType;
}

macro_rules! native_ptype {
    ($T:ty, $ptype:tt) => {
        impl NativePType for $T {
            const PTYPE: PType = PType::$ptype;
        }
    };
}

native_ptype!(u8, U8);
native_ptype!(u16, U16);
native_ptype!(u32, U32);
native_ptype!(u64, U64);
native_ptype!(i8, I8);
native_ptype!(i16, I16);
native_ptype!(i32, I32);
native_ptype!(i64, I64);
native_ptype!(f16, F16);
native_ptype!(f32, F32);
native_ptype!(f64, F64);

/// Dispatch on the storage type of a [`PType`], binding `$T` to the native Rust type.
#[macro_export]
macro_rules! match_each_native_ptype {
    ($self:expr, | $_:tt $enc:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $enc:ident ) => ( $($body)* )}
        use $crate::PType;
        use $crate::half::f16;
        match $self.storage() {
            PType::I8 => __with__! { i8 },
            PType::I16 => __with__! { i16 },
            PType::I32 => __with__! { i32 },
            PType::I64 => __with__! { i64 },
            PType::U8 => __with__! { u8 },
            PType::U16 => __with__! { u16 },
            PType::U32 => __with__! { u32 },
            PType::U64 => __with__! { u64 },
            PType::F16 => __with__! { f16 },
            PType::F32 => __with__! { f32 },
            PType::F64 => __with__! { f64 },
            PType::Bool | PType::DateTime64(_) | PType::TimeDelta64(_) => {
                unreachable!("storage types are always native")
            }
        }
    })
}

impl PType {
    /// All primitive types, in declaration order, with temporal types in their generic unit.
    pub const ALL: [PType; 14] = [
        PType::Bool,
        PType::I8,
        PType::I16,
        PType::I32,
        PType::I64,
        PType::U8,
        PType::U16,
        PType::U32,
        PType::U64,
        PType::F16,
        PType::F32,
        PType::F64,
        PType::DateTime64(TimeUnit::Generic),
        PType::TimeDelta64(TimeUnit::Generic),
    ];

    /// The native type the values are stored as.
    pub const fn storage(self) -> PType {
        match self {
            PType::Bool => PType::U8,
            PType::DateTime64(_) | PType::TimeDelta64(_) => PType::I64,
            other => other,
        }
    }

    /// Width of a single value in bytes.
    pub fn byte_width(self) -> usize {
        match_each_native_ptype!(self, |$T| size_of::<$T>())
    }

    /// The unit of a temporal type.
    pub const fn time_unit(self) -> Option<TimeUnit> {
        match self {
            PType::DateTime64(unit) | PType::TimeDelta64(unit) => Some(unit),
            _ => None,
        }
    }

    /// The serialized name of this type, without the unit of a temporal type.
    pub const fn name(self) -> &'static str {
        match self {
            PType::Bool => "bool",
            PType::I8 => "int8",
            PType::I16 => "int16",
            PType::I32 => "int32",
            PType::I64 => "int64",
            PType::U8 => "uint8",
            PType::U16 => "uint16",
            PType::U32 => "uint32",
            PType::U64 => "uint64",
            PType::F16 => "float16",
            PType::F32 => "float32",
            PType::F64 => "float64",
            PType::DateTime64(_) => "datetime64",
            PType::TimeDelta64(_) => "timedelta64",
        }
    }
}

impl Display for PType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.time_unit() {
            Some(unit) if unit != TimeUnit::Generic => write!(f, "{}[{}]", self.name(), unit.code()),
            _ => f.write_str(self.name()),
        }
    }
}

impl FromStr for PType {
    type Err = JaggedError;

    fn from_str(s: &str) -> JaggedResult<Self> {
        let (name, unit) = match s.strip_suffix(']').and_then(|s| s.split_once('[')) {
            Some((name, unit)) => (name, Some(unit)),
            None => (s, None),
        };
        let ptype = PType::ALL
            .into_iter()
            .find(|ptype| ptype.name() == name)
            .ok_or_else(|| jagged_err!("unknown primitive type: {s}"))?;
        match (ptype, unit) {
            (_, None) => Ok(ptype),
            (PType::DateTime64(_), Some(unit)) => Ok(PType::DateTime64(unit.parse()?)),
            (PType::TimeDelta64(_), Some(unit)) => Ok(PType::TimeDelta64(unit.parse()?)),
            (_, Some(_)) => Err(jagged_err!("{name} does not take a unit: {s}")),
        }
    }
}

impl Serialize for PType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(PType::Bool, 1)]
    #[case(PType::I16, 2)]
    #[case(PType::U32, 4)]
    #[case(PType::F16, 2)]
    #[case(PType::F64, 8)]
    #[case(PType::DateTime64(TimeUnit::Nanoseconds), 8)]
    fn byte_width(#[case] ptype: PType, #[case] width: usize) {
        assert_eq!(ptype.byte_width(), width);
    }

    #[test]
    fn names_round_trip() {
        for ptype in PType::ALL {
            assert_eq!(ptype.name().parse::<PType>().unwrap(), ptype);
            assert_eq!(
                serde_json::to_string(&ptype).unwrap(),
                format!("\"{}\"", ptype.name())
            );
        }
        assert!("int128".parse::<PType>().is_err());
    }

    #[rstest]
    #[case("datetime64[ns]", PType::DateTime64(TimeUnit::Nanoseconds))]
    #[case("datetime64[D]", PType::DateTime64(TimeUnit::Days))]
    #[case("timedelta64[us]", PType::TimeDelta64(TimeUnit::Microseconds))]
    #[case("timedelta64[M]", PType::TimeDelta64(TimeUnit::Months))]
    #[case("timedelta64", PType::TimeDelta64(TimeUnit::Generic))]
    fn temporal_units(#[case] name: &str, #[case] ptype: PType) {
        assert_eq!(name.parse::<PType>().unwrap(), ptype);
        assert_eq!(ptype.to_string(), name);
        assert_eq!(serde_json::to_string(&ptype).unwrap(), format!("\"{name}\""));
        assert_eq!(serde_json::from_str::<PType>(&format!("\"{name}\"")).unwrap(), ptype);
        assert_eq!(ptype.storage(), PType::I64);
    }

    #[rstest]
    #[case("datetime64[ly]")]
    #[case("datetime64[]")]
    #[case("int64[ns]")]
    #[case("timedelta64[ns")]
    fn bad_units(#[case] name: &str) {
        assert!(name.parse::<PType>().is_err());
        assert!(serde_json::from_str::<PType>(&format!("\"{name}\"")).is_err());
    }

    #[test]
    fn storage() {
        assert_eq!(PType::Bool.storage(), u8::PTYPE);
        assert_eq!(PType::TimeDelta64(TimeUnit::Generic).storage(), i64::PTYPE);
        assert_eq!(PType::F32.storage(), PType::F32);
        assert_eq!(PType::DateTime64(TimeUnit::Seconds).time_unit(), Some(TimeUnit::Seconds));
        assert_eq!(PType::I64.time_unit(), None);
    }
}
