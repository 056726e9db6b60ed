#![deny(missing_docs)]

//! Error handling for the jagged crates.
//!
//! Every error carries a captured [`ErrBacktrace`]. Construct errors with [`jagged_err!`], return
//! them early with [`jagged_bail!`], and reserve [`jagged_panic!`] for broken internal invariants
//! in code paths that cannot return a [`JaggedResult`].

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// A string that is either borrowed for `'static` or owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A backtrace captured where an error was constructed.
///
/// Error variants must not hold a bare [`Backtrace`]: `thiserror` wires such fields into the
/// unstable `provide` API on nightly toolchains.
pub struct ErrBacktrace(Backtrace);

impl ErrBacktrace {
    /// Capture a backtrace of the current thread, if enabled by the environment.
    #[inline]
    pub fn capture() -> Self {
        Self(Backtrace::capture())
    }

    /// The captured backtrace.
    pub fn backtrace(&self) -> &Backtrace {
        &self.0
    }
}

impl Display for ErrBacktrace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for ErrBacktrace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

/// The top-level error type.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum JaggedError {
    /// A layout node cannot be reconciled against the schema node at the same position.
    #[error("schema mismatch: {0}\nBacktrace:\n{1}")]
    SchemaMismatch(ErrString, ErrBacktrace),
    /// A union schema has no alternative compatible with an incoming non-union layout.
    #[error("unresolved union: {0}\nBacktrace:\n{1}")]
    UnresolvedUnion(ErrString, ErrBacktrace),
    /// An internal invariant was violated.
    #[error("assertion violated: {0}\nBacktrace:\n{1}")]
    AssertionViolation(ErrString, ErrBacktrace),
    /// The values of a placeholder buffer were requested.
    #[error("placeholder access: {0}\nBacktrace:\n{1}")]
    PlaceholderAccess(ErrString, ErrBacktrace),
    /// An argument was rejected.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, ErrBacktrace),
    /// An index was outside of the half-open range `start..stop`.
    #[error("index {0} out of bounds from {1} to {2}\nBacktrace:\n{3}")]
    OutOfBounds(usize, usize, usize, ErrBacktrace),
    /// A JSON (de)serialization failure.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    /// An error wrapped with additional context.
    #[error("{0}: {1}")]
    Context(ErrString, Box<JaggedError>),
}

impl JaggedError {
    /// Wrap this error with a context message.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        JaggedError::Context(msg.into(), Box::new(self))
    }

    /// The error with all context layers removed.
    pub fn root(&self) -> &JaggedError {
        match self {
            JaggedError::Context(_, inner) => inner.root(),
            other => other,
        }
    }

    /// Whether the root cause is a [`JaggedError::SchemaMismatch`] or one of its sub-cases.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self.root(),
            JaggedError::SchemaMismatch(..) | JaggedError::UnresolvedUnion(..)
        )
    }
}

impl Debug for JaggedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for results that return a [`JaggedError`].
pub type JaggedResult<T> = Result<T, JaggedError>;

/// A replacement for `expect` that panics with a [`JaggedError`] carrying the message.
pub trait JaggedExpect {
    /// The type of the value being unwrapped.
    type Output;

    /// Either return the value or panic with `msg`.
    fn jagged_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> JaggedExpect for Result<T, E>
where
    E: Into<JaggedError>,
{
    type Output = T;

    #[inline(always)]
    fn jagged_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|err| {
            let err: JaggedError = err.into();
            panic_with(err.with_context(msg.to_string()))
        })
    }
}

impl<T> JaggedExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn jagged_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            panic_with(JaggedError::AssertionViolation(
                msg.to_string().into(),
                ErrBacktrace::capture(),
            ))
        })
    }
}

/// A replacement for `unwrap` that panics with the underlying [`JaggedError`].
pub trait JaggedUnwrap {
    /// The type of the value being unwrapped.
    type Output;

    /// Either return the value or panic.
    fn jagged_unwrap(self) -> Self::Output;
}

impl<T, E> JaggedUnwrap for Result<T, E>
where
    E: Into<JaggedError>,
{
    type Output = T;

    #[inline(always)]
    fn jagged_unwrap(self) -> Self::Output {
        self.unwrap_or_else(|err| panic_with(err.into()))
    }
}

/// Panic with the given error. Used by [`jagged_panic!`].
#[cold]
#[inline(never)]
#[allow(clippy::panic)]
pub fn panic_with(err: JaggedError) -> ! {
    panic!("{}", err)
}

/// Construct a [`JaggedError`], by default an [`JaggedError::InvalidArgument`].
#[macro_export]
macro_rules! jagged_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        $crate::JaggedError::OutOfBounds($idx, $start, $stop, $crate::ErrBacktrace::capture())
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        $crate::JaggedError::$variant(
            format!($fmt $(, $arg)*).into(),
            $crate::ErrBacktrace::capture(),
        )
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::jagged_err!(InvalidArgument: $fmt $(, $arg)*)
    };
}

/// Return early with a [`JaggedError`] built by [`jagged_err!`].
#[macro_export]
macro_rules! jagged_bail {
    ($($tt:tt)+) => {
        return Err($crate::jagged_err!($($tt)+))
    };
}

/// Panic with a [`JaggedError`], by default an [`JaggedError::AssertionViolation`].
#[macro_export]
macro_rules! jagged_panic {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::panic_with($crate::jagged_err!($variant: $fmt $(, $arg)*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::jagged_panic!(AssertionViolation: $fmt $(, $arg)*)
    };
}
