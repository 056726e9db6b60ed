use std::fmt::{Debug, Formatter};

/// A wrapper around a slice that truncates the debug output if it is too long.
pub(crate) struct TruncatedDebug<'a, T>(pub(crate) &'a [T]);

impl<T: Debug> Debug for TruncatedDebug<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        const TRUNC_SIZE: usize = 16;
        if self.0.len() <= TRUNC_SIZE {
            f.debug_list().entries(self.0).finish()
        } else {
            f.debug_list()
                .entries(&self.0[..TRUNC_SIZE])
                .finish_non_exhaustive()
        }
    }
}
