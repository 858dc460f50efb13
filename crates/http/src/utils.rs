/// Returns early with `Err($error)` when `$predicate` does not hold.
///
/// ```ignore
/// ensure!(consumed <= MAX_HEADER_BYTES, ParseError::head_too_large(consumed, MAX_HEADER_BYTES));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
