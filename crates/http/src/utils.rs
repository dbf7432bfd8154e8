//! Internal helpers shared by the codec.

/// Returns `Err($error)` from the enclosing function unless `$predicate` holds.
///
/// The decoders use it for limit checks, where a failed check ends decoding
/// with a typed [`ParseError`](crate::protocol::ParseError) instead of a panic.
///
/// ```ignore
/// ensure!(length <= max_body_size, ParseError::too_large_body(length, max_body_size));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
