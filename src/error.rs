use thiserror::Error;

use crate::codec::CodecError;
use crate::RewriteError;

/// Unified error type of the widget entry point, covering decoding of the
/// stored conditions and their rewrite.
///
/// Returned by [`ProductsList::conditions()`](crate::ProductsList::conditions).
#[derive(Debug, Error)]
pub enum VcatError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}
