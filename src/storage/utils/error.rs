// Boxing of inner errors into context-carrying variants
use crate::error::Error;

/// Errors that can become the boxed `source` of a context variant.
pub trait IntoSyncError {
    fn into_error(self) -> Error;
}

impl IntoSyncError for Error {
    fn into_error(self) -> Error {
        self
    }
}

impl IntoSyncError for std::io::Error {
    fn into_error(self) -> Error {
        self.into()
    }
}

/// Map the error of a `Result` into `Error::$variant { .., source: Box<Error> }`.
///
/// `wrap_err!(store.list_objects(prefix).await, ListingFailed { prefix: prefix.to_string() })?`
#[macro_export]
macro_rules! wrap_err {
    ($expr:expr, $variant:ident { $($field:ident : $value:expr),* $(,)? }) => {{
        $expr.map_err(|e| {
            let source = $crate::storage::utils::error::IntoSyncError::into_error(e);
            $crate::error::Error::$variant { $($field: $value,)* source: Box::new(source) }
        })
    }};
}
