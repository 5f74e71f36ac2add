use cobralib_core::Error;

/// Engine-reported statement failures stay `Statement`; transport and
/// handshake failures become `Connection`.
pub(crate) fn map_sqlx_err(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(_)
        | sqlx::Error::RowNotFound
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => Error::Statement(err.to_string()),
        _ => Error::Connection(err.to_string()),
    }
}
