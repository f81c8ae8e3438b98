//! sqlx error mapping.

use std::fmt::Display;

use domain::RepositoryError;

pub(crate) fn db_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::backend(err)
}

/// Maps write failures, turning unique violations into `Duplicate`.
pub(crate) fn write_error(
    err: sqlx::Error,
    entity: &'static str,
    id: impl Display,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let constraint = db_err.constraint().unwrap_or_default();
        return if constraint.ends_with("_pkey") {
            RepositoryError::Duplicate {
                entity,
                field: "id",
                value: id.to_string(),
            }
        } else {
            RepositoryError::Duplicate {
                entity,
                field: "unique key",
                value: constraint.to_string(),
            }
        };
    }
    db_error(err)
}
