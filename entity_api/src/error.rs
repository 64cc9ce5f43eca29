//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use sea_orm::{error::DbErr, SqlErr};
use serde::Serialize;

/// Failure of a single store operation. `source` keeps the driver error when
/// there is one; lookups that come back empty carry no source.
#[derive(Debug, PartialEq)]
pub struct Error {
    pub source: Option<DbErr>,
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    /// The requested row does not exist.
    RecordNotFound,
    /// An insert hit a unique index, e.g. a taken user name.
    RecordConflict,
    /// Connection, statement or decoding failure inside the store.
    SystemError,
}

impl Error {
    pub fn not_found() -> Self {
        Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "entity store error ({:?}): {source}", self.error_kind),
            None => write!(f, "entity store error ({:?})", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|err| err as &(dyn StdError + 'static))
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        let error_kind = match &err {
            DbErr::RecordNotFound(_) => EntityApiErrorKind::RecordNotFound,
            _ if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                EntityApiErrorKind::RecordConflict
            }
            _ => EntityApiErrorKind::SystemError,
        };
        Error {
            source: Some(err),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_maps_to_record_not_found_kind() {
        let err: Error = DbErr::RecordNotFound("users".to_string()).into();
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotFound);
    }

    #[test]
    fn connection_errors_map_to_system_error_kind() {
        let err: Error = DbErr::Custom("connection refused".to_string()).into();
        assert_eq!(err.error_kind, EntityApiErrorKind::SystemError);
    }

    #[test]
    fn empty_lookups_have_no_driver_source() {
        let err = Error::not_found();
        assert!(err.source.is_none());
        assert_eq!(err.to_string(), "entity store error (RecordNotFound)");
    }
}
