use std::sync::Arc;

use cyder_tools::log::{debug, error};
use diesel::{Connection, ConnectionError, MysqlConnection, SqliteConnection};

use crate::controller::BaseError;

pub mod maintenance;

pub enum DbType {
    Mysql,
    Sqlite,
}

/// A single, unpooled connection. Dropping it closes the connection.
pub enum DbConnection {
    Mysql(MysqlConnection),
    Sqlite(SqliteConnection),
}

fn parse_db_type(db_url: &str) -> DbType {
    if db_url.starts_with("mysql") {
        DbType::Mysql
    } else {
        DbType::Sqlite
    }
}

impl DbConnection {
    pub fn establish(db_url: &str) -> Result<Self, ConnectionError> {
        match parse_db_type(db_url) {
            DbType::Mysql => MysqlConnection::establish(db_url).map(DbConnection::Mysql),
            DbType::Sqlite => SqliteConnection::establish(db_url).map(DbConnection::Sqlite),
        }
    }
}

/// Storage handle injected into the router state.
///
/// It only knows how to reach the database. Every call to [`Database::run`]
/// opens its own connection on the blocking pool and closes it once the task
/// returns, whatever the outcome.
#[derive(Clone)]
pub struct Database {
    db_url: Arc<str>,
}

impl Database {
    pub fn new(db_url: impl Into<Arc<str>>) -> Self {
        Self {
            db_url: db_url.into(),
        }
    }

    pub async fn run<F, T>(&self, task: F) -> DbResult<T>
    where
        F: FnOnce(&mut DbConnection) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db_url = Arc::clone(&self.db_url);
        let handle = tokio::task::spawn_blocking(move || {
            let mut conn = DbConnection::establish(&db_url).map_err(|e| {
                error!("failed to connect to database: {}", e);
                BaseError::Connection(e.to_string())
            })?;
            let result = task(&mut conn);
            drop(conn);
            debug!("database connection released");
            result
        });

        match handle.await {
            Ok(result) => result,
            // hand the panic back to the request task so the boundary layer reports it
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(BaseError::Internal(err.to_string())),
        }
    }
}

/// Splits diesel failures into the ones raised while building the statement
/// and the ones raised by the server when running it.
pub fn classify_query_error(
    err: diesel::result::Error,
    on_execute: fn(String) -> BaseError,
) -> BaseError {
    match err {
        diesel::result::Error::QueryBuilderError(_)
        | diesel::result::Error::SerializationError(_) => BaseError::Prepare(err.to_string()),
        _ => on_execute(err.to_string()),
    }
}

#[path = "../schema/sqlite.rs"]
pub mod _sqlite_schema;

#[path = "../schema/mysql.rs"]
pub mod _mysql_schema;

#[macro_export]
macro_rules! db_object {
    (
        $(
            $( #[$attr:meta] )*
            pub struct $name:ident {
                $( $( #[$field_attr:meta] )* $vis:vis $field:ident : $typ:ty ),+
                $(,)?
            }
        )+
    ) => {
        $(
            #[derive(Debug, Clone, PartialEq, serde::Serialize)]
            pub struct $name { $( $vis $field : $typ, )+ }
        )+

        pub mod _sqlite_model {
            $( $crate::db_object! { @expand sqlite |  $( #[$attr] )* | $name |  $( $( #[$field_attr] )* $field : $typ ),+ } )+
        }
        pub mod _mysql_model {
            $( $crate::db_object! { @expand mysql |  $( #[$attr] )* | $name |  $( $( #[$field_attr] )* $field : $typ ),+ } )+
        }
    };
    ( @expand $db_type:ident | $( #[$attr:meta] )* | $name:ident | $( $( #[$field_attr:meta] )* $vis:vis $field:ident : $typ:ty),+) => {
        paste::paste! {
            #[allow(unused_imports)] use super::*;
            #[allow(unused_imports)] use crate::database::[<_ $db_type _schema>]::*;
            #[allow(unused_imports)] use diesel::prelude::*;

            $( #[$attr] )*
            pub struct [<$name Db>] { $(
                $( #[$field_attr] )* $vis $field : $typ,
            )+ }

            impl [<$name Db>] {
                #[allow(dead_code)]
                #[inline(always)]
                pub fn from_db(self) -> super::$name {
                    super::$name { $( $field: self.$field, )+ }
                }

                #[allow(dead_code)]
                #[inline(always)]
                pub fn to_db(x: &super::$name) -> Self {
                    Self {
                        $( $field: x.$field.clone(), )+
                    }
                }
            }
        }
    }
}

#[macro_export]
macro_rules! db_execute {
    ($conn:ident, $block:block) => {
        match $conn {
            crate::database::DbConnection::Mysql($conn) => {
                use crate::database::_mysql_schema::*;
                #[allow(unused_imports)]
                use _mysql_model::*;
                #[allow(unused_imports)]
                use diesel::prelude::*;

                $block
            }
            crate::database::DbConnection::Sqlite($conn) => {
                use crate::database::_sqlite_schema::*;
                #[allow(unused_imports)]
                use _sqlite_model::*;
                #[allow(unused_imports)]
                use diesel::prelude::*;

                $block
            }
        }
    };
}

pub type DbResult<T> = Result<T, BaseError>;


#[cfg(test)]
mod tests {
    use diesel::result::Error as DieselError;

    use super::*;

    #[test]
    fn test_statement_building_errors_are_preparation_failures() {
        let err = classify_query_error(
            DieselError::QueryBuilderError("empty filter list".into()),
            BaseError::Insert,
        );
        assert!(matches!(err, BaseError::Prepare(_)));
        assert_eq!(
            err.to_string(),
            "Erro na preparação da consulta: empty filter list"
        );

        let err = classify_query_error(
            DieselError::SerializationError("value out of range".into()),
            BaseError::Query,
        );
        assert!(matches!(err, BaseError::Prepare(_)));
        assert_eq!(
            err.to_string(),
            "Erro na preparação da consulta: value out of range"
        );
    }

    #[test]
    fn test_server_errors_use_the_caller_variant() {
        let err = classify_query_error(DieselError::NotFound, BaseError::Insert);
        assert!(matches!(err, BaseError::Insert(_)));
        assert_eq!(err.to_string(), "Erro ao registrar: Record not found");

        let err = classify_query_error(DieselError::NotFound, BaseError::Query);
        assert!(matches!(err, BaseError::Query(_)));
    }
}
