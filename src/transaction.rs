use libsql::Connection;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use crate::Db;

/// Errors that can occur during transaction management
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("failed to begin transaction")]
    Begin,
    #[error("failed to commit transaction")]
    Commit,
}

/// Execute a function within a database transaction, returning handler-compatible errors.
///
/// The closure must return a boxed future to handle lifetime issues with async closures.
/// Any error rolls the transaction back, so a rejected request leaves the tables untouched.
pub async fn with_transaction<F, T, E>(db: &Db, f: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a Connection) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
    E: From<TransactionError>,
{
    // Exclusive access for the whole transaction
    let conn = db.write().await;

    conn.execute("BEGIN TRANSACTION", ())
        .await
        .map_err(|_| TransactionError::Begin)?;

    match f(&conn).await {
        Ok(result) => match conn.execute("COMMIT", ()).await {
            Ok(_) => Ok(result),
            Err(e) => {
                tracing::error!(error = %e, "commit failed, rolling back");
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(TransactionError::Commit.into())
            }
        },
        Err(e) => {
            let _ = conn.execute("ROLLBACK", ()).await;
            Err(e)
        }
    }
}
