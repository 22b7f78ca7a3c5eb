use thiserror::Error;

/// Failure classes of a reconciliation run.
///
/// Every variant aborts the surrounding import transaction, so a caller
/// seeing any of these knows no rows from the run were kept and a retry
/// is safe.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Input that can never import: empty labels, unknown survey ids,
    /// malformed external payloads.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A storage uniqueness violation that is not an expected duplicate.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The registry could not be read. Nothing was written locally.
    #[error("external source unavailable: {0}")]
    ExternalFetch(String),

    /// Storage failure mid-import; the transaction rolled back.
    #[error("import failed, no changes made: {0}")]
    Transaction(#[from] sqlx::Error),
}

impl ImportError {
    /// Stable machine-readable code for each failure class
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::Validation(_) => "validation",
            ImportError::Conflict(_) => "conflict",
            ImportError::ExternalFetch(_) => "external_fetch",
            ImportError::Transaction(_) => "transaction",
        }
    }

    /// Classify a storage error from an insert. Genuine uniqueness
    /// violations become [`ImportError::Conflict`], everything else is
    /// a transaction failure.
    pub fn from_insert(context: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            if db.is_unique_violation() {
                return ImportError::Conflict(format!("{context}: {}", db.message()));
            }
        }
        ImportError::Transaction(err)
    }

    /// Name the tree element that owned the bad input, so a failure in a
    /// multi-element walk points at the element to fix. Non-validation
    /// variants already name the failing statement and pass through.
    pub fn owned_by(self, role: &str, id: &str) -> Self {
        match self {
            ImportError::Validation(msg) => {
                ImportError::Validation(format!("{role} '{id}': {msg}"))
            }
            other => other,
        }
    }
}
