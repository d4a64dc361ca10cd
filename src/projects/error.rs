use thiserror::Error;

/// Failures a screen can surface to the user, plus the storage bucket the
/// view-model logs and swallows.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("another project named \"{0}\" already exists")]
    DuplicateName(String),

    #[error("project name must not be empty")]
    EmptyName,

    #[error("log work sessions before requesting an invoice")]
    NothingToInvoice,

    #[error("amount was already invoiced")]
    AlreadyInvoiced,

    #[error("project {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
