#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entry already registered: {0}")]
    DuplicateName(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Health engine has been shut down")]
    ShutDown,
}
