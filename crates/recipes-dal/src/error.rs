pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("User password error: {0}")]
    UserPasswordError(#[from] argon2::password_hash::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("No recipe exists with ID {0}")]
    RecipeNotFound(i64),

    #[error("Record {id} was modified concurrently, expected version {version}")]
    FailedUpdate { id: i64, version: i64 },

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),

    #[error("Invalid credentials")]
    InvalidCredentials,
}
