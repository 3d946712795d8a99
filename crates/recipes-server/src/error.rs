pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid arguments: {0}")]
    Arguments(#[from] clap::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Database error: {0}")]
    Database(#[from] recipes_dal::Error),

    #[error("Token manager error: {0}")]
    Auth(#[from] recipes_auth::Error),

    #[error("Invalid seed data: {0}")]
    Seed(String),
}
