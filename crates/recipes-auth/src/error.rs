use jsonwebtoken::errors::Error as JwtError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
    #[error("Token secret is too short, at least {0} bytes required")]
    WeakSecret(usize),
}

impl Error {
    /// True when token was correctly signed but is past its expiry
    pub fn is_expired(&self) -> bool {
        matches!(self, Error::JwtError(e) if matches!(e.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature))
    }
}
