use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors raised by the codec and the transports.
///
/// None of these cross [`crate::clients::Resolver::query`]; the resolver turns
/// them into a [`crate::Response`] carrying an error string.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("timed out waiting for {0}")]
    Timeout(SocketAddr),

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid domain name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("connection to {0} closed without a reply")]
    EmptyReply(SocketAddr),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returns early with an [`io::Error`] of the given kind.
#[macro_export]
macro_rules! bail {
    ($kind:ident, $($arg:tt)*) => {{
        return Err(std::io::Error::new(
            std::io::ErrorKind::$kind,
            format!($($arg)*),
        ).into());
    }}
}
