use std::time::Duration;

/// Transport error.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct TransportError<E>(pub E);

/// Error type of this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error<E> {
    /// An outbound transport call failed.
    #[error(transparent)]
    Transport(#[from] TransportError<E>),

    /// The library was used before [initialize](crate::Remote::initialize)
    /// or after [uninitialize](crate::Remote::uninitialize).
    #[error("remote scripting is not initialized")]
    NotInitialized,

    /// A program is already connected.
    #[error("only one program can be controlled at a time, and one is already connected")]
    AlreadyConnected,

    /// No program is connected.
    #[error("no program is connected")]
    NotConnected,

    /// No program connected before the timeout expired.
    #[error("no program connected within {0:?}")]
    ConnectionTimeout(Duration),

    /// The program connected but no thread reached a freeze point before the
    /// timeout expired.
    #[error("connected, but unable to synchronize on a freeze point within {0:?}")]
    FreezeSyncTimeout(Duration),

    /// A remote call got no answer before the timeout expired.
    #[error("no answer to {0} within {1:?}")]
    CallTimeout(String, Duration),

    /// The connection ended while a remote call was waiting for its answer.
    #[error("connection lost while waiting for an answer to {0}")]
    ConnectionLost(String),

    /// A thread name was never reported by the program.
    #[error("the thread '{0}' is unknown")]
    UnknownThread(String),

    /// I/O error (spawning the program, reading a lookup file).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl<E> Error<E> {
    /// Returns whether this error is related to the connection with the
    /// program (missing connection, timeout, or concurrent session).
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyConnected
                | Self::NotConnected
                | Self::ConnectionTimeout(_)
                | Self::FreezeSyncTimeout(_)
                | Self::CallTimeout(..)
                | Self::ConnectionLost(_)
        )
    }
}

/// Result type of this crate.
pub type Result<T, E> = core::result::Result<T, Error<E>>;
