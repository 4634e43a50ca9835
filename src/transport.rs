use async_trait::async_trait;
use lettre::Message;

/// Opens authenticated sessions against a mail server.
#[async_trait]
pub trait Transport: Send + Sync {
    type Session: Session;

    /// Connects, upgrades the connection and authenticates. A failure here
    /// leaves nothing open.
    async fn connect(&self) -> Result<Self::Session, SessionError>;
}

/// One authenticated connection. Not shared: the dispatcher owns it for the
/// whole run and sends through it one message at a time.
#[async_trait]
pub trait Session: Send {
    async fn send(&mut self, message: Message) -> Result<(), SendError>;

    /// Ends the session gracefully.
    async fn close(self) -> Result<(), SessionError>;
}

/// Underlying cause reported by a transport implementation.
pub type TransportCause = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("couldn't connect to the mail server {host}:{port}, {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: TransportCause,
    },
    #[error("{host} does not offer STARTTLS")]
    StartTlsUnavailable { host: String },
    #[error("couldn't upgrade the connection to TLS, {0}")]
    Tls(#[source] TransportCause),
    #[error("the mail server rejected the credentials for {username}, {source}")]
    Authentication {
        username: String,
        #[source]
        source: TransportCause,
    },
    #[error("couldn't close the mail session cleanly, {0}")]
    Quit(#[source] TransportCause),
}

#[derive(thiserror::Error, Debug)]
pub enum SendError {
    #[error("the mail server refused the message, {0}")]
    Rejected(#[source] TransportCause),
}
