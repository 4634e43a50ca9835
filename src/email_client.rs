use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Message,
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{AsyncSmtpConnection, TlsParameters},
        extension::ClientId,
    },
};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    configuration::SmtpSettings,
    transport::{SendError, Session, SessionError, Transport},
};

/// SMTP submission client: plaintext connect, STARTTLS upgrade, then login.
pub struct SmtpClient {
    host: String,
    port: u16,
    username: String,
    password: SecretString,
    hello_name: ClientId,
    timeout: Duration,
}

impl SmtpClient {
    pub fn new(
        host: String,
        port: u16,
        username: String,
        password: SecretString,
        hello_name: String,
        timeout: Duration,
    ) -> Self {
        Self {
            host,
            port,
            username,
            password,
            hello_name: ClientId::Domain(hello_name),
            timeout,
        }
    }

    pub fn from_settings(settings: &SmtpSettings) -> Self {
        Self::new(
            settings.host.clone(),
            settings.port,
            settings.username.clone(),
            SecretString::from(settings.password.expose_secret().to_owned()),
            settings.hello_name.clone(),
            settings.timeout(),
        )
    }

    async fn upgrade_and_login(
        &self,
        connection: &mut AsyncSmtpConnection,
    ) -> Result<(), SessionError> {
        if !connection.can_starttls() {
            return Err(SessionError::StartTlsUnavailable {
                host: self.host.clone(),
            });
        }
        let tls_parameters = TlsParameters::new(self.host.clone())
            .map_err(|e| SessionError::Tls(e.into()))?;
        connection
            .starttls(tls_parameters, &self.hello_name)
            .await
            .map_err(|e| SessionError::Tls(e.into()))?;

        let credentials = Credentials::new(
            self.username.clone(),
            self.password.expose_secret().to_owned(),
        );
        connection
            .auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
            .await
            .map_err(|e| SessionError::Authentication {
                username: self.username.clone(),
                source: e.into(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl Transport for SmtpClient {
    type Session = SmtpSession;

    #[tracing::instrument(
        name = "Opening an SMTP session",
        skip(self),
        fields(host = %self.host, port = self.port, username = %self.username)
    )]
    async fn connect(&self) -> Result<SmtpSession, SessionError> {
        let mut connection = AsyncSmtpConnection::connect_tokio1(
            (self.host.as_str(), self.port),
            Some(self.timeout),
            &self.hello_name,
            None,
            None,
        )
        .await
        .map_err(|e| SessionError::Connect {
            host: self.host.clone(),
            port: self.port,
            source: e.into(),
        })?;

        if let Err(e) = self.upgrade_and_login(&mut connection).await {
            connection.abort().await;
            return Err(e);
        }

        tracing::info!("SMTP session established");
        Ok(SmtpSession { connection })
    }
}

pub struct SmtpSession {
    connection: AsyncSmtpConnection,
}

#[async_trait]
impl Session for SmtpSession {
    async fn send(&mut self, message: Message) -> Result<(), SendError> {
        let envelope = message.envelope().clone();
        self.connection
            .send(&envelope, &message.formatted())
            .await
            .map(|_| ())
            .map_err(|e| SendError::Rejected(e.into()))
    }

    async fn close(mut self) -> Result<(), SessionError> {
        if self.connection.has_broken() {
            self.connection.abort().await;
            return Ok(());
        }
        self.connection
            .quit()
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Quit(e.into()))
    }
}
