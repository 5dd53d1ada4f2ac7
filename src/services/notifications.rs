//! Best-effort email notifications
//!
//! Scheduling never fails because an email could not be delivered: callers go
//! through [`notify`], which logs delivery problems and returns whether the
//! message went out.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::{
    config::MailConfig,
    error::{Error, Result},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub to: String,
}

impl EmailMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            to: to.into(),
        }
    }
}

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Used when no relay is configured: records the message in the log only.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::warn!(
            to = %message.to,
            subject = %message.subject,
            "mail relay not configured, skipping email"
        );
        Err(Error::Internal("mail relay not configured".to_string()))
    }
}

/// Delivers messages by POSTing JSON to an HTTP mail relay.
pub struct RelayMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<SecretString>,
    from: String,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl RelayMailer {
    pub fn new(url: String, api_key: Option<SecretString>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = RelayPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| Error::Internal(format!("Mail relay request failed: {}", e)))?;

        tracing::debug!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

/// Picks the relay mailer when a relay URL is configured, the log mailer otherwise.
pub fn mailer_from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match &config.relay_url {
        Some(url) if !url.trim().is_empty() => Arc::new(RelayMailer::new(
            url.clone(),
            config.api_key.clone(),
            config.from.clone(),
        )),
        _ => Arc::new(LogMailer),
    }
}

/// Sends a message, logging instead of failing. Returns whether it was delivered.
pub async fn notify(mailer: &dyn Mailer, message: EmailMessage) -> bool {
    match mailer.send(&message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(to = %message.to, error = %e, "email notification not delivered");
            false
        }
    }
}

/// Message to a dentist when a patient books a slot.
pub fn booking_notice(patient_name: &str, date: &str, time: &str, dentist_email: &str) -> EmailMessage {
    EmailMessage::new(
        "Nova consulta agendada",
        format!(
            "Paciente {} agendou uma consulta em {} {}.\n\nVerifique a agenda do sistema.",
            patient_name, date, time
        ),
        dentist_email,
    )
}

/// Message to a patient when a dentist schedules them directly.
pub fn scheduled_notice(patient_name: &str, dentist_name: &str, date: &str, time: &str, patient_email: &str) -> EmailMessage {
    EmailMessage::new(
        "Consulta agendada",
        format!(
            "Olá {},\n\nSua consulta com {} foi agendada para {} às {}.\n\nAtenciosamente,",
            patient_name, dentist_name, date, time
        ),
        patient_email,
    )
}

/// Message to a patient whose account was created by a dentist.
pub fn account_created_notice(patient_name: &str, portal_url: &str, patient_email: &str) -> EmailMessage {
    EmailMessage::new(
        "Conta criada - Clínica",
        format!(
            "Olá {},\n\nSua conta no portal da clínica foi criada. Use este e-mail e a senha que o dentista forneceu para entrar.\n\nAcesse: {}\n\nAtenciosamente,",
            patient_name, portal_url
        ),
        patient_email,
    )
}

/// Message carrying a freshly generated password.
pub fn password_reset_notice(patient_name: &str, new_password: &str, patient_email: &str) -> EmailMessage {
    EmailMessage::new(
        "Nova senha - Clínica",
        format!(
            "Olá {},\n\nSua nova senha é: {}\n\nRecomendamos alterá-la após o primeiro acesso.",
            patient_name, new_password
        ),
        patient_email,
    )
}
