// src/service/email_service.rs

use crate::domain::customer_model::{CustomerData, ProcessingPurpose};
use crate::domain::email_log_model::{EmailType, Model as EmailLogModel};
use crate::domain::optician_model::Model as OpticianModel;
use crate::error::{AppError, AppResult};
use crate::repository::email_log_repository::{EmailLogRepository, NewEmailLog};
use crate::utils::crypto::CryptoContext;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// メール送信エラー
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("SMTP configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Missing email configuration")]
    MissingConfiguration,
}

/// メール設定
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub use_tls: bool,
    /// 開発モードかどうか（ログ出力のみ）
    pub development_mode: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: "user".to_string(),
            smtp_password: "password".to_string(),
            from_email: "noreply@visionmatch.example".to_string(),
            from_name: "VisionMatch".to_string(),
            use_tls: true,
            development_mode: true,
        }
    }
}

impl EmailConfig {
    /// 環境変数から設定を読み込み
    pub fn from_env() -> Result<Self, EmailError> {
        let development_mode = env::var("EMAIL_DEVELOPMENT_MODE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        if development_mode {
            return Ok(Self {
                development_mode: true,
                ..Default::default()
            });
        }

        let smtp_host = env::var("SMTP_HOST").map_err(|_| EmailError::MissingConfiguration)?;
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .map_err(|_| EmailError::ConfigurationError("Invalid SMTP port".to_string()))?;
        let smtp_username =
            env::var("SMTP_USERNAME").map_err(|_| EmailError::MissingConfiguration)?;
        let smtp_password =
            env::var("SMTP_PASSWORD").map_err(|_| EmailError::MissingConfiguration)?;
        let from_email = env::var("FROM_EMAIL").map_err(|_| EmailError::MissingConfiguration)?;
        let from_name = env::var("FROM_NAME").unwrap_or_else(|_| "VisionMatch".to_string());
        let use_tls = env::var("SMTP_USE_TLS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_email,
            from_name,
            use_tls,
            development_mode: false,
        })
    }

    /// 設定の検証
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.development_mode {
            return Ok(());
        }
        if self.smtp_host.is_empty() {
            return Err(EmailError::ConfigurationError(
                "SMTP host is required".to_string(),
            ));
        }
        if self.from_email.is_empty() {
            return Err(EmailError::ConfigurationError(
                "From email is required".to_string(),
            ));
        }
        if self.from_email.parse::<Mailbox>().is_err() {
            return Err(EmailError::InvalidAddress(self.from_email.clone()));
        }
        Ok(())
    }
}

struct OutgoingEmail {
    to_email: String,
    to_name: Option<String>,
    subject: String,
    body: String,
}

/// Caller-supplied appointment details for reminder emails.
#[derive(Debug, Clone)]
pub struct AppointmentDetails {
    pub optician_name: String,
    pub date: String,
    pub address: String,
    pub phone: String,
}

/// Transactional email dispatch. Every attempt, successful or not, leaves
/// an `email_logs` row keyed to the customer's consent id; the recipient
/// address is stored only as a SHA-256 hash. Plain-text bodies only.
pub struct EmailService {
    config: EmailConfig,
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    email_log_repo: Arc<EmailLogRepository>,
    crypto: Arc<CryptoContext>,
}

impl EmailService {
    pub fn new(
        config: EmailConfig,
        email_log_repo: Arc<EmailLogRepository>,
        crypto: Arc<CryptoContext>,
    ) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| AppError::ExternalServiceError(e.to_string()))?;

        let mailer = if config.development_mode {
            None
        } else {
            let builder = if config.use_tls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                    .map_err(|e| AppError::ExternalServiceError(e.to_string()))?
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            };
            Some(
                builder
                    .port(config.smtp_port)
                    .credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ))
                    .build(),
            )
        };

        Ok(Self {
            config,
            mailer,
            email_log_repo,
            crypto,
        })
    }

    /// Send the quiz-results email. Refused when the customer has not
    /// consented to email communication.
    pub async fn send_quiz_results(&self, customer: &CustomerData) -> AppResult<EmailLogModel> {
        if !customer
            .purposes
            .contains(&ProcessingPurpose::EmailCommunication)
        {
            return Err(AppError::ConsentRequired(
                "Customer has not consented to email communication".to_string(),
            ));
        }

        let to_email = customer.email.clone().ok_or_else(|| {
            AppError::BadRequest("Customer record has no email address".to_string())
        })?;
        let first_name = customer.first_name.as_deref().unwrap_or("there");

        let email = OutgoingEmail {
            to_email,
            to_name: customer.first_name.clone(),
            subject: "Your VisionMatch Quiz Results".to_string(),
            body: quiz_results_body(first_name, customer.ai_insights.as_ref()),
        };
        self.dispatch(&customer.consent_id, EmailType::QuizResults, email)
            .await
    }

    /// Send an appointment confirmation carrying the matched optician's
    /// details and the requested slot.
    pub async fn send_appointment_confirmation(
        &self,
        customer: &CustomerData,
        optician: &OpticianModel,
        preferred_date: &str,
        preferred_time: &str,
    ) -> AppResult<EmailLogModel> {
        let to_email = customer.email.clone().ok_or_else(|| {
            AppError::BadRequest("Customer record has no email address".to_string())
        })?;
        let first_name = customer.first_name.as_deref().unwrap_or("there");

        let email = OutgoingEmail {
            to_email,
            to_name: customer.first_name.clone(),
            subject: format!("Appointment Request Confirmed - {}", optician.name),
            body: appointment_body(first_name, optician, preferred_date, preferred_time),
        };
        self.dispatch(
            &customer.consent_id,
            EmailType::AppointmentConfirmation,
            email,
        )
        .await
    }

    /// Send a reminder for an appointment described by the caller, used for
    /// bookings made outside the optician directory.
    pub async fn send_appointment_reminder(
        &self,
        customer: &CustomerData,
        details: &AppointmentDetails,
    ) -> AppResult<EmailLogModel> {
        let to_email = customer.email.clone().ok_or_else(|| {
            AppError::BadRequest("Customer record has no email address".to_string())
        })?;
        let first_name = customer.first_name.as_deref().unwrap_or("there");

        let email = OutgoingEmail {
            to_email,
            to_name: customer.first_name.clone(),
            subject: format!("Appointment Reminder - {}", details.optician_name),
            body: reminder_body(first_name, details),
        };
        self.dispatch(
            &customer.consent_id,
            EmailType::AppointmentConfirmation,
            email,
        )
        .await
    }

    async fn dispatch(
        &self,
        consent_id: &str,
        email_type: EmailType,
        email: OutgoingEmail,
    ) -> AppResult<EmailLogModel> {
        let recipient_hash = self.crypto.hash(&email.to_email);
        let subject = email.subject.clone();

        let (delivery_status, provider_message_id, send_error) = match &self.mailer {
            None => {
                self.log_email(&email);
                ("logged".to_string(), None, None)
            }
            Some(mailer) => match build_message(&self.config, &email) {
                Err(err) => ("failed".to_string(), None, Some(err)),
                Ok(message) => match mailer.send(message).await {
                    Ok(response) => {
                        let id = response.message().next().map(|s| s.to_string());
                        ("sent".to_string(), id, None)
                    }
                    Err(err) => (
                        "failed".to_string(),
                        None,
                        Some(AppError::ExternalServiceError(format!(
                            "SMTP send failed: {}",
                            err
                        ))),
                    ),
                },
            },
        };

        let log = self
            .email_log_repo
            .create(NewEmailLog {
                consent_id: consent_id.to_string(),
                email_type,
                recipient_hash,
                delivery_status,
                provider_message_id,
                subject_line: subject,
            })
            .await?;

        match send_error {
            Some(err) => {
                error!(
                    consent_id = %consent_id,
                    recipient = %mask_email(&email.to_email),
                    "Failed to send {} email: {}",
                    String::from(email_type),
                    err
                );
                Err(err)
            }
            None => {
                info!(
                    consent_id = %consent_id,
                    recipient = %mask_email(&email.to_email),
                    "Sent {} email",
                    String::from(email_type)
                );
                Ok(log)
            }
        }
    }

    pub async fn history_for(&self, consent_id: &str) -> AppResult<Vec<EmailLogModel>> {
        Ok(self.email_log_repo.find_by_consent_id(consent_id).await?)
    }

    pub async fn recent(&self, limit: u64) -> AppResult<Vec<EmailLogModel>> {
        Ok(self.email_log_repo.find_recent(limit).await?)
    }

    pub async fn count_all(&self) -> AppResult<u64> {
        Ok(self.email_log_repo.count_all().await?)
    }

    /// 開発モードでのメールログ出力
    fn log_email(&self, email: &OutgoingEmail) {
        info!("📧 EMAIL (Development Mode)");
        info!(
            "To: {} <{}>",
            email.to_name.as_deref().unwrap_or(""),
            mask_email(&email.to_email)
        );
        info!("Subject: {}", email.subject);
        info!("--- Body ---");
        info!("{}", email.body);
        info!("--- End Email ---");
    }
}

fn build_message(config: &EmailConfig, email: &OutgoingEmail) -> Result<Message, AppError> {
    let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
        .parse()
        .map_err(|_| AppError::ExternalServiceError("Invalid sender address".to_string()))?;
    let to: Mailbox = match &email.to_name {
        Some(name) => format!("{} <{}>", name, email.to_email),
        None => email.to_email.clone(),
    }
    .parse()
    .map_err(|_| {
        AppError::ValidationError(format!("Invalid email address: {}", email.to_email))
    })?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(&email.subject)
        .body(email.body.clone())
        .map_err(|e| AppError::ExternalServiceError(format!("Failed to build email: {}", e)))
}

// --- テンプレート ---

fn quiz_results_body(first_name: &str, insights: Option<&serde_json::Value>) -> String {
    let insights_block = insights
        .and_then(|v| v.get("summary"))
        .and_then(|v| v.as_str())
        .map(|summary| format!("\nYour personalized insights:\n{}\n", summary))
        .unwrap_or_default();

    format!(
        r#"Your VisionMatch Results

Hello {first_name},

Thank you for completing the VisionMatch eyewear quiz. Your personalized recommendations are ready.
{insights_block}
You can review your results and book an appointment with a local optician at any time.

---
VisionMatch - Find Your Perfect Eyewear
"#,
        first_name = first_name,
        insights_block = insights_block
    )
}

fn appointment_body(
    first_name: &str,
    optician: &OpticianModel,
    preferred_date: &str,
    preferred_time: &str,
) -> String {
    format!(
        r#"Appointment Request Confirmed

Hello {first_name},

Your appointment request has been sent to:

{name}
{address}, {city}
Requested: {preferred_date} at {preferred_time}

The practice will contact you to confirm the exact time.

---
VisionMatch - Find Your Perfect Eyewear
"#,
        first_name = first_name,
        name = optician.name,
        address = optician.address,
        city = optician.city,
        preferred_date = preferred_date,
        preferred_time = preferred_time
    )
}

fn reminder_body(first_name: &str, details: &AppointmentDetails) -> String {
    format!(
        r#"Appointment Reminder

Hello {first_name},

This is a reminder of your upcoming appointment:

{optician_name}
{address}
{date}
Phone: {phone}

---
VisionMatch - Find Your Perfect Eyewear
"#,
        first_name = first_name,
        optician_name = details.optician_name,
        address = details.address,
        date = details.date,
        phone = details.phone
    )
}

/// メールアドレスをマスク
pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = if local.len() <= 2 {
            "*".repeat(local.len())
        } else {
            format!("{}****", &local[..1])
        };
        format!("{}{}", masked_local, domain)
    } else {
        "****@****".to_string()
    }
}
