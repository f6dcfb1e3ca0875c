use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::config::Config;
use crate::errors::{AppError, Result};

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
}

/// Transactional email over the Brevo HTTP API. Unconfigured instances log
/// and return, mirroring the SMS sender.
#[derive(Clone)]
pub struct Mailer {
    client: Client,
    api_key: Option<String>,
    from_email: Option<String>,
    from_name: Option<String>,
    frontend_url: String,
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.brevo_api_key.clone(),
            from_email: config.email_from.clone(),
            from_name: config.email_from_name.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<()> {
        let (Some(api_key), Some(from_email)) = (&self.api_key, &self.from_email) else {
            info!(action = "email_not_configured", to = %to, subject = %subject);
            return Ok(());
        };

        let body = SendEmailBody {
            sender: EmailAddress {
                email: from_email.clone(),
                name: self.from_name.clone(),
            },
            to: vec![EmailAddress {
                email: to.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            html_content: html,
        };

        let response = self
            .client
            .post(BREVO_SEND_URL)
            .header("api-key", api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(action = "email_send_failed", to = %to, status = %status, response = %text);
            return Err(AppError::NetworkError(format!(
                "Email send failed (status={}): {}",
                status, text
            )));
        }

        info!(action = "email_sent", to = %to, subject = %subject);
        Ok(())
    }

    pub async fn send_otp_email(&self, to: &str, otp: &str, name: &str) -> Result<()> {
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Hello {name},</h2>
    <p>Thank you for joining! Please verify your email address using the OTP below:</p>
    <div style="border: 2px dashed #667eea; padding: 20px; text-align: center; margin: 20px 0; border-radius: 8px;">
      <span style="font-size: 32px; font-weight: bold; color: #667eea; letter-spacing: 5px;">{otp}</span>
    </div>
    <p><strong>This OTP is valid for 10 minutes.</strong></p>
    <p>If you didn't request this verification, please ignore this email.</p>
  </div>
</body>
</html>"#
        );
        self.send(to, "Verify Your Email", html).await
    }

    pub async fn send_welcome_email(&self, to: &str, name: &str) -> Result<()> {
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Hello {name},</h2>
    <p>We're excited to have you join our trusted matrimony platform!</p>
    <p>Your profile is currently under review. Once approved by our team, you'll be able to
    browse verified profiles, send and receive interests, and connect with potential matches.</p>
    <p>Please complete your profile to increase your chances of finding the perfect match.</p>
    <a href="{frontend}/dashboard" style="display: inline-block; background: #667eea; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px; margin: 20px 0;">Complete Your Profile</a>
    <p>Best wishes in your search!</p>
  </div>
</body>
</html>"#,
            frontend = self.frontend_url
        );
        self.send(to, "Welcome!", html).await
    }

    pub async fn send_approval_email(&self, to: &str, name: &str, approved: bool) -> Result<()> {
        let (status, message) = if approved {
            (
                "Approved",
                "Congratulations! Your profile has been approved. You can now start connecting with other members.",
            )
        } else {
            (
                "Rejected",
                "Unfortunately, your profile could not be approved. Please contact support for more information.",
            )
        };
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Hello {name},</h2>
    <p>{message}</p>
    <p>Thank you,<br>The Matrimony Team</p>
  </div>
</body>
</html>"#
        );
        self.send(to, &format!("Profile {}", status), html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[tokio::test]
    async fn unconfigured_mailer_is_a_no_op() {
        let mailer = Mailer::new(&test_config());
        assert!(mailer
            .send_otp_email("asha@example.com", "482913", "Asha")
            .await
            .is_ok());
        assert!(mailer
            .send_welcome_email("asha@example.com", "Asha")
            .await
            .is_ok());
        assert!(mailer
            .send_approval_email("asha@example.com", "Asha", true)
            .await
            .is_ok());
    }
}
