use reqwest::Client;
use tracing::{error, info};

use crate::config::Config;
use crate::errors::{AppError, Result};

const FAST2SMS_URL: &str = "https://www.fast2sms.com/dev/bulkV2";

/// OTP dispatch over the Fast2SMS gateway. Without an API key the OTP is
/// logged instead, so local development works end to end.
#[derive(Clone)]
pub struct SmsSender {
    client: Client,
    api_key: Option<String>,
}

impl SmsSender {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.fast2sms_api_key.clone(),
        }
    }

    pub async fn send_otp(&self, phone: &str, otp: &str) -> Result<()> {
        let Some(api_key) = &self.api_key else {
            info!(action = "sms_not_configured", phone = %phone, otp = %otp);
            return Ok(());
        };

        // The gateway wants a bare 10-digit Indian number.
        let mut number: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if number.starts_with("91") && number.len() > 10 {
            number = number[2..].to_string();
        }
        if number.len() > 10 {
            number = number[number.len() - 10..].to_string();
        }

        let response = self
            .client
            .get(FAST2SMS_URL)
            .query(&[
                ("authorization", api_key.as_str()),
                ("variables_values", otp),
                ("route", "otp"),
                ("numbers", &number),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(action = "sms_send_failed", phone = %phone, response = %body);
            return Err(AppError::NetworkError(format!(
                "SMS gateway rejected the message: {}",
                body
            )));
        }

        info!(action = "sms_sent", phone = %number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[tokio::test]
    async fn unconfigured_sender_is_a_no_op() {
        let sender = SmsSender::new(&test_config());
        assert!(sender.send_otp("+919876543210", "482913").await.is_ok());
    }
}
