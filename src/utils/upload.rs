use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::config::Config;
use crate::errors::{AppError, Result};

const FOLDER_PREFIX: &str = "matrimony";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub url: String,
    pub public_id: String,
    pub filename: String,
}

/// Media uploads delegated to Cloudinary. Signed uploads: the request
/// parameters are hashed with the API secret (SHA-256).
#[derive(Clone)]
pub struct MediaUploader {
    client: Client,
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
}

impl MediaUploader {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            cloud_name: config.cloudinary_cloud_name.clone(),
            api_key: config.cloudinary_api_key.clone(),
            api_secret: config.cloudinary_api_secret.clone(),
        }
    }

    fn credentials(&self) -> Result<(&str, &str, &str)> {
        match (&self.cloud_name, &self.api_key, &self.api_secret) {
            (Some(cloud), Some(key), Some(secret)) => Ok((cloud, key, secret)),
            _ => Err(AppError::InternalError(
                "Media host is not configured".to_string(),
            )),
        }
    }

    /// Certificates may be images or PDFs; `resource_type` auto lets the host
    /// sort that out. The public id is the filename without its extension.
    pub async fn upload_certificate(&self, data: Vec<u8>, filename: &str) -> Result<UploadedFile> {
        let public_id = filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(filename)
            .to_string();
        self.upload(data, filename, "certificates", Some(public_id), "auto")
            .await
    }

    pub async fn upload_image(&self, data: Vec<u8>, filename: &str) -> Result<UploadedFile> {
        self.upload(data, filename, "profiles", None, "image").await
    }

    async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        folder: &str,
        public_id: Option<String>,
        resource_type: &str,
    ) -> Result<UploadedFile> {
        let (cloud_name, api_key, api_secret) = self.credentials()?;

        let folder = format!("{}/{}", FOLDER_PREFIX, folder);
        let timestamp = Utc::now().timestamp().to_string();

        // Parameters signed in alphabetical order, per the upload API contract.
        let mut params: Vec<(String, String)> = vec![
            ("folder".to_string(), folder.clone()),
            ("signature_algorithm".to_string(), "sha256".to_string()),
            ("timestamp".to_string(), timestamp.clone()),
        ];
        if let Some(id) = &public_id {
            params.push(("public_id".to_string(), id.clone()));
        }
        params.sort();

        let to_sign: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        let mut hasher = Sha256::new();
        hasher.update(format!("{}{}", to_sign.join("&"), api_secret).as_bytes());
        let signature = format!("{:x}", hasher.finalize());

        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(data).file_name(filename.to_string()),
            )
            .text("api_key", api_key.to_string())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/{}/upload",
            cloud_name, resource_type
        );

        let response = self.client.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(action = "media_upload_failed", status = %status, response = %text);
            return Err(AppError::NetworkError(format!(
                "Media upload failed (status={}): {}",
                status, text
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let uploaded = UploadedFile {
            url: body
                .get("secure_url")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            public_id: body
                .get("public_id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            filename: filename.to_string(),
        };

        info!(action = "media_uploaded", public_id = %uploaded.public_id);
        Ok(uploaded)
    }

    /// Remove an asset, e.g. when a photo is replaced.
    pub async fn delete(&self, public_id: &str) -> Result<()> {
        let (cloud_name, api_key, api_secret) = self.credentials()?;

        let timestamp = Utc::now().timestamp().to_string();
        let to_sign = format!(
            "public_id={}&signature_algorithm=sha256&timestamp={}{}",
            public_id, timestamp, api_secret
        );
        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        let signature = format!("{:x}", hasher.finalize());

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/destroy",
            cloud_name
        );
        let response = self
            .client
            .post(&url)
            .form(&[
                ("public_id", public_id),
                ("signature_algorithm", "sha256"),
                ("timestamp", &timestamp),
                ("api_key", api_key),
                ("signature", &signature),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::NetworkError(format!(
                "Media delete failed: {}",
                text
            )));
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }
}

/// Certificates may be images or PDFs; profile photos only images.
pub fn is_allowed_certificate(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type == "application/pdf"
}

pub fn is_allowed_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn certificate_filter_accepts_images_and_pdfs() {
        assert!(is_allowed_certificate("image/png"));
        assert!(is_allowed_certificate("image/jpeg"));
        assert!(is_allowed_certificate("application/pdf"));
        assert!(!is_allowed_certificate("text/html"));
    }

    #[test]
    fn image_filter_rejects_pdfs() {
        assert!(is_allowed_image("image/png"));
        assert!(!is_allowed_image("application/pdf"));
    }

    #[tokio::test]
    async fn unconfigured_uploader_errors_cleanly() {
        let uploader = MediaUploader::new(&test_config());
        assert!(!uploader.is_configured());
        let result = uploader
            .upload_certificate(vec![1, 2, 3], "cert.pdf")
            .await;
        assert!(result.is_err());
    }
}
