use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use tracing::{error, info};
use uuid::Uuid;

use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::profile::Profile;
use crate::models::user::{AuthProvider, Role, User};
use crate::utils::crypto::PasswordManager;
use crate::utils::email::Mailer;
use crate::utils::sms::SmsSender;
use crate::utils::validation::{format_phone_number, validate_phone_number, Validator};

const EVICTION_AFTER: StdDuration = StdDuration::from_secs(15 * 60);

fn otp_validity() -> Duration {
    Duration::minutes(10)
}

/// Registration payload held in memory until the OTP is confirmed. Nothing
/// is written to the database before that.
#[derive(Debug, Clone)]
pub struct PendingRegistration {
    pub phone: String,
    pub email: Option<String>,
    pub password: String,
    pub full_name: String,
    pub otp: String,
    pub otp_expiry: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Keyed store of registrations awaiting OTP confirmation. Owned by the
/// application state and injected into the service; process-local and
/// non-durable, a restart drops anything not yet verified.
#[derive(Debug, Default)]
pub struct PendingRegistrations {
    entries: DashMap<String, PendingRegistration>,
}

impl PendingRegistrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins: a repeat registration for the same phone replaces
    /// the earlier pending entry, so only the newest OTP is verifiable.
    pub fn insert(&self, registration: PendingRegistration) {
        self.entries
            .insert(registration.phone.clone(), registration);
    }

    pub fn get(&self, phone: &str) -> Option<PendingRegistration> {
        self.entries.get(phone).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, phone: &str) {
        self.entries.remove(phone);
    }

    /// Eviction callback: only removes the exact entry the timer was
    /// scheduled for, so a newer registration isn't swept away early.
    pub fn remove_if_stale(&self, phone: &str, created_at: DateTime<Utc>) {
        self.entries
            .remove_if(phone, |_, entry| entry.created_at == created_at);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How the caller proved control of the phone number.
pub enum RegistrationMethod {
    /// Our own OTP, confirmed against the pending-registration store.
    BackendOtp(PendingRegistration),
    /// A third-party phone-auth assertion, accepted at face value.
    ExternalAssertion {
        phone: String,
        full_name: String,
        password: String,
    },
}

/// Outcome of the two-write account creation. User and profile are separate
/// inserts with no transaction across them; a failed profile write leaves a
/// usable account behind, and the caller gets to know that.
#[derive(Debug)]
pub enum AccountCreation {
    Complete { user: User, profile: Profile },
    ProfilePending { user: User },
}

impl AccountCreation {
    pub fn user(&self) -> &User {
        match self {
            AccountCreation::Complete { user, .. } => user,
            AccountCreation::ProfilePending { user } => user,
        }
    }

    pub fn into_user(self) -> User {
        match self {
            AccountCreation::Complete { user, .. } => user,
            AccountCreation::ProfilePending { user } => user,
        }
    }
}

/// Result of `verify_otp`: either a brand-new account, or an existing
/// unverified user whose phone is now confirmed.
#[derive(Debug)]
pub enum VerifiedPhone {
    Created(AccountCreation),
    Existing(User),
}

pub struct RegistrationService {
    db: Arc<SqliteDatabase>,
    pending: Arc<PendingRegistrations>,
    sms: SmsSender,
    mailer: Mailer,
}

impl RegistrationService {
    pub fn new(
        db: Arc<SqliteDatabase>,
        pending: Arc<PendingRegistrations>,
        sms: SmsSender,
        mailer: Mailer,
    ) -> Self {
        Self {
            db,
            pending,
            sms,
            mailer,
        }
    }

    /// Step one of the backend-OTP path. Validates and stashes the payload,
    /// dispatches the OTP, writes nothing durable. Returns the normalized
    /// phone the caller must verify against.
    pub async fn register(
        &self,
        full_name: &str,
        raw_phone: &str,
        password: &str,
        email: Option<String>,
    ) -> Result<String> {
        let phone = format_phone_number(raw_phone);
        if !validate_phone_number(&phone) {
            return Err(AppError::ValidationError(
                "Invalid phone number format".to_string(),
            ));
        }

        Validator::validate_full_name(full_name)?;
        Validator::validate_password(password)?;

        if self.db.get_user_by_phone(&phone).await?.is_some() {
            return Err(AppError::ValidationError(
                "Phone number already registered".to_string(),
            ));
        }

        if let Some(email) = &email {
            Validator::validate_email(email)?;
            if self.db.get_user_by_email(email).await?.is_some() {
                return Err(AppError::ValidationError(
                    "Email already registered".to_string(),
                ));
            }
        }

        let otp = generate_otp();
        let now = Utc::now();
        let registration = PendingRegistration {
            phone: phone.clone(),
            email: email.clone(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            otp: otp.clone(),
            otp_expiry: now + otp_validity(),
            created_at: now,
        };
        self.pending.insert(registration);

        // Auto-eviction keeps abandoned registrations from accumulating.
        let pending = self.pending.clone();
        let eviction_phone = phone.clone();
        tokio::spawn(async move {
            tokio::time::sleep(EVICTION_AFTER).await;
            pending.remove_if_stale(&eviction_phone, now);
        });

        if let Err(e) = self.sms.send_otp(&phone, &otp).await {
            error!(action = "register_otp_sms_failed", phone = %phone, error = %e);
        }
        if let Some(email) = &email {
            if let Err(e) = self.mailer.send_otp_email(email, &otp, full_name).await {
                error!(action = "register_otp_email_failed", email = %email, error = %e);
            }
        }

        info!(action = "registration_pending", phone = %phone);
        Ok(phone)
    }

    /// Step two. The pending-store path creates the account; the fallback
    /// path confirms an already-persisted user against the OTP stored on its
    /// own row by `resend_otp`.
    pub async fn verify_otp(&self, raw_phone: &str, otp: &str) -> Result<VerifiedPhone> {
        let phone = format_phone_number(raw_phone);

        if let Some(pending) = self.pending.get(&phone) {
            if pending.otp != otp {
                return Err(AppError::ValidationError("Invalid OTP".to_string()));
            }
            if Utc::now() > pending.otp_expiry {
                self.pending.remove(&phone);
                return Err(AppError::ValidationError(
                    "OTP expired. Please register again.".to_string(),
                ));
            }

            let email = pending.email.clone();
            let full_name = pending.full_name.clone();
            let outcome = self
                .create_account(RegistrationMethod::BackendOtp(pending))
                .await?;
            self.pending.remove(&phone);

            if let Some(email) = email {
                if let Err(e) = self.mailer.send_welcome_email(&email, &full_name).await {
                    error!(action = "welcome_email_failed", email = %email, error = %e);
                }
            }

            info!(action = "registration_completed", phone = %phone);
            return Ok(VerifiedPhone::Created(outcome));
        }

        // No pending entry: resend-verification flow against a persisted user.
        let mut user = self
            .db
            .get_user_by_phone(&phone)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "No pending registration found. Please register first.".to_string(),
                )
            })?;

        if !user.verify_otp(otp) {
            return Err(AppError::ValidationError(
                "Invalid or expired OTP".to_string(),
            ));
        }

        user.is_phone_verified = true;
        user.otp = None;
        user.otp_expiry = None;
        self.db.update_user(&user).await?;

        info!(action = "phone_verified", phone = %phone);
        Ok(VerifiedPhone::Existing(user))
    }

    /// Fresh OTP for an already-persisted, still-unverified user. Stored on
    /// the user row, distinct from the pending-registration store.
    pub async fn resend_otp(&self, raw_phone: &str) -> Result<()> {
        let phone = format_phone_number(raw_phone);
        let mut user = self
            .db
            .get_user_by_phone(&phone)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.is_phone_verified {
            return Err(AppError::ValidationError(
                "Phone already verified".to_string(),
            ));
        }

        let otp = generate_otp();
        user.otp = Some(otp.clone());
        user.otp_expiry = Some(Utc::now() + otp_validity());
        self.db.update_user(&user).await?;

        if let Err(e) = self.sms.send_otp(&phone, &otp).await {
            error!(action = "resend_otp_sms_failed", phone = %phone, error = %e);
        }

        info!(action = "otp_resent", phone = %phone);
        Ok(())
    }

    /// Path B: the caller already completed OTP verification with the
    /// third-party phone-auth provider. The supplied assertion is accepted
    /// at face value.
    pub async fn register_with_external_assertion(
        &self,
        raw_phone: &str,
        password: &str,
        full_name: &str,
        assertion_token: &str,
    ) -> Result<AccountCreation> {
        if raw_phone.is_empty()
            || password.is_empty()
            || full_name.is_empty()
            || assertion_token.is_empty()
        {
            return Err(AppError::ValidationError(
                "Missing required fields".to_string(),
            ));
        }

        let phone = format_phone_number(raw_phone);
        if !validate_phone_number(&phone) {
            return Err(AppError::ValidationError(
                "Invalid phone number format".to_string(),
            ));
        }

        if self.db.get_user_by_phone(&phone).await?.is_some() {
            return Err(AppError::ValidationError(
                "Phone number already registered".to_string(),
            ));
        }

        let outcome = self
            .create_account(RegistrationMethod::ExternalAssertion {
                phone: phone.clone(),
                full_name: full_name.to_string(),
                password: password.to_string(),
            })
            .await?;

        info!(action = "external_registration_completed", phone = %phone);
        Ok(outcome)
    }

    /// Single entry point for both registration paths: persist the user,
    /// then the default profile, then the link back. The profile write has
    /// no transactional cover, so its failure is surfaced as a typed
    /// outcome instead of being silently swallowed.
    pub async fn create_account(&self, method: RegistrationMethod) -> Result<AccountCreation> {
        let (phone, full_name, password, email, provider) = match method {
            RegistrationMethod::BackendOtp(pending) => (
                pending.phone,
                pending.full_name,
                pending.password,
                pending.email,
                AuthProvider::Local,
            ),
            RegistrationMethod::ExternalAssertion {
                phone,
                full_name,
                password,
            } => (phone, full_name, password, None, AuthProvider::Phone),
        };

        let now = Utc::now();
        let mut user = User {
            id: Uuid::new_v4(),
            phone: Some(phone.clone()),
            full_name: Some(full_name.clone()),
            email,
            password_hash: Some(PasswordManager::hash_password(&password)?),
            google_id: None,
            auth_provider: provider,
            is_phone_verified: true,
            is_email_verified: false,
            is_profile_approved: false,
            role: Role::User,
            is_active: true,
            is_blocked: false,
            community_certificate: None,
            otp: None,
            otp_expiry: None,
            profile_id: None,
            last_login: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.db.create_user(&user).await?;

        let profile = Profile::with_defaults(user.id, &full_name, &phone, user.email.clone());
        if let Err(e) = self.db.create_profile(&profile).await {
            error!(action = "profile_create_failed", user_id = %user.id, error = %e);
            return Ok(AccountCreation::ProfilePending { user });
        }

        user.profile_id = Some(profile.id);
        if let Err(e) = self.db.update_user(&user).await {
            // The profile exists and is reachable by user id; only the back
            // reference is missing.
            error!(action = "profile_link_failed", user_id = %user.id, error = %e);
        }

        Ok(AccountCreation::Complete { user, profile })
    }
}

fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(100_000..1_000_000))
}
