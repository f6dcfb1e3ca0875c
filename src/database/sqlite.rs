use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::profile::{PartnerPreferences, Photo, PrivacySettings, Profile};
use crate::models::user::{AuthProvider, CommunityCertificate, Role, User};

#[derive(Debug)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::DatabaseError(format!("Failed to create database directory: {}", e))
            })?;
        }

        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path).map_err(|e| {
                AppError::DatabaseError(format!("Failed to create database file: {}", e))
            })?;
        }

        let database_url = format!("sqlite:{}", database_path);
        let pool = SqlitePool::connect(&database_url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to database: {}", e)))?;

        let db = Self { pool };
        db.create_tables().await?;

        info!(action = "database_connected", path = %database_path);
        Ok(db)
    }

    /// In-memory database for tests. Pinned to one connection: every pooled
    /// connection would otherwise see its own empty in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to open in-memory db: {}", e)))?;
        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                phone TEXT UNIQUE,
                full_name TEXT,
                email TEXT UNIQUE,
                password_hash TEXT,
                google_id TEXT UNIQUE,
                auth_provider TEXT NOT NULL DEFAULT 'local',
                is_phone_verified BOOLEAN DEFAULT FALSE,
                is_email_verified BOOLEAN DEFAULT FALSE,
                is_profile_approved BOOLEAN DEFAULT FALSE,
                role TEXT NOT NULL DEFAULT 'user',
                is_active BOOLEAN DEFAULT TRUE,
                is_blocked BOOLEAN DEFAULT FALSE,
                community_certificate TEXT,
                otp TEXT,
                otp_expiry TEXT,
                profile_id TEXT,
                last_login TEXT,
                login_count INTEGER DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                user_id TEXT UNIQUE NOT NULL,
                full_name TEXT NOT NULL,
                gender TEXT NOT NULL,
                date_of_birth TEXT NOT NULL,
                age INTEGER NOT NULL,
                height TEXT NOT NULL,
                weight TEXT,
                marital_status TEXT NOT NULL,
                physical_status TEXT,
                religion TEXT,
                caste TEXT,
                sub_caste TEXT,
                gothram TEXT,
                mother_tongue TEXT,
                languages_known TEXT NOT NULL DEFAULT '[]',
                time_of_birth TEXT,
                place_of_birth TEXT,
                complexion TEXT,
                body_type TEXT,
                profile_photo TEXT NOT NULL DEFAULT '',
                photos TEXT NOT NULL DEFAULT '[]',
                phone TEXT NOT NULL,
                email TEXT,
                country TEXT NOT NULL,
                state TEXT NOT NULL,
                city TEXT NOT NULL,
                residency_status TEXT,
                highest_education TEXT NOT NULL,
                education_details TEXT,
                occupation TEXT NOT NULL,
                employed_in TEXT,
                annual_income TEXT,
                father_name TEXT,
                father_occupation TEXT,
                mother_name TEXT,
                mother_occupation TEXT,
                brothers INTEGER DEFAULT 0,
                brothers_married INTEGER DEFAULT 0,
                sisters INTEGER DEFAULT 0,
                sisters_married INTEGER DEFAULT 0,
                family_type TEXT,
                family_values TEXT,
                family_status TEXT,
                star TEXT,
                rasi TEXT,
                horoscope_match BOOLEAN DEFAULT FALSE,
                diet TEXT,
                smoking TEXT,
                drinking TEXT,
                hobbies TEXT,
                interests TEXT,
                about_me TEXT,
                partner_preferences TEXT NOT NULL DEFAULT '{}',
                profile_completeness INTEGER DEFAULT 0,
                privacy_settings TEXT NOT NULL DEFAULT '{}',
                views INTEGER DEFAULT 0,
                likes INTEGER DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS interests (
                id TEXT PRIMARY KEY,
                sender TEXT NOT NULL,
                receiver TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                message TEXT,
                is_viewed BOOLEAN DEFAULT FALSE,
                viewed_at TEXT,
                response_message TEXT,
                responded_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (sender) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (receiver) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                sender TEXT NOT NULL,
                receiver TEXT NOT NULL,
                content TEXT NOT NULL,
                message_type TEXT NOT NULL DEFAULT 'text',
                attachment TEXT,
                is_read BOOLEAN DEFAULT FALSE,
                read_at TEXT,
                conversation_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (sender) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (receiver) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS profile_views (
                id TEXT PRIMARY KEY,
                viewer TEXT NOT NULL,
                viewed_profile TEXT NOT NULL,
                view_count INTEGER DEFAULT 1,
                last_viewed_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (viewer, viewed_profile)
            );

            CREATE TABLE IF NOT EXISTS saved_profiles (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                saved_profile_id TEXT NOT NULL,
                note TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (user_id, saved_profile_id)
            );

            CREATE INDEX IF NOT EXISTS idx_users_phone ON users(phone);
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            CREATE INDEX IF NOT EXISTS idx_users_google_id ON users(google_id);
            CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
            CREATE INDEX IF NOT EXISTS idx_profiles_user_id ON profiles(user_id);
            CREATE INDEX IF NOT EXISTS idx_profiles_gender_age ON profiles(gender, age);
            CREATE INDEX IF NOT EXISTS idx_interests_sender_receiver ON interests(sender, receiver);
            CREATE INDEX IF NOT EXISTS idx_interests_receiver_status ON interests(receiver, status);
            CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, created_at);
        "#;

        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    // ---- users ----

    pub async fn create_user(&self, user: &User) -> Result<()> {
        let query = r#"
            INSERT INTO users (id, phone, full_name, email, password_hash, google_id,
                auth_provider, is_phone_verified, is_email_verified, is_profile_approved,
                role, is_active, is_blocked, community_certificate, otp, otp_expiry,
                profile_id, last_login, login_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
        "#;

        let certificate = match &user.community_certificate {
            Some(cert) => Some(serde_json::to_string(cert)?),
            None => None,
        };

        sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.phone)
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.google_id)
            .bind(user.auth_provider.as_str())
            .bind(user.is_phone_verified)
            .bind(user.is_email_verified)
            .bind(user.is_profile_approved)
            .bind(user.role.as_str())
            .bind(user.is_active)
            .bind(user.is_blocked)
            .bind(certificate)
            .bind(&user.otp)
            .bind(user.otp_expiry.map(|t| t.to_rfc3339()))
            .bind(user.profile_id.map(|id| id.to_string()))
            .bind(user.last_login.map(|t| t.to_rfc3339()))
            .bind(user.login_count)
            .bind(user.created_at.to_rfc3339())
            .bind(user.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("UNIQUE constraint failed") {
                    if msg.contains("phone") {
                        AppError::ValidationError("Phone number already registered".to_string())
                    } else if msg.contains("email") {
                        AppError::ValidationError("Email already registered".to_string())
                    } else {
                        AppError::ValidationError("User already exists".to_string())
                    }
                } else {
                    AppError::DatabaseError(format!("Failed to create user: {}", e))
                }
            })?;

        Ok(())
    }

    pub async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        self.fetch_user("SELECT * FROM users WHERE id = ?1", &id.to_string())
            .await
    }

    pub async fn get_user_by_phone(&self, phone: &str) -> Result<Option<User>> {
        self.fetch_user("SELECT * FROM users WHERE phone = ?1", phone)
            .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_user("SELECT * FROM users WHERE email = ?1", email)
            .await
    }

    pub async fn get_user_by_google_id(&self, google_id: &str) -> Result<Option<User>> {
        self.fetch_user("SELECT * FROM users WHERE google_id = ?1", google_id)
            .await
    }

    async fn fetch_user(&self, query: &str, bind: &str) -> Result<Option<User>> {
        let row = sqlx::query(query)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user: {}", e)))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Full-row update of the mutable user fields.
    pub async fn update_user(&self, user: &User) -> Result<()> {
        let query = r#"
            UPDATE users SET phone = ?2, full_name = ?3, email = ?4, password_hash = ?5,
                google_id = ?6, auth_provider = ?7, is_phone_verified = ?8,
                is_email_verified = ?9, is_profile_approved = ?10, role = ?11,
                is_active = ?12, is_blocked = ?13, community_certificate = ?14,
                otp = ?15, otp_expiry = ?16, profile_id = ?17, last_login = ?18,
                login_count = ?19, updated_at = ?20
            WHERE id = ?1
        "#;

        let certificate = match &user.community_certificate {
            Some(cert) => Some(serde_json::to_string(cert)?),
            None => None,
        };

        let result = sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.phone)
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.google_id)
            .bind(user.auth_provider.as_str())
            .bind(user.is_phone_verified)
            .bind(user.is_email_verified)
            .bind(user.is_profile_approved)
            .bind(user.role.as_str())
            .bind(user.is_active)
            .bind(user.is_blocked)
            .bind(certificate)
            .bind(&user.otp)
            .bind(user.otp_expiry.map(|t| t.to_rfc3339()))
            .bind(user.profile_id.map(|id| id.to_string()))
            .bind(user.last_login.map(|t| t.to_rfc3339()))
            .bind(user.login_count)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update user: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }

    /// Users with an uploaded certificate still awaiting review.
    pub async fn get_pending_certificate_users(&self) -> Result<Vec<User>> {
        let query = r#"
            SELECT * FROM users
            WHERE community_certificate IS NOT NULL
              AND json_extract(community_certificate, '$.verified') = 0
            ORDER BY created_at DESC
        "#;
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch pending users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }

    pub async fn list_browsable_users(
        &self,
        exclude: &Uuid,
        approved_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>> {
        let query = if approved_only {
            r#"
                SELECT * FROM users
                WHERE role = 'user' AND id != ?1 AND is_profile_approved = TRUE
                ORDER BY created_at DESC LIMIT ?2 OFFSET ?3
            "#
        } else {
            r#"
                SELECT * FROM users
                WHERE role = 'user' AND id != ?1
                ORDER BY created_at DESC LIMIT ?2 OFFSET ?3
            "#
        };

        let rows = sqlx::query(query)
            .bind(exclude.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }

    pub async fn count_browsable_users(&self, exclude: &Uuid, approved_only: bool) -> Result<i64> {
        let query = if approved_only {
            "SELECT COUNT(*) as count FROM users WHERE role = 'user' AND id != ?1 AND is_profile_approved = TRUE"
        } else {
            "SELECT COUNT(*) as count FROM users WHERE role = 'user' AND id != ?1"
        };
        let row = sqlx::query(query)
            .bind(exclude.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count users: {}", e)))?;
        Ok(row.get("count"))
    }

    // ---- admin dashboard counts ----

    pub async fn count_members(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) as count FROM users WHERE role = 'user'")
            .await
    }

    pub async fn count_pending_approvals(&self) -> Result<i64> {
        self.count(
            r#"
            SELECT COUNT(*) as count FROM users
            WHERE community_certificate IS NOT NULL
              AND json_extract(community_certificate, '$.verified') = 0
        "#,
        )
        .await
    }

    pub async fn count_active_profiles(&self) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) as count FROM users WHERE is_profile_approved = TRUE AND is_active = TRUE AND is_blocked = FALSE",
        )
        .await
    }

    pub async fn count_blocked_users(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) as count FROM users WHERE is_blocked = TRUE")
            .await
    }

    async fn count(&self, query: &str) -> Result<i64> {
        let row = sqlx::query(query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to run count: {}", e)))?;
        Ok(row.get("count"))
    }

    // ---- profiles ----

    pub async fn create_profile(&self, profile: &Profile) -> Result<()> {
        let query = r#"
            INSERT INTO profiles (id, user_id, full_name, gender, date_of_birth, age, height,
                weight, marital_status, physical_status, religion, caste, sub_caste, gothram,
                mother_tongue, languages_known, time_of_birth, place_of_birth, complexion,
                body_type, profile_photo, photos, phone, email, country, state, city,
                residency_status, highest_education, education_details, occupation, employed_in,
                annual_income, father_name, father_occupation, mother_name, mother_occupation,
                brothers, brothers_married, sisters, sisters_married, family_type, family_values,
                family_status, star, rasi, horoscope_match, diet, smoking, drinking, hobbies,
                interests, about_me, partner_preferences, profile_completeness, privacy_settings,
                views, likes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33,
                ?34, ?35, ?36, ?37, ?38, ?39, ?40, ?41, ?42, ?43, ?44, ?45, ?46, ?47, ?48, ?49,
                ?50, ?51, ?52, ?53, ?54, ?55, ?56, ?57, ?58, ?59, ?60)
        "#;

        self.bind_profile(sqlx::query(query), profile)?
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint failed") {
                    AppError::ValidationError("Profile already exists for this user".to_string())
                } else {
                    AppError::DatabaseError(format!("Failed to create profile: {}", e))
                }
            })?;

        Ok(())
    }

    pub async fn update_profile(&self, profile: &Profile) -> Result<()> {
        let query = r#"
            UPDATE profiles SET user_id = ?2, full_name = ?3, gender = ?4, date_of_birth = ?5,
                age = ?6, height = ?7, weight = ?8, marital_status = ?9, physical_status = ?10,
                religion = ?11, caste = ?12, sub_caste = ?13, gothram = ?14, mother_tongue = ?15,
                languages_known = ?16, time_of_birth = ?17, place_of_birth = ?18, complexion = ?19,
                body_type = ?20, profile_photo = ?21, photos = ?22, phone = ?23, email = ?24,
                country = ?25, state = ?26, city = ?27, residency_status = ?28,
                highest_education = ?29, education_details = ?30, occupation = ?31,
                employed_in = ?32, annual_income = ?33, father_name = ?34, father_occupation = ?35,
                mother_name = ?36, mother_occupation = ?37, brothers = ?38, brothers_married = ?39,
                sisters = ?40, sisters_married = ?41, family_type = ?42, family_values = ?43,
                family_status = ?44, star = ?45, rasi = ?46, horoscope_match = ?47, diet = ?48,
                smoking = ?49, drinking = ?50, hobbies = ?51, interests = ?52, about_me = ?53,
                partner_preferences = ?54, profile_completeness = ?55, privacy_settings = ?56,
                views = ?57, likes = ?58, updated_at = ?60
            WHERE id = ?1
        "#;

        let result = self
            .bind_profile(sqlx::query(query), profile)?
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update profile: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Profile not found".to_string()));
        }

        Ok(())
    }

    fn bind_profile<'q>(
        &self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        profile: &'q Profile,
    ) -> Result<sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>> {
        Ok(query
            .bind(profile.id.to_string())
            .bind(profile.user_id.to_string())
            .bind(&profile.full_name)
            .bind(&profile.gender)
            .bind(profile.date_of_birth.format("%Y-%m-%d").to_string())
            .bind(profile.age)
            .bind(&profile.height)
            .bind(&profile.weight)
            .bind(&profile.marital_status)
            .bind(&profile.physical_status)
            .bind(&profile.religion)
            .bind(&profile.caste)
            .bind(&profile.sub_caste)
            .bind(&profile.gothram)
            .bind(&profile.mother_tongue)
            .bind(serde_json::to_string(&profile.languages_known)?)
            .bind(&profile.time_of_birth)
            .bind(&profile.place_of_birth)
            .bind(&profile.complexion)
            .bind(&profile.body_type)
            .bind(&profile.profile_photo)
            .bind(serde_json::to_string(&profile.photos)?)
            .bind(&profile.phone)
            .bind(&profile.email)
            .bind(&profile.country)
            .bind(&profile.state)
            .bind(&profile.city)
            .bind(&profile.residency_status)
            .bind(&profile.highest_education)
            .bind(&profile.education_details)
            .bind(&profile.occupation)
            .bind(&profile.employed_in)
            .bind(&profile.annual_income)
            .bind(&profile.father_name)
            .bind(&profile.father_occupation)
            .bind(&profile.mother_name)
            .bind(&profile.mother_occupation)
            .bind(profile.brothers)
            .bind(profile.brothers_married)
            .bind(profile.sisters)
            .bind(profile.sisters_married)
            .bind(&profile.family_type)
            .bind(&profile.family_values)
            .bind(&profile.family_status)
            .bind(&profile.star)
            .bind(&profile.rasi)
            .bind(profile.horoscope_match)
            .bind(&profile.diet)
            .bind(&profile.smoking)
            .bind(&profile.drinking)
            .bind(&profile.hobbies)
            .bind(&profile.interests)
            .bind(&profile.about_me)
            .bind(serde_json::to_string(&profile.partner_preferences)?)
            .bind(profile.profile_completeness)
            .bind(serde_json::to_string(&profile.privacy_settings)?)
            .bind(profile.views)
            .bind(profile.likes)
            .bind(profile.created_at.to_rfc3339())
            .bind(profile.updated_at.to_rfc3339()))
    }

    pub async fn get_profile_by_user(&self, user_id: &Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE user_id = ?1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch profile: {}", e)))?;

        row.map(|r| row_to_profile(&r)).transpose()
    }

    pub async fn get_profile_by_id(&self, id: &Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch profile: {}", e)))?;

        row.map(|r| row_to_profile(&r)).transpose()
    }
}

fn parse_uuid(value: String) -> Result<Uuid> {
    Uuid::parse_str(&value).map_err(|e| AppError::DatabaseError(format!("Invalid id: {}", e)))
}

fn parse_datetime(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::DatabaseError(format!("Invalid timestamp: {}", e)))
}

fn parse_optional_datetime(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
    })
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    let certificate: Option<String> = row.get("community_certificate");
    let certificate: Option<CommunityCertificate> = certificate
        .map(|json| serde_json::from_str(&json))
        .transpose()?;

    Ok(User {
        id: parse_uuid(row.get::<String, _>("id"))?,
        phone: row.get("phone"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        google_id: row.get("google_id"),
        auth_provider: AuthProvider::from_str(&row.get::<String, _>("auth_provider")),
        is_phone_verified: row.get("is_phone_verified"),
        is_email_verified: row.get("is_email_verified"),
        is_profile_approved: row.get("is_profile_approved"),
        role: Role::from_str(&row.get::<String, _>("role")),
        is_active: row.get("is_active"),
        is_blocked: row.get("is_blocked"),
        community_certificate: certificate,
        otp: row.get("otp"),
        otp_expiry: parse_optional_datetime(row.get("otp_expiry")),
        profile_id: row
            .get::<Option<String>, _>("profile_id")
            .map(parse_uuid)
            .transpose()?,
        last_login: parse_optional_datetime(row.get("last_login")),
        login_count: row.get("login_count"),
        created_at: parse_datetime(row.get::<String, _>("created_at"))?,
        updated_at: parse_datetime(row.get::<String, _>("updated_at"))?,
    })
}

fn row_to_profile(row: &SqliteRow) -> Result<Profile> {
    let languages: Vec<String> = serde_json::from_str(&row.get::<String, _>("languages_known"))?;
    let photos: Vec<Photo> = serde_json::from_str(&row.get::<String, _>("photos"))?;
    let preferences: PartnerPreferences =
        serde_json::from_str(&row.get::<String, _>("partner_preferences")).unwrap_or_default();
    let privacy: PrivacySettings =
        serde_json::from_str(&row.get::<String, _>("privacy_settings")).unwrap_or_default();

    let date_of_birth = NaiveDate::parse_from_str(&row.get::<String, _>("date_of_birth"), "%Y-%m-%d")
        .map_err(|e| AppError::DatabaseError(format!("Invalid date of birth: {}", e)))?;

    Ok(Profile {
        id: parse_uuid(row.get::<String, _>("id"))?,
        user_id: parse_uuid(row.get::<String, _>("user_id"))?,
        full_name: row.get("full_name"),
        gender: row.get("gender"),
        date_of_birth,
        age: row.get("age"),
        height: row.get("height"),
        weight: row.get("weight"),
        marital_status: row.get("marital_status"),
        physical_status: row.get("physical_status"),
        religion: row.get("religion"),
        caste: row.get("caste"),
        sub_caste: row.get("sub_caste"),
        gothram: row.get("gothram"),
        mother_tongue: row.get("mother_tongue"),
        languages_known: languages,
        time_of_birth: row.get("time_of_birth"),
        place_of_birth: row.get("place_of_birth"),
        complexion: row.get("complexion"),
        body_type: row.get("body_type"),
        profile_photo: row.get("profile_photo"),
        photos,
        phone: row.get("phone"),
        email: row.get("email"),
        country: row.get("country"),
        state: row.get("state"),
        city: row.get("city"),
        residency_status: row.get("residency_status"),
        highest_education: row.get("highest_education"),
        education_details: row.get("education_details"),
        occupation: row.get("occupation"),
        employed_in: row.get("employed_in"),
        annual_income: row.get("annual_income"),
        father_name: row.get("father_name"),
        father_occupation: row.get("father_occupation"),
        mother_name: row.get("mother_name"),
        mother_occupation: row.get("mother_occupation"),
        brothers: row.get("brothers"),
        brothers_married: row.get("brothers_married"),
        sisters: row.get("sisters"),
        sisters_married: row.get("sisters_married"),
        family_type: row.get("family_type"),
        family_values: row.get("family_values"),
        family_status: row.get("family_status"),
        star: row.get("star"),
        rasi: row.get("rasi"),
        horoscope_match: row.get("horoscope_match"),
        diet: row.get("diet"),
        smoking: row.get("smoking"),
        drinking: row.get("drinking"),
        hobbies: row.get("hobbies"),
        interests: row.get("interests"),
        about_me: row.get("about_me"),
        partner_preferences: preferences,
        profile_completeness: row.get("profile_completeness"),
        privacy_settings: privacy,
        views: row.get("views"),
        likes: row.get("likes"),
        created_at: parse_datetime(row.get::<String, _>("created_at"))?,
        updated_at: parse_datetime(row.get::<String, _>("updated_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_user(phone: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            phone: Some(phone.to_string()),
            full_name: Some("Asha".to_string()),
            email: None,
            password_hash: Some("hash".to_string()),
            google_id: None,
            auth_provider: AuthProvider::Local,
            is_phone_verified: false,
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
        }
    }

    #[tokio::test]
    async fn user_round_trip() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let mut user = test_user("+919876543210");
        user.otp = Some("482913".to_string());
        user.otp_expiry = Some(Utc::now() + Duration::minutes(10));
        db.create_user(&user).await.unwrap();

        let fetched = db
            .get_user_by_phone("+919876543210")
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.otp.as_deref(), Some("482913"));
        assert_eq!(fetched.auth_provider, AuthProvider::Local);
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        db.create_user(&test_user("+919876543210")).await.unwrap();
        let err = db
            .create_user(&test_user("+919876543210"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn multiple_users_without_email_are_allowed() {
        // email is a sparse unique column: NULLs must not collide
        let db = SqliteDatabase::in_memory().await.unwrap();
        db.create_user(&test_user("+919876543210")).await.unwrap();
        db.create_user(&test_user("+919876543211")).await.unwrap();
    }

    #[tokio::test]
    async fn certificate_survives_json_round_trip() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let mut user = test_user("+919876543210");
        user.community_certificate = Some(CommunityCertificate {
            filename: "cert.pdf".to_string(),
            url: "https://example.com/cert.pdf".to_string(),
            uploaded_at: Utc::now(),
            verified: false,
            verified_by: None,
        });
        db.create_user(&user).await.unwrap();

        let pending = db.get_pending_certificate_users().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending[0]
                .community_certificate
                .as_ref()
                .unwrap()
                .filename,
            "cert.pdf"
        );

        // verify the certificate and it drops out of the pending list
        let mut user = pending.into_iter().next().unwrap();
        user.community_certificate.as_mut().unwrap().verified = true;
        db.update_user(&user).await.unwrap();
        assert!(db.get_pending_certificate_users().await.unwrap().is_empty());
        assert_eq!(db.count_pending_approvals().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn profile_round_trip() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let user = test_user("+919876543210");
        db.create_user(&user).await.unwrap();

        let mut profile = Profile::with_defaults(user.id, "Asha", "+919876543210", None);
        profile.calculate_completeness();
        db.create_profile(&profile).await.unwrap();

        let fetched = db
            .get_profile_by_user(&user.id)
            .await
            .unwrap()
            .expect("profile should exist");
        assert_eq!(fetched.city, "Chennai");
        assert_eq!(fetched.profile_completeness, profile.profile_completeness);

        let err = db.create_profile(&profile).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn browse_filters_and_counts() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let me = test_user("+919876543210");
        db.create_user(&me).await.unwrap();

        let mut approved = test_user("+919876543211");
        approved.is_profile_approved = true;
        db.create_user(&approved).await.unwrap();

        let unapproved = test_user("+919876543212");
        db.create_user(&unapproved).await.unwrap();

        let mut admin = test_user("+919876543213");
        admin.role = Role::Admin;
        db.create_user(&admin).await.unwrap();

        let visible = db
            .list_browsable_users(&me.id, true, 20, 0)
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, approved.id);
        assert_eq!(db.count_browsable_users(&me.id, true).await.unwrap(), 1);

        // admins see unapproved members too, never other admins
        let all = db
            .list_browsable_users(&admin.id, false, 20, 0)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn dashboard_counts() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let mut blocked = test_user("+919876543210");
        blocked.is_blocked = true;
        blocked.is_active = false;
        db.create_user(&blocked).await.unwrap();

        let mut active = test_user("+919876543211");
        active.is_profile_approved = true;
        db.create_user(&active).await.unwrap();

        assert_eq!(db.count_members().await.unwrap(), 2);
        assert_eq!(db.count_blocked_users().await.unwrap(), 1);
        assert_eq!(db.count_active_profiles().await.unwrap(), 1);
    }
}
