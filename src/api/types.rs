use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::profile::{PartnerPreferences, PrivacySettings, Profile};
use crate::models::user::{CommunityCertificate, User, UserResponse};

// ---- requests ----

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub phone: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseRegisterRequest {
    pub phone: String,
    pub password: String,
    pub full_name: String,
    pub firebase_id_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResendOtpRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

/// Client-editable profile fields. Identity fields (user, phone, email) are
/// always taken from the authenticated user, not from this payload.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpsertProfileRequest {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub age: Option<i64>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub marital_status: Option<String>,
    pub physical_status: Option<String>,
    pub religion: Option<String>,
    pub caste: Option<String>,
    pub sub_caste: Option<String>,
    pub gothram: Option<String>,
    pub mother_tongue: Option<String>,
    pub languages_known: Option<Vec<String>>,
    pub time_of_birth: Option<String>,
    pub place_of_birth: Option<String>,
    pub complexion: Option<String>,
    pub body_type: Option<String>,
    pub profile_photo: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub residency_status: Option<String>,
    pub highest_education: Option<String>,
    pub education_details: Option<String>,
    pub occupation: Option<String>,
    pub employed_in: Option<String>,
    pub annual_income: Option<String>,
    pub father_name: Option<String>,
    pub father_occupation: Option<String>,
    pub mother_name: Option<String>,
    pub mother_occupation: Option<String>,
    pub brothers: Option<i64>,
    pub brothers_married: Option<i64>,
    pub sisters: Option<i64>,
    pub sisters_married: Option<i64>,
    pub family_type: Option<String>,
    pub family_values: Option<String>,
    pub family_status: Option<String>,
    pub star: Option<String>,
    pub rasi: Option<String>,
    pub horoscope_match: Option<bool>,
    pub diet: Option<String>,
    pub smoking: Option<String>,
    pub drinking: Option<String>,
    pub hobbies: Option<String>,
    pub interests: Option<String>,
    pub about_me: Option<String>,
    pub partner_preferences: Option<PartnerPreferences>,
    pub privacy_settings: Option<PrivacySettings>,
}

impl UpsertProfileRequest {
    /// Overlay the supplied fields onto an existing profile.
    pub fn apply_to(self, profile: &mut Profile) {
        macro_rules! set {
            ($field:ident) => {
                if let Some(value) = self.$field {
                    profile.$field = value;
                }
            };
            (opt $field:ident) => {
                if self.$field.is_some() {
                    profile.$field = self.$field;
                }
            };
        }

        set!(full_name);
        set!(gender);
        set!(date_of_birth);
        set!(age);
        set!(height);
        set!(opt weight);
        set!(marital_status);
        set!(opt physical_status);
        set!(opt religion);
        set!(opt caste);
        set!(opt sub_caste);
        set!(opt gothram);
        set!(opt mother_tongue);
        set!(languages_known);
        set!(opt time_of_birth);
        set!(opt place_of_birth);
        set!(opt complexion);
        set!(opt body_type);
        set!(profile_photo);
        set!(country);
        set!(state);
        set!(city);
        set!(opt residency_status);
        set!(highest_education);
        set!(opt education_details);
        set!(occupation);
        set!(opt employed_in);
        set!(opt annual_income);
        set!(opt father_name);
        set!(opt father_occupation);
        set!(opt mother_name);
        set!(opt mother_occupation);
        set!(brothers);
        set!(brothers_married);
        set!(sisters);
        set!(sisters_married);
        set!(opt family_type);
        set!(opt family_values);
        set!(opt family_status);
        set!(opt star);
        set!(opt rasi);
        set!(horoscope_match);
        set!(opt diet);
        set!(opt smoking);
        set!(opt drinking);
        set!(opt hobbies);
        set!(opt interests);
        set!(opt about_me);
        set!(partner_preferences);
        set!(privacy_settings);
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BrowseQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    #[allow(dead_code)]
    pub state: Option<String>,
    pub error: Option<String>,
}

// ---- responses ----

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiMessage {
    pub status: &'static str,
    pub message: String,
}

impl ApiMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterData {
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub message: String,
    pub data: RegisterData,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithProfile {
    #[serde(flatten)]
    pub user: UserResponse,
    pub profile: Option<Profile>,
}

impl UserWithProfile {
    pub fn new(user: User, profile: Option<Profile>) -> Self {
        Self {
            user: user.into(),
            profile,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthData {
    pub user: UserWithProfile,
}

/// Token-bearing envelope returned by every endpoint that establishes a
/// session. The same token is also set as the httpOnly cookie.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub status: &'static str,
    pub message: String,
    pub token: String,
    pub data: AuthData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserData {
    pub user: UserWithProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserEnvelope {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: UserData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CertificateData {
    pub certificate: CommunityCertificate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CertificateResponse {
    pub status: &'static str,
    pub message: String,
    pub data: CertificateData,
}

/// Candidate card in the browse listing: a trimmed user plus the profile
/// attributes shown on the card.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrowseProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub is_profile_approved: bool,
    pub profile: ProfileSummary,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub gender: String,
    pub age: i64,
    pub height: String,
    pub city: String,
    pub state: String,
    pub occupation: String,
    pub highest_education: String,
    pub annual_income: Option<String>,
    pub profile_photo: String,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            gender: profile.gender.clone(),
            age: profile.age,
            height: profile.height.clone(),
            city: profile.city.clone(),
            state: profile.state.clone(),
            occupation: profile.occupation.clone(),
            highest_education: profile.highest_education.clone(),
            annual_income: profile.annual_income.clone(),
            profile_photo: profile.profile_photo.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfilesData {
    pub profiles: Vec<BrowseProfile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfilesResponse {
    pub status: &'static str,
    pub results: usize,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub data: ProfilesData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileData {
    pub profile: Profile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub status: &'static str,
    pub data: ProfileData,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub pending_approvals: i64,
    pub active_profiles: i64,
    pub blocked_users: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardData {
    pub stats: DashboardStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub status: &'static str,
    pub data: DashboardData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersData {
    pub users: Vec<UserWithProfile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub status: &'static str,
    pub results: usize,
    pub data: UsersData,
}
