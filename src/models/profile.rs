use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Photo {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PartnerPreferences {
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub min_height: Option<String>,
    pub max_height: Option<String>,
    pub marital_status: Vec<String>,
    pub education: Vec<String>,
    pub occupation: Vec<String>,
    pub country: Vec<String>,
    pub state: Vec<String>,
    pub annual_income: Option<String>,
    pub religion: Vec<String>,
    pub caste: Vec<String>,
    pub mother_tongue: Vec<String>,
    pub diet: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacySettings {
    pub show_phone: bool,
    pub show_email: bool,
    pub show_photos: bool,
    pub show_horoscope: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            show_phone: false,
            show_email: false,
            show_photos: true,
            show_horoscope: true,
        }
    }
}

/// Demographic, cultural, family, lifestyle and partner-preference record,
/// one per user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,

    // Basic information
    pub full_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub age: i64,
    pub height: String,
    pub weight: Option<String>,
    pub marital_status: String,
    pub physical_status: Option<String>,

    // Religious & cultural
    pub religion: Option<String>,
    pub caste: Option<String>,
    pub sub_caste: Option<String>,
    pub gothram: Option<String>,
    pub mother_tongue: Option<String>,
    pub languages_known: Vec<String>,

    // Birth details
    pub time_of_birth: Option<String>,
    pub place_of_birth: Option<String>,

    // Physical attributes
    pub complexion: Option<String>,
    pub body_type: Option<String>,

    // Photos
    pub profile_photo: String,
    pub photos: Vec<Photo>,

    // Contact
    pub phone: String,
    pub email: Option<String>,

    // Location
    pub country: String,
    pub state: String,
    pub city: String,
    pub residency_status: Option<String>,

    // Education & profession
    pub highest_education: String,
    pub education_details: Option<String>,
    pub occupation: String,
    pub employed_in: Option<String>,
    pub annual_income: Option<String>,

    // Family
    pub father_name: Option<String>,
    pub father_occupation: Option<String>,
    pub mother_name: Option<String>,
    pub mother_occupation: Option<String>,
    pub brothers: i64,
    pub brothers_married: i64,
    pub sisters: i64,
    pub sisters_married: i64,
    pub family_type: Option<String>,
    pub family_values: Option<String>,
    pub family_status: Option<String>,

    // Horoscope
    pub star: Option<String>,
    pub rasi: Option<String>,
    pub horoscope_match: bool,

    // Lifestyle
    pub diet: Option<String>,
    pub smoking: Option<String>,
    pub drinking: Option<String>,
    pub hobbies: Option<String>,
    pub interests: Option<String>,

    pub about_me: Option<String>,

    pub partner_preferences: PartnerPreferences,
    pub profile_completeness: i64,
    pub privacy_settings: PrivacySettings,

    pub views: i64,
    pub likes: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Placeholder profile created at registration; the member fills in the
    /// real values later through the upsert endpoint.
    pub fn with_defaults(user_id: Uuid, full_name: &str, phone: &str, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            full_name: full_name.to_string(),
            gender: "Male".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            age: 30,
            height: "5'5\"".to_string(),
            weight: None,
            marital_status: "Never Married".to_string(),
            physical_status: Some("Normal".to_string()),
            religion: None,
            caste: None,
            sub_caste: None,
            gothram: None,
            mother_tongue: None,
            languages_known: Vec::new(),
            time_of_birth: None,
            place_of_birth: None,
            complexion: None,
            body_type: None,
            profile_photo: String::new(),
            photos: Vec::new(),
            phone: phone.to_string(),
            email,
            country: "India".to_string(),
            state: "Tamil Nadu".to_string(),
            city: "Chennai".to_string(),
            residency_status: None,
            highest_education: "Degree".to_string(),
            education_details: None,
            occupation: "Software Engineer".to_string(),
            employed_in: None,
            annual_income: None,
            father_name: None,
            father_occupation: None,
            mother_name: None,
            mother_occupation: None,
            brothers: 0,
            brothers_married: 0,
            sisters: 0,
            sisters_married: 0,
            family_type: None,
            family_values: None,
            family_status: None,
            star: None,
            rasi: None,
            horoscope_match: false,
            diet: None,
            smoking: None,
            drinking: None,
            hobbies: None,
            interests: None,
            about_me: None,
            partner_preferences: PartnerPreferences::default(),
            profile_completeness: 0,
            privacy_settings: PrivacySettings::default(),
            views: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Percentage of the fixed weighted field set that is filled in. Each of
    /// the 17 fields contributes equally; the result is rounded.
    pub fn calculate_completeness(&mut self) -> i64 {
        let filled = [
            !self.full_name.is_empty(),
            !self.gender.is_empty(),
            true, // date_of_birth is always present
            !self.height.is_empty(),
            !self.marital_status.is_empty(),
            !self.profile_photo.is_empty(),
            !self.country.is_empty(),
            !self.state.is_empty(),
            !self.city.is_empty(),
            !self.highest_education.is_empty(),
            !self.occupation.is_empty(),
            has_value(&self.father_name),
            has_value(&self.mother_name),
            has_value(&self.about_me),
            has_value(&self.religion),
            has_value(&self.caste),
            has_value(&self.mother_tongue),
        ];

        let total = filled.len() as f64;
        let completeness: f64 = filled
            .iter()
            .filter(|present| **present)
            .map(|_| 100.0 / total)
            .sum();

        self.profile_completeness = completeness.round() as i64;
        self.profile_completeness
    }
}

fn has_value(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.is_empty())
}
