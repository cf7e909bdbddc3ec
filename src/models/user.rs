use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Level;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "fitness_objective", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    LoseWeight,
    GainMuscle,
    MaintainWeight,
    ImproveEndurance,
    IncreaseFlexibility,
    #[default]
    GeneralHealth,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "training_experience", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Experience {
    #[default]
    Never,
    Occasional,
    Regular,
    Advanced,
}

pub const DEFAULT_AVAILABLE_DAYS: i32 = 3;
pub const DEFAULT_AVAILABLE_MINUTES: i32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub activity_level: Level,
    pub age: Option<i32>,
    pub gender: Gender,
    pub weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub objective: Objective,
    pub experience: Experience,
    pub available_days: i32,
    pub available_minutes: i32,
    pub questionnaire_completed: bool,
    pub questionnaire_score: Option<i32>,
    pub last_access_at: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Daily calorie estimate from the Harris-Benedict equation.
    /// `None` until weight, height and age are all known.
    pub fn recommended_daily_calories(&self) -> Option<i64> {
        let weight = self.weight_kg?;
        let height = self.height_cm?;
        let age = f64::from(self.age?);

        let male = 88.362 + 13.397 * weight + 4.799 * height - 5.677 * age;
        let female = 447.593 + 9.247 * weight + 3.098 * height - 4.330 * age;
        let basal = match self.gender {
            Gender::Male => male,
            Gender::Female => female,
            Gender::Other | Gender::PreferNotToSay => (male + female) / 2.0,
        };

        let activity_factor = match self.activity_level {
            Level::Beginner => 1.375,
            Level::Intermediate => 1.55,
            Level::Advanced => 1.725,
        };
        let daily = (basal * activity_factor).round() as i64;

        Some(match self.objective {
            Objective::LoseWeight => daily - 500,
            Objective::GainMuscle => daily + 300,
            _ => daily,
        })
    }
}

/// Public view of a user, password hash excluded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub activity_level: Level,
    pub age: Option<i32>,
    pub gender: Gender,
    pub weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub objective: Objective,
    pub experience: Experience,
    pub available_days: i32,
    pub available_minutes: i32,
    pub questionnaire_completed: bool,
    pub questionnaire_score: Option<i32>,
    pub last_access_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            activity_level: user.activity_level,
            age: user.age,
            gender: user.gender,
            weight_kg: user.weight_kg,
            target_weight_kg: user.target_weight_kg,
            height_cm: user.height_cm,
            objective: user.objective,
            experience: user.experience,
            available_days: user.available_days,
            available_minutes: user.available_minutes,
            questionnaire_completed: user.questionnaire_completed,
            questionnaire_score: user.questionnaire_score,
            last_access_at: user.last_access_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "hash".to_string(),
            activity_level: Level::Intermediate,
            age: Some(30),
            gender: Gender::Female,
            weight_kg: Some(60.0),
            target_weight_kg: None,
            height_cm: Some(165.0),
            objective: Objective::GeneralHealth,
            experience: Experience::Regular,
            available_days: DEFAULT_AVAILABLE_DAYS,
            available_minutes: DEFAULT_AVAILABLE_MINUTES,
            questionnaire_completed: false,
            questionnaire_score: None,
            last_access_at: now,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_recommended_calories_female() {
        // 447.593 + 554.82 + 511.17 - 129.9 = 1383.683; * 1.55 = 2144.7
        assert_eq!(user().recommended_daily_calories(), Some(2145));
    }

    #[test]
    fn test_recommended_calories_objective_adjustment() {
        let mut u = user();
        u.objective = Objective::LoseWeight;
        assert_eq!(u.recommended_daily_calories(), Some(1645));

        u.objective = Objective::GainMuscle;
        assert_eq!(u.recommended_daily_calories(), Some(2445));
    }

    #[test]
    fn test_recommended_calories_requires_measurements() {
        let mut u = user();
        u.height_cm = None;
        assert_eq!(u.recommended_daily_calories(), None);
    }

    #[test]
    fn test_response_hides_password_hash() {
        let value = serde_json::to_value(UserResponse::from(&user())).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["activityLevel"], "intermediate");
        assert_eq!(value["gender"], "female");
    }
}
