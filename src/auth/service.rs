use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::{hash_password, validate_password_strength, verify_password, PasswordPolicy};
use crate::auth::{
    AuthError, AuthResponse, JwtService, LoginRequest, MeResponse, QuestionnaireRequest, RegisterRequest,
    UpdateProfileRequest, UserSession,
};
use crate::models::{
    validate_email, validate_name, validate_range, User, UserResponse, DEFAULT_AVAILABLE_DAYS,
    DEFAULT_AVAILABLE_MINUTES,
};
use crate::services::questionnaire;
use crate::storage::{StoreError, UserRepository};

#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    users: Arc<dyn UserRepository>,
    password_policy: PasswordPolicy,
    bcrypt_cost: u32,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("jwt_service", &self.jwt_service)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

fn validation(err: anyhow::Error) -> AuthError {
    AuthError::Validation(err.to_string())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Range checks shared by registration and profile updates
struct ProfileRanges {
    age: Option<i32>,
    weight_kg: Option<f64>,
    target_weight_kg: Option<f64>,
    height_cm: Option<f64>,
    available_days: Option<i32>,
    available_minutes: Option<i32>,
}

impl ProfileRanges {
    fn check(&self) -> Result<(), AuthError> {
        validate_range(self.age, 13, 100, "Age").map_err(validation)?;
        validate_range(self.weight_kg, 30.0, 300.0, "Weight").map_err(validation)?;
        validate_range(self.target_weight_kg, 30.0, 300.0, "Target weight").map_err(validation)?;
        validate_range(self.height_cm, 100.0, 250.0, "Height").map_err(validation)?;
        validate_range(self.available_days, 1, 7, "Available days").map_err(validation)?;
        validate_range(self.available_minutes, 15, 180, "Available minutes").map_err(validation)?;
        Ok(())
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt_secret: &str, token_lifetime: Duration, bcrypt_cost: u32) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret, token_lifetime),
            users,
            password_policy: PasswordPolicy::default(),
            bcrypt_cost,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let name = request.name.trim().to_string();
        let email = normalize_email(&request.email);

        validate_name(&name).map_err(validation)?;
        validate_email(&email).map_err(validation)?;
        validate_password_strength(&request.password, &self.password_policy)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        ProfileRanges {
            age: request.age,
            weight_kg: request.weight_kg,
            target_weight_kg: request.target_weight_kg,
            height_cm: request.height_cm,
            available_days: request.available_days,
            available_minutes: request.available_minutes,
        }
        .check()?;

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;
        let now = Utc::now();

        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            activity_level: request.activity_level.unwrap_or_default(),
            age: request.age,
            gender: request.gender.unwrap_or_default(),
            weight_kg: request.weight_kg,
            target_weight_kg: request.target_weight_kg,
            height_cm: request.height_cm,
            objective: request.objective.unwrap_or_default(),
            experience: request.experience.unwrap_or_default(),
            available_days: request.available_days.unwrap_or(DEFAULT_AVAILABLE_DAYS),
            available_minutes: request.available_minutes.unwrap_or(DEFAULT_AVAILABLE_MINUTES),
            questionnaire_completed: false,
            questionnaire_score: None,
            last_access_at: now,
            active: true,
            created_at: now,
            updated_at: now,
        };

        match self.users.insert_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => return Err(AuthError::EmailAlreadyExists),
            Err(err) => return Err(err.into()),
        }

        tracing::info!(user_id = %user.id, "User registered");
        self.issue(&user)
    }

    /// Login user. Unknown emails and wrong passwords are indistinguishable.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&request.email);
        let mut user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Rejected login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.active {
            return Err(AuthError::AccountDisabled);
        }

        let now = Utc::now();
        self.users.touch_last_access(user.id, now).await?;
        user.last_access_at = now;

        self.issue(&user)
    }

    /// Current user plus the daily calorie estimate
    pub fn me(&self, session: &UserSession) -> MeResponse {
        MeResponse {
            success: true,
            user: UserResponse::from(&session.user),
            recommended_daily_calories: session.user.recommended_daily_calories(),
        }
    }

    /// Store a questionnaire result and set the activity level
    pub async fn save_questionnaire(
        &self,
        session: &UserSession,
        request: QuestionnaireRequest,
    ) -> Result<User, AuthError> {
        let score = request
            .score
            .ok_or_else(|| AuthError::Validation("Questionnaire score is required".to_string()))?;

        if !questionnaire::is_valid_score(score) {
            return Err(AuthError::Validation(format!(
                "Questionnaire score must be between {} and {}",
                questionnaire::MIN_SCORE,
                questionnaire::MAX_SCORE
            )));
        }

        let mut user = session.user.clone();
        user.questionnaire_score = Some(score);
        user.questionnaire_completed = true;
        user.activity_level = request
            .level
            .unwrap_or_else(|| questionnaire::level_for_score(score));
        user.updated_at = Utc::now();

        if !self.users.update_user(&user).await? {
            return Err(AuthError::UserNotFound);
        }
        tracing::info!(user_id = %user.id, score, level = %user.activity_level, "Questionnaire saved");

        Ok(user)
    }

    /// Apply a partial profile update with the registration rules
    pub async fn update_profile(
        &self,
        session: &UserSession,
        request: UpdateProfileRequest,
    ) -> Result<User, AuthError> {
        ProfileRanges {
            age: request.age,
            weight_kg: request.weight_kg,
            target_weight_kg: request.target_weight_kg,
            height_cm: request.height_cm,
            available_days: request.available_days,
            available_minutes: request.available_minutes,
        }
        .check()?;

        let mut user = session.user.clone();

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            validate_name(&name).map_err(validation)?;
            user.name = name;
        }
        if request.age.is_some() {
            user.age = request.age;
        }
        if let Some(gender) = request.gender {
            user.gender = gender;
        }
        if request.weight_kg.is_some() {
            user.weight_kg = request.weight_kg;
        }
        if request.target_weight_kg.is_some() {
            user.target_weight_kg = request.target_weight_kg;
        }
        if request.height_cm.is_some() {
            user.height_cm = request.height_cm;
        }
        if let Some(level) = request.activity_level {
            user.activity_level = level;
        }
        if let Some(objective) = request.objective {
            user.objective = objective;
        }
        if let Some(experience) = request.experience {
            user.experience = experience;
        }
        if let Some(days) = request.available_days {
            user.available_days = days;
        }
        if let Some(minutes) = request.available_minutes {
            user.available_minutes = minutes;
        }
        user.updated_at = Utc::now();

        if !self.users.update_user(&user).await? {
            return Err(AuthError::UserNotFound);
        }
        Ok(user)
    }

    /// New token for an authenticated user
    pub fn refresh(&self, session: &UserSession) -> Result<AuthResponse, AuthError> {
        self.issue(&session.user)
    }

    /// Revoke the token the session was authenticated with
    pub async fn logout(&self, session: &UserSession) -> Result<(), AuthError> {
        self.users.revoke_token(&session.jti, session.expires_at).await?;
        tracing::info!(user_id = %session.user_id, "User logged out");
        Ok(())
    }

    /// Validate user session from token
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let claims = self.jwt_service.validate_token(token)?;

        if self.users.is_token_revoked(&claims.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let mut user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.active {
            return Err(AuthError::AccountDisabled);
        }

        let now = Utc::now();
        self.users.touch_last_access(user.id, now).await?;
        user.last_access_at = now;

        let expires_at = DateTime::from_timestamp(claims.exp as i64, 0).ok_or(AuthError::InvalidToken)?;

        Ok(UserSession {
            user_id,
            email: claims.email,
            jti: claims.jti,
            expires_at,
            user,
        })
    }

    fn issue(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let issued = self.jwt_service.create_token(user.id, &user.email)?;

        Ok(AuthResponse {
            success: true,
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.expires_in_seconds(),
            user: UserResponse::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Level;
    use crate::storage::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), "test_secret", Duration::days(7), 4)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "  Ana  ".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            age: Some(30),
            gender: None,
            weight_kg: None,
            target_weight_kg: None,
            height_cm: None,
            objective: None,
            activity_level: None,
            experience: None,
            available_days: None,
            available_minutes: None,
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_and_defaults() {
        let auth = service();
        let response = auth.register(register_request(" Ana@Example.COM ")).await.unwrap();

        assert_eq!(response.user.email, "ana@example.com");
        assert_eq!(response.user.name, "Ana");
        assert_eq!(response.user.activity_level, Level::Beginner);
        assert_eq!(response.user.available_days, 3);
        assert_eq!(response.user.available_minutes, 30);
        assert!(auth.validate_session(&response.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let auth = service();
        auth.register(register_request("ana@example.com")).await.unwrap();

        let err = auth.register(register_request("ANA@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn test_register_validates_fields() {
        let auth = service();

        let mut short_password = register_request("a@example.com");
        short_password.password = "12345".to_string();
        assert!(matches!(
            auth.register(short_password).await,
            Err(AuthError::Validation(_))
        ));

        let mut too_young = register_request("b@example.com");
        too_young.age = Some(12);
        assert!(matches!(auth.register(too_young).await, Err(AuthError::Validation(_))));

        let mut no_name = register_request("c@example.com");
        no_name.name = "   ".to_string();
        assert!(matches!(auth.register(no_name).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let auth = service();
        auth.register(register_request("ana@example.com")).await.unwrap();

        let wrong_password = auth
            .login(LoginRequest {
                email: "ana@example.com".to_string(),
                password: "nope-nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = auth
            .login(LoginRequest {
                email: "bob@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_questionnaire_derives_level_from_score() {
        let auth = service();
        let response = auth.register(register_request("ana@example.com")).await.unwrap();
        let session = auth.validate_session(&response.token).await.unwrap();

        let user = auth
            .save_questionnaire(&session, QuestionnaireRequest { score: Some(20), level: None })
            .await
            .unwrap();
        assert_eq!(user.activity_level, Level::Intermediate);
        assert!(user.questionnaire_completed);

        let err = auth
            .save_questionnaire(&session, QuestionnaireRequest { score: Some(40), level: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let auth = service();
        let response = auth.register(register_request("ana@example.com")).await.unwrap();
        let session = auth.validate_session(&response.token).await.unwrap();

        auth.logout(&session).await.unwrap();
        assert!(matches!(
            auth.validate_session(&response.token).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
