use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier shared by users and routines
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "activity_level", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    #[serde(alias = "principiante")]
    Beginner,
    #[serde(alias = "intermedio")]
    Intermediate,
    #[serde(alias = "avanzado")]
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid level '{0}', expected beginner, intermediate or advanced")]
pub struct InvalidLevel(pub String);

impl FromStr for Level {
    type Err = InvalidLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "principiante" => Ok(Level::Beginner),
            "intermediate" | "intermedio" => Ok(Level::Intermediate),
            "advanced" | "avanzado" => Ok(Level::Advanced),
            _ => Err(InvalidLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_legacy_names() {
        assert_eq!("intermedio".parse::<Level>().unwrap(), Level::Intermediate);
        assert_eq!("Advanced".parse::<Level>().unwrap(), Level::Advanced);
        assert_eq!(" principiante ".parse::<Level>().unwrap(), Level::Beginner);
        assert!("expert".parse::<Level>().is_err());
    }

    #[test]
    fn test_serde_round_trip_uses_english_names() {
        let json = serde_json::to_string(&Level::Intermediate).unwrap();
        assert_eq!(json, "\"intermediate\"");

        let legacy: Level = serde_json::from_str("\"avanzado\"").unwrap();
        assert_eq!(legacy, Level::Advanced);
    }
}
