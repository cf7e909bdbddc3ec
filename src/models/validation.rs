use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::OnceLock;

const EMAIL_PATTERN: &str = r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$";

fn email_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(pattern) = PATTERN.get() {
        return Ok(pattern);
    }
    let compiled = Regex::new(EMAIL_PATTERN)?;
    Ok(PATTERN.get_or_init(|| compiled))
}

/// Email validation, expects an already trimmed and lower-cased address
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(anyhow!("Email is required"));
    }

    if email.len() > 255 {
        return Err(anyhow!("Email cannot be longer than 255 characters"));
    }

    if !email_pattern()?.is_match(email) {
        return Err(anyhow!("Please enter a valid email"));
    }

    Ok(())
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("Name is required"));
    }
    Ok(())
}

/// Inclusive range check for optional numeric profile fields
pub fn validate_range<T>(value: Option<T>, min: T, max: T, field_name: &str) -> Result<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    match value {
        Some(v) if v < min || v > max => Err(anyhow!(
            "{} must be between {} and {}",
            field_name,
            min,
            max
        )),
        _ => Ok(()),
    }
}

/// `HH:MM`, 24-hour clock
pub fn validate_reminder_time(time: &str) -> Result<()> {
    let valid = match time.split_once(':') {
        Some((hours, minutes)) if hours.len() == 2 && minutes.len() == 2 => {
            matches!(
                (hours.parse::<u8>(), minutes.parse::<u8>()),
                (Ok(h), Ok(m)) if h < 24 && m < 60
            )
        }
        _ => false,
    };

    if !valid {
        return Err(anyhow!("Reminder time must use the HH:MM format"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("first.last@mail.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("test@").is_err());
        assert!(validate_email("test@example.company").is_err());
    }

    #[test]
    fn test_range_validation() {
        assert!(validate_range(Some(25), 13, 100, "Age").is_ok());
        assert!(validate_range(None, 13, 100, "Age").is_ok());
        assert!(validate_range(Some(12), 13, 100, "Age").is_err());
        assert!(validate_range(Some(300.5), 30.0, 300.0, "Weight").is_err());
    }

    #[test]
    fn test_reminder_time_validation() {
        assert!(validate_reminder_time("18:00").is_ok());
        assert!(validate_reminder_time("07:30").is_ok());
        assert!(validate_reminder_time("24:00").is_err());
        assert!(validate_reminder_time("7:30").is_err());
        assert!(validate_reminder_time("evening").is_err());
    }
}
