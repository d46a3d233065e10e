//! Checks applied to an extracted candidate record before the info phase may close.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::extractor::info::InfoDraft;
use crate::models::candidate::CandidateInfo;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z0-9]+$").expect("email pattern is a valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Turns a draft into a `CandidateInfo`, or explains every problem found.
pub fn validate_candidate_info(draft: &InfoDraft) -> Result<CandidateInfo, String> {
    let full_name = text_field(draft.full_name.as_ref());
    let email = text_field(draft.email.as_ref());
    let phone = text_field(draft.phone.as_ref());
    let position = text_field(draft.position.as_ref());
    let location = text_field(draft.location.as_ref());
    let experience = draft.experience.as_ref().and_then(experience_years);

    let mut missing = Vec::new();
    for (value, label) in [
        (full_name.is_some(), "full name"),
        (email.is_some(), "email address"),
        (phone.is_some(), "phone number"),
        (draft.experience.is_some(), "years of experience"),
        (position.is_some(), "desired position"),
        (location.is_some(), "current location"),
    ] {
        if !value {
            missing.push(label);
        }
    }

    let mut problems = Vec::new();
    if !missing.is_empty() {
        problems.push(format!("missing {}", missing.join(", ")));
    }
    if let Some(email) = &email {
        if !is_valid_email(email) {
            problems.push(format!("'{email}' is not a valid email address"));
        }
    }
    if draft.experience.is_some() && experience.is_none() {
        problems.push("years of experience must be a number of 0 or more".to_string());
    }

    match (full_name, email, phone, experience, position, location) {
        (Some(full_name), Some(email), Some(phone), Some(experience), Some(position), Some(location))
            if problems.is_empty() =>
        {
            Ok(CandidateInfo {
                full_name,
                email,
                phone,
                experience,
                position,
                location,
            })
        }
        _ => Err(problems.join("; ")),
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn experience_years(value: &Value) -> Option<f64> {
    let years = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (years.is_finite() && years >= 0.0).then_some(years)
}
