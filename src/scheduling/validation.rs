use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

pub const MAX_DESCRIPTION_CHARS: usize = 300;
pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Client,
    Contact,
    Modality,
    MeetingLink,
    Address,
    Coordinates,
    Description,
    Justification,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Client => "Name",
            FormField::Contact => "Phone",
            FormField::Modality => "Modality",
            FormField::MeetingLink => "Meeting link",
            FormField::Address => "Address",
            FormField::Coordinates => "Coordinates",
            FormField::Description => "Description",
            FormField::Justification => "Justification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.label(), self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) need attention", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: FormField, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.push(FieldError { field, message: message.into() });
    }

    pub fn for_field(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn check<T>(&mut self, field: FormField, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.push(field, message);
                None
            }
        }
    }
}

fn name_pattern() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-zÁÉÍÓÚÜÑáéíóúüñ][A-Za-zÁÉÍÓÚÜÑáéíóúüñ .'\-]*$")
            .expect("invalid name regex")
    })
}

fn phone_pattern() -> &'static Regex {
    static PHONE_RE: OnceLock<Regex> = OnceLock::new();
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^(\+?591)?[2-7]\d{7}$").expect("invalid phone regex")
    })
}

fn meeting_link_pattern() -> &'static Regex {
    static MEETING_RE: OnceLock<Regex> = OnceLock::new();
    MEETING_RE.get_or_init(|| {
        Regex::new(
            r"^https://(meet\.google\.com/[a-z]{3}-[a-z]{4}-[a-z]{3}|([a-z0-9-]+\.)?zoom\.us/j/\d{9,11}(\?pwd=[A-Za-z0-9._-]+)?)$",
        )
        .expect("invalid meeting link regex")
    })
}

pub fn validate_client_name(value: &str) -> Result<String, String> {
    let name = value.trim();
    let length = name.chars().count();
    if length < MIN_NAME_CHARS {
        return Err("Enter the client's name".to_string());
    }
    if length > MAX_NAME_CHARS {
        return Err(format!("Use at most {} characters", MAX_NAME_CHARS));
    }
    if !name_pattern().is_match(name) {
        return Err("Only letters, spaces, apostrophes, dots and hyphens are allowed".to_string());
    }
    Ok(name.to_string())
}

pub fn validate_phone(value: &str) -> Result<String, String> {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if compact.is_empty() {
        return Err("Enter a contact phone".to_string());
    }
    if !phone_pattern().is_match(&compact) {
        return Err("Enter an 8-digit phone number, optionally prefixed with +591".to_string());
    }
    Ok(value.trim().to_string())
}

pub fn validate_description(value: &str) -> Result<String, String> {
    let description = value.trim();
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(format!("Use at most {} characters", MAX_DESCRIPTION_CHARS));
    }
    Ok(description.to_string())
}

pub fn validate_meeting_link(value: &str) -> Result<String, String> {
    let link = value.trim();
    if link.is_empty() {
        return Err("A virtual appointment needs a meeting link".to_string());
    }
    if !meeting_link_pattern().is_match(link) {
        return Err("Use a Google Meet or Zoom meeting link".to_string());
    }
    Ok(link.to_string())
}

pub fn validate_address(value: &str) -> Result<String, String> {
    let address = value.trim();
    if address.is_empty() {
        return Err("A presential appointment needs an address".to_string());
    }
    Ok(address.to_string())
}

pub fn parse_coordinates(value: &str) -> Result<(f64, f64), String> {
    let Some((lat, lon)) = value.split_once(',') else {
        return Err("Pick a location on the map (lat,lon)".to_string());
    };
    let lat: f64 = lat.trim().parse().map_err(|_| "Latitude is not a number".to_string())?;
    let lon: f64 = lon.trim().parse().map_err(|_| "Longitude is not a number".to_string())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err("Coordinates are out of range".to_string());
    }
    Ok((lat, lon))
}

pub fn validate_justification(value: &str) -> Result<String, String> {
    let reason = value.trim();
    if reason.is_empty() {
        return Err("Explain why the appointment is being cancelled".to_string());
    }
    Ok(reason.to_string())
}
