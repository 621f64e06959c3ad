use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::calendar::{AppointmentDetails, Location, Modality, Party};
use crate::scheduling::validation::{
    FormField, ValidationErrors, parse_coordinates, validate_address, validate_client_name,
    validate_description, validate_meeting_link, validate_phone,
};

/// Raw modality input. Switching kind discards the other kind's input, so
/// a form can never hold both a link and a location.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalityInput {
    Virtual { meeting_link: String },
    Presential { address: String, coordinates: String },
}

impl ModalityInput {
    pub fn virtual_meeting() -> Self {
        ModalityInput::Virtual { meeting_link: String::new() }
    }

    pub fn presential() -> Self {
        ModalityInput::Presential { address: String::new(), coordinates: String::new() }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, ModalityInput::Virtual { .. })
    }

    fn from_modality(modality: &Modality) -> Self {
        match modality {
            Modality::Virtual { meeting_link } => ModalityInput::Virtual {
                meeting_link: meeting_link.clone(),
            },
            Modality::Presential { location } => ModalityInput::Presential {
                address: location.address.clone(),
                coordinates: format!("{},{}", location.lat, location.lon),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentForm {
    pub starting_time: DateTime<FixedOffset>,
    pub client: String,
    pub contact: String,
    pub description: String,
    pub modality: ModalityInput,
    pub active_field: FormField,
    pub errors: ValidationErrors,
}

impl AppointmentForm {
    pub fn new(starting_time: DateTime<FixedOffset>) -> Self {
        Self {
            starting_time,
            client: String::new(),
            contact: String::new(),
            description: String::new(),
            modality: ModalityInput::virtual_meeting(),
            active_field: FormField::Client,
            errors: ValidationErrors::default(),
        }
    }

    pub fn for_details(starting_time: DateTime<FixedOffset>, details: &AppointmentDetails) -> Self {
        Self {
            client: details.client.clone(),
            contact: details.contact.clone(),
            description: details.description.clone(),
            modality: ModalityInput::from_modality(&details.modality),
            ..Self::new(starting_time)
        }
    }

    pub fn toggle_modality(&mut self) {
        self.modality = if self.modality.is_virtual() {
            ModalityInput::presential()
        } else {
            ModalityInput::virtual_meeting()
        };
    }

    pub fn fields(&self) -> Vec<FormField> {
        let mut fields = vec![FormField::Client, FormField::Contact, FormField::Modality];
        match self.modality {
            ModalityInput::Virtual { .. } => fields.push(FormField::MeetingLink),
            ModalityInput::Presential { .. } => {
                fields.push(FormField::Address);
                fields.push(FormField::Coordinates);
            }
        }
        fields.push(FormField::Description);
        fields
    }

    pub fn next_field(&mut self) {
        let fields = self.fields();
        let index = fields.iter().position(|f| *f == self.active_field).unwrap_or(0);
        self.active_field = fields[(index + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields = self.fields();
        let index = fields.iter().position(|f| *f == self.active_field).unwrap_or(0);
        self.active_field = fields[(index + fields.len() - 1) % fields.len()];
    }

    fn active_buffer(&mut self) -> Option<&mut String> {
        match (self.active_field, &mut self.modality) {
            (FormField::Client, _) => Some(&mut self.client),
            (FormField::Contact, _) => Some(&mut self.contact),
            (FormField::Description, _) => Some(&mut self.description),
            (FormField::MeetingLink, ModalityInput::Virtual { meeting_link }) => Some(meeting_link),
            (FormField::Address, ModalityInput::Presential { address, .. }) => Some(address),
            (FormField::Coordinates, ModalityInput::Presential { coordinates, .. }) => {
                Some(coordinates)
            }
            _ => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if self.active_field == FormField::Modality {
            if c == ' ' {
                self.toggle_modality();
            }
            return;
        }
        if let Some(buffer) = self.active_buffer() {
            buffer.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(buffer) = self.active_buffer() {
            buffer.pop();
        }
    }

    pub fn validate(&mut self) -> Result<AppointmentDetails, ValidationErrors> {
        let result = self.check();
        self.errors = match &result {
            Ok(_) => ValidationErrors::default(),
            Err(errors) => errors.clone(),
        };
        result
    }

    fn check(&self) -> Result<AppointmentDetails, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let client = errors.check(FormField::Client, validate_client_name(&self.client));
        let contact = errors.check(FormField::Contact, validate_phone(&self.contact));
        let description = errors.check(FormField::Description, validate_description(&self.description));

        let modality = match &self.modality {
            ModalityInput::Virtual { meeting_link } => errors
                .check(FormField::MeetingLink, validate_meeting_link(meeting_link))
                .map(|meeting_link| Modality::Virtual { meeting_link }),
            ModalityInput::Presential { address, coordinates } => {
                let address = errors.check(FormField::Address, validate_address(address));
                let coordinates = errors.check(FormField::Coordinates, parse_coordinates(coordinates));
                address.zip(coordinates).map(|(address, (lat, lon))| Modality::Presential {
                    location: Location { lat, lon, address },
                })
            }
        };

        match (client, contact, description, modality) {
            (Some(client), Some(contact), Some(description), Some(modality)) if errors.is_empty() => {
                Ok(AppointmentDetails { client, contact, description, modality })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AppointmentPatch(Map<String, Value>);

impl AppointmentPatch {
    pub fn between(original: &AppointmentDetails, updated: &AppointmentDetails) -> Self {
        let mut patch = Self::default();
        if original.client != updated.client {
            patch.set("current_requester_name", updated.client.clone());
        }
        if original.contact != updated.contact {
            patch.set("current_requester_phone", updated.contact.clone());
        }
        if original.description != updated.description {
            patch.set("appointment_description", updated.description.clone());
        }

        match (&original.modality, &updated.modality) {
            (Modality::Virtual { meeting_link: before }, Modality::Virtual { meeting_link: after }) => {
                if before != after {
                    patch.set("link_id", after.clone());
                }
            }
            (Modality::Presential { location: before }, Modality::Presential { location: after }) => {
                if before.address != after.address {
                    patch.set("display_name_location", after.address.clone());
                }
                if before.lat != after.lat || before.lon != after.lon {
                    patch.set("lat", after.lat);
                    patch.set("lon", after.lon);
                }
            }
            (_, Modality::Virtual { meeting_link }) => {
                patch.set("appointment_type", "virtual");
                patch.set("link_id", meeting_link.clone());
                patch.set("display_name_location", Value::Null);
                patch.set("lat", Value::Null);
                patch.set("lon", Value::Null);
            }
            (_, Modality::Presential { location }) => {
                patch.set("appointment_type", "presential");
                patch.set("link_id", Value::Null);
                patch.set("display_name_location", location.address.clone());
                patch.set("lat", location.lat);
                patch.set("lon", location.lon);
            }
        }
        patch
    }

    pub fn cancellation(reason: &str, cancelled_by: Party) -> Self {
        let mut patch = Self::default();
        patch.set("cancellation_reason", reason);
        patch.set("cancelled_by", cancelled_by.as_str());
        patch
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn changed_fields(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
