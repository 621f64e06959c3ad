use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::calendar::{
    Appointment, AppointmentDetails, CreatedAppointment, Location, Modality, NewAppointment,
    Party, ScheduleRecord, ScheduleState, YearMonth,
};
use crate::scheduling::clock::BusinessPolicy;
use crate::scheduling::form::AppointmentPatch;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Slot already taken: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ApiError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }

    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::HttpError(error)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotLookup {
    pub fixer_id: String,
    pub requester_id: String,
    pub starting_time: DateTime<FixedOffset>,
}

impl SlotLookup {
    pub fn appointment_date(&self) -> NaiveDate {
        self.starting_time.date_naive()
    }

    pub fn start_hour(&self) -> u32 {
        self.starting_time.hour()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentApi: Send + Sync {
    async fn fetch_schedules(
        &self,
        fixer_id: &str,
        month: YearMonth,
    ) -> Result<Vec<ScheduleRecord>, ApiError>;

    async fn fetch_appointment(&self, lookup: &SlotLookup) -> Result<Appointment, ApiError>;

    async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<CreatedAppointment, ApiError>;

    async fn update_appointment(
        &self,
        appointment_id: &str,
        patch: &AppointmentPatch,
    ) -> Result<(), ApiError>;
}

#[derive(Debug, Serialize)]
struct CreateAppointmentBody<'a> {
    id_fixer: &'a str,
    id_requester: &'a str,
    selected_date: String,
    starting_time: String,
    finishing_time: String,
    schedule_state: &'static str,
    appointment_type: &'static str,
    appointment_description: &'a str,
    current_requester_name: &'a str,
    current_requester_phone: &'a str,
    link_id: Option<&'a str>,
    display_name_location: Option<&'a str>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AppointmentRecord {
    #[serde(alias = "_id")]
    id: Option<Value>,
    id_fixer: Option<String>,
    id_requester: Option<String>,
    starting_time: String,
    finishing_time: Option<String>,
    schedule_state: Option<String>,
    appointment_type: Option<String>,
    appointment_description: Option<String>,
    current_requester_name: Option<String>,
    current_requester_phone: Option<String>,
    link_id: Option<String>,
    display_name_location: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    cancelled_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModalFormResponse {
    Wrapped { appointment: AppointmentRecord },
    Bare(AppointmentRecord),
}

#[derive(Debug, Deserialize)]
struct RawScheduleRecord {
    starting_time: String,
    finishing_time: Option<String>,
    schedule_state: String,
    #[serde(alias = "requester_id")]
    id_requester: Option<String>,
    cancelled_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SchedulesResponse {
    List(Vec<RawScheduleRecord>),
    Wrapped { schedules: Vec<RawScheduleRecord> },
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    #[serde(alias = "_id", alias = "insertedId", alias = "appointment_id")]
    id: Option<Value>,
    appointment: Option<CreatedInner>,
}

#[derive(Debug, Deserialize)]
struct CreatedInner {
    #[serde(alias = "_id")]
    id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "error", alias = "msg")]
    message: Option<String>,
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_party(value: Option<&str>) -> Option<Party> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "fixer" => Some(Party::Fixer),
        "requester" => Some(Party::Requester),
        _ => None,
    }
}

pub struct AppointmentClient {
    base_url: String,
    client: reqwest::Client,
    policy: BusinessPolicy,
}

impl AppointmentClient {
    pub fn new(base_url: impl Into<String>, policy: BusinessPolicy) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            policy,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => self.client = client,
            Err(e) => tracing::warn!("Keeping default HTTP client, timeout not applied: {}", e),
        }
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn parse_time(&self, value: &str, field: &str) -> Result<DateTime<FixedOffset>, ApiError> {
        self.policy
            .parse_backend(value)
            .ok_or_else(|| ApiError::ParseError(format!("Invalid {}: {}", field, value)))
    }

    fn convert_schedule_record(&self, raw: RawScheduleRecord) -> Result<ScheduleRecord, ApiError> {
        let schedule_state = ScheduleState::parse(&raw.schedule_state).ok_or_else(|| {
            ApiError::ParseError(format!("Unknown schedule_state: {}", raw.schedule_state))
        })?;
        let starting_time = self.parse_time(&raw.starting_time, "starting_time")?;
        let finishing_time = match raw.finishing_time.as_deref() {
            Some(value) => self.parse_time(value, "finishing_time")?,
            None => starting_time + chrono::Duration::hours(1),
        };

        Ok(ScheduleRecord {
            starting_time,
            finishing_time,
            schedule_state,
            requester_id: raw.id_requester,
            cancelled_by: parse_party(raw.cancelled_by.as_deref()),
        })
    }

    fn convert_appointment(
        &self,
        record: AppointmentRecord,
        lookup: &SlotLookup,
    ) -> Result<Appointment, ApiError> {
        let id = record
            .id
            .as_ref()
            .and_then(id_string)
            .ok_or_else(|| ApiError::ParseError("Missing appointment id".to_string()))?;
        let starting_time = self.parse_time(&record.starting_time, "starting_time")?;
        let finishing_time = match record.finishing_time.as_deref() {
            Some(value) => self.parse_time(value, "finishing_time")?,
            None => starting_time + chrono::Duration::hours(1),
        };
        let schedule_state = match record.schedule_state.as_deref() {
            Some(value) => ScheduleState::parse(value)
                .ok_or_else(|| ApiError::ParseError(format!("Unknown schedule_state: {}", value)))?,
            None => ScheduleState::Booked,
        };

        let link = record.link_id.filter(|l| !l.trim().is_empty());
        let kind = record.appointment_type.as_deref().map(str::to_ascii_lowercase);
        let modality = match (kind.as_deref(), link, record.lat.zip(record.lon)) {
            (Some("virtual") | None, Some(meeting_link), _) => Modality::Virtual { meeting_link },
            (Some("presential") | None, _, Some((lat, lon))) => Modality::Presential {
                location: Location {
                    lat,
                    lon,
                    address: record.display_name_location.unwrap_or_default(),
                },
            },
            (kind, _, _) => {
                return Err(ApiError::ParseError(format!(
                    "Appointment {} has inconsistent modality {:?}",
                    id, kind
                )));
            }
        };

        Ok(Appointment {
            id,
            fixer_id: record.id_fixer.unwrap_or_else(|| lookup.fixer_id.clone()),
            requester_id: record.id_requester.unwrap_or_else(|| lookup.requester_id.clone()),
            starting_time,
            finishing_time,
            details: AppointmentDetails {
                client: record.current_requester_name.unwrap_or_default(),
                contact: record.current_requester_phone.unwrap_or_default(),
                description: record.appointment_description.unwrap_or_default(),
                modality,
            },
            schedule_state,
            cancelled_by: parse_party(record.cancelled_by.as_deref()),
        })
    }

    fn create_body<'a>(&self, appointment: &'a NewAppointment) -> CreateAppointmentBody<'a> {
        let details = &appointment.details;
        let location = details.modality.location();
        CreateAppointmentBody {
            id_fixer: &appointment.fixer_id,
            id_requester: &appointment.requester_id,
            selected_date: appointment.selected_date().format("%Y-%m-%d").to_string(),
            starting_time: self.policy.to_backend(appointment.starting_time),
            finishing_time: self.policy.to_backend(appointment.finishing_time),
            schedule_state: ScheduleState::Booked.as_str(),
            appointment_type: details.modality.kind(),
            appointment_description: &details.description,
            current_requester_name: &details.client,
            current_requester_phone: &details.contact,
            link_id: details.modality.meeting_link(),
            display_name_location: location.map(|l| l.address.as_str()),
            lat: location.map(|l| l.lat),
            lon: location.map(|l| l.lon),
        }
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        subject: &str,
    ) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from_transport)?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());

        if status == 409 {
            tracing::warn!("Conflict on {}: {}", subject, body);
            return Err(ApiError::Conflict(
                message.unwrap_or_else(|| "this slot was just taken".to_string()),
            ));
        }

        if status == 404 {
            tracing::error!("Not found: {}", subject);
            return Err(ApiError::NotFound(subject.to_string()));
        }

        tracing::error!("Request for {} failed. Status: {}, Body: {}", subject, status, body);
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: message
                .unwrap_or_else(|| format!("The scheduling service answered with status {}", status)),
        })
    }
}

#[async_trait]
impl AppointmentApi for AppointmentClient {
    async fn fetch_schedules(
        &self,
        fixer_id: &str,
        month: YearMonth,
    ) -> Result<Vec<ScheduleRecord>, ApiError> {
        let url = format!("{}/bookings/fixer/{}/schedules/{}", self.base_url, fixer_id, month);

        tracing::info!("Fetching schedules for fixer {} in {}", fixer_id, month);

        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        tracing::info!("Fetch schedules response status: {}", response.status());
        let body = self.check_status(response, &url).await?;

        let raw = match serde_json::from_str::<SchedulesResponse>(&body)
            .map_err(|e| ApiError::ParseError(format!("Invalid schedules payload: {}", e)))?
        {
            SchedulesResponse::List(records) => records,
            SchedulesResponse::Wrapped { schedules } => schedules,
        };

        let records = raw
            .into_iter()
            .map(|r| self.convert_schedule_record(r))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| tracing::error!("Rejecting schedules for fixer {}: {}", fixer_id, e))?;

        tracing::info!("Fetched {} schedule records", records.len());
        Ok(records)
    }

    async fn fetch_appointment(&self, lookup: &SlotLookup) -> Result<Appointment, ApiError> {
        let url = format!("{}/api/crud_read/appointments/get_modal_form", self.base_url);
        let date = lookup.appointment_date().format("%Y-%m-%d").to_string();
        let hour = lookup.start_hour().to_string();

        tracing::info!("Fetching appointment of fixer {} at {} {}:00", lookup.fixer_id, date, hour);

        let response = self.client
            .get(&url)
            .query(&[
                ("fixer_id", lookup.fixer_id.as_str()),
                ("requester_id", lookup.requester_id.as_str()),
                ("appointment_date", date.as_str()),
                ("start_hour", hour.as_str()),
            ])
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let body = self.check_status(response, "appointment for slot").await?;

        let record = match serde_json::from_str::<ModalFormResponse>(&body)
            .map_err(|e| ApiError::ParseError(format!("Invalid appointment payload: {}", e)))?
        {
            ModalFormResponse::Wrapped { appointment } => appointment,
            ModalFormResponse::Bare(record) => record,
        };

        self.convert_appointment(record, lookup)
    }

    async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<CreatedAppointment, ApiError> {
        let url = format!("{}/api/crud_create/appointments/create", self.base_url);
        let body = self.create_body(appointment);

        tracing::info!("Creating appointment for fixer {} at {}", appointment.fixer_id, appointment.starting_time);
        tracing::debug!("POST {} with payload: {:?}", url, body);

        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        tracing::info!("Create appointment response status: {}", response.status());
        let body = self.check_status(response, "appointment creation").await?;

        let created: CreatedResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::ParseError(format!("Invalid create response: {}", e)))?;
        let id = created
            .id
            .as_ref()
            .and_then(id_string)
            .or_else(|| created.appointment.as_ref()?.id.as_ref().and_then(id_string))
            .ok_or_else(|| ApiError::ParseError("Create response has no appointment id".to_string()))?;

        tracing::info!("Appointment created successfully with ID: {}", id);
        Ok(CreatedAppointment { id })
    }

    async fn update_appointment(
        &self,
        appointment_id: &str,
        patch: &AppointmentPatch,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/crud_update/appointments/update_by_id", self.base_url);

        tracing::info!("Updating appointment {} fields {:?}", appointment_id, patch.changed_fields());

        let response = self.client
            .put(&url)
            .query(&[("id", appointment_id)])
            .json(patch)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        tracing::info!("Update appointment response status: {}", response.status());
        self.check_status(response, &format!("appointment {}", appointment_id)).await?;

        tracing::info!("Appointment {} updated successfully", appointment_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn policy() -> BusinessPolicy {
        BusinessPolicy::bolivia()
    }

    fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
        policy().business_offset.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap()
    }

    fn virtual_request() -> NewAppointment {
        NewAppointment::at(
            "fixer-1",
            "req-1",
            at(14, 10),
            AppointmentDetails {
                client: "Maria Lopez".to_string(),
                contact: "71234567".to_string(),
                description: "Broken tap".to_string(),
                modality: Modality::Virtual {
                    meeting_link: "https://meet.google.com/abc-defg-hij".to_string(),
                },
            },
        )
    }

    fn lookup() -> SlotLookup {
        SlotLookup {
            fixer_id: "fixer-1".to_string(),
            requester_id: "req-1".to_string(),
            starting_time: at(14, 10),
        }
    }

    #[test]
    fn client_trims_trailing_slash_from_base_url() {
        let client = AppointmentClient::new("http://localhost:8080/", policy());
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn create_sends_full_body_with_backend_times() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/crud_create/appointments/create"))
            .and(body_json(json!({
                "id_fixer": "fixer-1",
                "id_requester": "req-1",
                "selected_date": "2025-01-14",
                "starting_time": "2025-01-14T14:00:00.000Z",
                "finishing_time": "2025-01-14T15:00:00.000Z",
                "schedule_state": "booked",
                "appointment_type": "virtual",
                "appointment_description": "Broken tap",
                "current_requester_name": "Maria Lopez",
                "current_requester_phone": "71234567",
                "link_id": "https://meet.google.com/abc-defg-hij",
                "display_name_location": null,
                "lat": null,
                "lon": null
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "_id": "apt-42" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let created = client.create_appointment(&virtual_request()).await.unwrap();

        assert_eq!(created.id, "apt-42");
    }

    #[tokio::test]
    async fn create_accepts_wrapped_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "appointment": { "_id": 7 } })),
            )
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let created = client.create_appointment(&virtual_request()).await.unwrap();

        assert_eq!(created.id, "7");
    }

    #[tokio::test]
    async fn create_conflict_is_reported_as_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "message": "Slot taken" })))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let err = client.create_appointment(&virtual_request()).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "Slot already taken: Slot taken");
    }

    #[tokio::test]
    async fn backend_field_error_is_passed_through_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "selected_date is invalid" })),
            )
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let err = client.create_appointment(&virtual_request()).await.unwrap_err();

        assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
        assert_eq!(err.to_string(), "selected_date is invalid");
    }

    #[tokio::test]
    async fn server_error_without_message_gets_generic_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let err = client.create_appointment(&virtual_request()).await.unwrap_err();

        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bookings/fixer/fixer-1/schedules/2025-01"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let err = client
            .fetch_schedules("fixer-1", YearMonth::new(2025, 1).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[tokio::test]
    async fn schedules_are_parsed_into_business_time() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bookings/fixer/fixer-1/schedules/2025-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "starting_time": "2025-01-14T14:00:00.000Z",
                    "finishing_time": "2025-01-14T15:00:00.000Z",
                    "schedule_state": "booked",
                    "id_requester": "req-1"
                },
                {
                    "starting_time": "2025-01-15T18:00:00.000Z",
                    "finishing_time": "2025-01-15T19:00:00.000Z",
                    "schedule_state": "cancelled",
                    "cancelled_by": "requester"
                }
            ])))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let records = client
            .fetch_schedules("fixer-1", YearMonth::new(2025, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].starting_time, at(14, 10));
        assert_eq!(records[0].requester_id.as_deref(), Some("req-1"));
        assert_eq!(records[1].schedule_state, ScheduleState::Cancelled);
        assert_eq!(records[1].cancelled_by, Some(Party::Requester));
    }

    #[tokio::test]
    async fn one_unreadable_record_fails_the_whole_month() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bookings/fixer/fixer-1/schedules/2025-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "starting_time": "2025-01-14T15:00:00.000Z",
                    "schedule_state": "booked",
                    "id_requester": "req-2"
                },
                {
                    "starting_time": "2025-01-14 garbage",
                    "schedule_state": "booked",
                    "id_requester": "req-1"
                }
            ])))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let err = client
            .fetch_schedules("fixer-1", YearMonth::new(2025, 1).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[tokio::test]
    async fn unknown_schedule_state_fails_the_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "starting_time": "2025-01-16T18:00:00.000Z", "schedule_state": "on_hold" }
            ])))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let err = client
            .fetch_schedules("fixer-1", YearMonth::new(2025, 1).unwrap())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("on_hold"));
    }

    #[tokio::test]
    async fn schedules_accept_wrapped_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "schedules": [
                    { "starting_time": "2025-01-14T12:00:00.000Z", "schedule_state": "booked" }
                ]
            })))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let records = client
            .fetch_schedules("fixer-1", YearMonth::new(2025, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].finishing_time, at(14, 9));
    }

    #[tokio::test]
    async fn modal_form_lookup_sends_slot_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/crud_read/appointments/get_modal_form"))
            .and(query_param("fixer_id", "fixer-1"))
            .and(query_param("requester_id", "req-1"))
            .and(query_param("appointment_date", "2025-01-14"))
            .and(query_param("start_hour", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "appointment": {
                    "_id": "apt-42",
                    "id_fixer": "fixer-1",
                    "id_requester": "req-1",
                    "starting_time": "2025-01-14T14:00:00.000Z",
                    "finishing_time": "2025-01-14T15:00:00.000Z",
                    "schedule_state": "booked",
                    "appointment_type": "presential",
                    "appointment_description": "Broken tap",
                    "current_requester_name": "Maria Lopez",
                    "current_requester_phone": "71234567",
                    "display_name_location": "Av. Heroinas 123",
                    "lat": -17.39,
                    "lon": -66.16
                }
            })))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let appointment = client.fetch_appointment(&lookup()).await.unwrap();

        assert_eq!(appointment.id, "apt-42");
        assert_eq!(appointment.starting_time, at(14, 10));
        assert_eq!(appointment.details.client, "Maria Lopez");
        assert_eq!(
            appointment.details.modality.location().map(|l| l.address.as_str()),
            Some("Av. Heroinas 123")
        );
    }

    #[tokio::test]
    async fn modal_form_with_neither_link_nor_location_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "apt-9",
                "starting_time": "2025-01-14T14:00:00.000Z",
                "appointment_type": "virtual"
            })))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let err = client.fetch_appointment(&lookup()).await.unwrap_err();

        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[tokio::test]
    async fn missing_appointment_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = AppointmentClient::new(server.uri(), policy());
        let err = client.fetch_appointment(&lookup()).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_sends_only_the_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/crud_update/appointments/update_by_id"))
            .and(query_param("id", "apt-42"))
            .and(body_json(json!({ "appointment_description": "Two taps" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let mut patch = AppointmentPatch::default();
        patch.set("appointment_description", "Two taps");

        let client = AppointmentClient::new(server.uri(), policy());
        client.update_appointment("apt-42", &patch).await.unwrap();
    }
}
