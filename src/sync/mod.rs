pub mod api;
pub mod bridge;
pub mod viewport;

#[cfg(test)]
pub(crate) mod in_memory;

pub use api::{ApiError, AppointmentApi, AppointmentClient, SlotLookup};
pub use bridge::{BOOKING_CREATED, BookingCreated, Subscription, SyncBridge};
pub use viewport::{ViewportId, ViewportLoader, ViewportResponse};
