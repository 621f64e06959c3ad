pub mod app;
pub mod calendar;
pub mod input;
pub mod scheduling;
pub mod storage;
pub mod sync;
pub mod ui;

pub use app::{AppState, Mode, Pane};
pub use calendar::{Appointment, Slot, SlotState, Viewer};
pub use scheduling::{BookingError, BookingMachine, BookingOutcome, SlotClock, SlotGenerator};
