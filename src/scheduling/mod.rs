pub mod booking;
pub mod clock;
pub mod form;
pub mod generator;
pub mod reconciler;
pub mod validation;

pub use booking::{BookingError, BookingMachine, BookingOutcome, BookingPhase, GuardViolation, RescheduleContext};
pub use clock::{BusinessPolicy, Clock, FixedClock, HourWindow, SlotClock, SystemClock};
pub use form::{AppointmentForm, AppointmentPatch, ModalityInput};
pub use generator::{SlotGenerator, week_start};
pub use reconciler::reconcile;
pub use validation::{FieldError, FormField, ValidationErrors};
