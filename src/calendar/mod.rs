pub mod slot;
pub mod appointment;
pub mod schedule;
pub mod year_month;

pub use slot::{Party, Slot, SlotId, SlotState, Viewer};
pub use appointment::{
    Appointment, AppointmentDetails, CreatedAppointment, Location, Modality, NewAppointment,
    ScheduleState,
};
pub use schedule::ScheduleRecord;
pub use year_month::YearMonth;
