pub mod insert_mode;
pub mod normal_mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Activate,
    Submit,
    CloseDialog,
    CancelBooking,
    ConfirmJustification(String),
    Refresh,
    Quit,
}
