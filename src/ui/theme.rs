use ratatui::style::Color;

use crate::calendar::{SlotState, Viewer};

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub title: Color,
    pub selected_bg: Color,
    pub selected_fg: Color,
    pub today: Color,
    pub weekday_header: Color,
    pub inactive_day: Color,
    pub status_bar: Color,
    pub error: Color,
    pub success: Color,
    pub available: Color,
    pub booked: Color,
    pub cancelled: Color,
    pub not_available: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStyle {
    pub label: &'static str,
    pub color: Color,
    pub interactive: bool,
    pub banner: bool,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            name: "default".to_string(),
            title: Color::Cyan,
            selected_bg: Color::Blue,
            selected_fg: Color::White,
            today: Color::Green,
            weekday_header: Color::Yellow,
            inactive_day: Color::DarkGray,
            status_bar: Color::White,
            error: Color::Red,
            success: Color::Green,
            available: Color::Green,
            booked: Color::Rgb(255, 191, 0),
            cancelled: Color::Red,
            not_available: Color::DarkGray,
        }
    }

    pub fn gruvbox() -> Self {
        Self {
            name: "gruvbox".to_string(),
            title: Color::Rgb(251, 184, 108),
            selected_bg: Color::Rgb(60, 56, 54),
            selected_fg: Color::Rgb(235, 219, 178),
            today: Color::Rgb(184, 187, 38),
            weekday_header: Color::Rgb(254, 128, 25),
            inactive_day: Color::Rgb(146, 131, 116),
            status_bar: Color::Rgb(235, 219, 178),
            error: Color::Rgb(251, 73, 52),
            success: Color::Rgb(184, 187, 38),
            available: Color::Rgb(184, 187, 38),
            booked: Color::Rgb(250, 189, 47),
            cancelled: Color::Rgb(251, 73, 52),
            not_available: Color::Rgb(102, 92, 84),
        }
    }

    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            title: Color::Rgb(136, 192, 208),
            selected_bg: Color::Rgb(59, 66, 82),
            selected_fg: Color::Rgb(236, 239, 244),
            today: Color::Rgb(163, 190, 140),
            weekday_header: Color::Rgb(235, 203, 139),
            inactive_day: Color::Rgb(76, 86, 106),
            status_bar: Color::Rgb(216, 222, 233),
            error: Color::Rgb(191, 97, 106),
            success: Color::Rgb(163, 190, 140),
            available: Color::Rgb(163, 190, 140),
            booked: Color::Rgb(235, 203, 139),
            cancelled: Color::Rgb(191, 97, 106),
            not_available: Color::Rgb(76, 86, 106),
        }
    }

    pub fn get_by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "gruvbox" => Self::gruvbox(),
            "nord" => Self::nord(),
            _ => Self::default_theme(),
        }
    }

    pub fn available_themes() -> Vec<&'static str> {
        vec!["default", "gruvbox", "nord"]
    }

    /// The fixed colour/label table. Cancelled slots only ever reach a
    /// requester, since the fixer sees them as available again.
    pub fn slot_style(&self, state: SlotState, viewer: &Viewer) -> SlotStyle {
        match state {
            SlotState::Available => SlotStyle {
                label: "DISPONIBLE",
                color: self.available,
                interactive: true,
                banner: false,
            },
            SlotState::Booked => SlotStyle {
                label: match viewer {
                    Viewer::Fixer => "RESERVADO",
                    Viewer::Requester { .. } => "MI RESERVA",
                },
                color: self.booked,
                interactive: true,
                banner: false,
            },
            SlotState::CancelledByFixer => SlotStyle {
                label: "CANCELADO POR EL FIXER",
                color: self.cancelled,
                interactive: false,
                banner: true,
            },
            SlotState::CancelledByRequester => SlotStyle {
                label: "CANCELADO",
                color: self.cancelled,
                interactive: false,
                banner: false,
            },
            SlotState::NotAvailable => SlotStyle {
                label: "NO DISPONIBLE",
                color: self.not_available,
                interactive: false,
                banner: false,
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}
