pub mod adapter;
pub mod day_list;
pub mod grid_view;
pub mod theme;
pub mod week_list;

pub use adapter::{CalendarAdapter, GridScale, SurfaceContext, SurfaceKind};
pub use theme::{SlotStyle, Theme};
