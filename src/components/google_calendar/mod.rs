pub mod client;
pub mod models;
pub mod token;

pub use client::{build_http_client, CalendarSource, GoogleCalendarClient};
pub use models::{Calendar, CalendarEvent, EventTime};
pub use token::{StoredToken, TokenManager};
