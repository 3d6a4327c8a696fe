// Export components
pub mod google_calendar;
pub mod report;

// Re-export the calendar client
pub use google_calendar::{CalendarSource, GoogleCalendarClient};
// Re-export the reporter
pub use report::Reporter;
