use super::models::{Calendar, CalendarEvent, CalendarListPage, EventsPage};
use crate::config::Config;
use crate::error::{api_error, config_error, ReportResult};
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::{Client, Proxy};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Largest page the events endpoint will return
const EVENTS_PAGE_SIZE: &str = "2500";

/// Read-only access to a user's calendars
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// All calendars visible to the authenticated user
    async fn list_calendars(&self) -> ReportResult<Vec<Calendar>>;

    /// Events of one calendar intersecting `[time_min, time_max)`
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: &DateTime<Tz>,
        time_max: &DateTime<Tz>,
    ) -> ReportResult<Vec<CalendarEvent>>;
}

/// Build the HTTP client shared by the calendar client and the token manager
pub fn build_http_client(config: &Config) -> ReportResult<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(config.request_timeout_secs));

    if let Some(proxy_url) = &config.proxy {
        let proxy = Proxy::all(proxy_url)
            .map_err(|e| config_error(&format!("Invalid proxy '{}': {}", proxy_url, e)))?;
        debug!("Routing calendar traffic through {}", proxy_url);
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| config_error(&format!("Failed to build HTTP client: {}", e)))
}

/// Google Calendar v3 REST client
#[derive(Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(client: Client, base_url: &str, access_token: &str) -> ReportResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| config_error(&format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(config_error(&format!("Invalid API base URL '{}'", base_url)));
        }

        Ok(Self {
            client,
            base_url,
            access_token: access_token.to_string(),
        })
    }

    /// Base URL extended with percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> ReportResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| api_error("API base URL cannot have a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> ReportResult<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| api_error(&format!("Failed to fetch {}: {}", what, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(api_error(&format!(
                "Failed to fetch {}: HTTP {} - {}",
                what, status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| api_error(&format!("Failed to parse {} response: {}", what, e)))
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    async fn list_calendars(&self) -> ReportResult<Vec<Calendar>> {
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.endpoint(&["users", "me", "calendarList"])?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: CalendarListPage = self.get_json(url, "calendars").await?;
            calendars.extend(page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Found {} calendars", calendars.len());
        Ok(calendars)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: &DateTime<Tz>,
        time_max: &DateTime<Tz>,
    ) -> ReportResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let time_min = time_min.to_rfc3339();
        let time_max = time_max.to_rfc3339();

        loop {
            let mut url = self.endpoint(&["calendars", calendar_id, "events"])?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("timeMin", &time_min)
                    .append_pair("timeMax", &time_max)
                    .append_pair("singleEvents", "true")
                    .append_pair("maxResults", EVENTS_PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: EventsPage = self
                .get_json(url, &format!("events for {}", calendar_id))
                .await?;
            events.extend(page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Fetched {} events from {}", events.len(), calendar_id);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_calendar_id() {
        let client = GoogleCalendarClient::new(
            Client::new(),
            "https://www.googleapis.com/calendar/v3",
            "token",
        )
        .unwrap();
        let url = client
            .endpoint(&["calendars", "en.china#holiday@group.v.calendar.google.com", "events"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/en.china%23holiday@group.v.calendar.google.com/events"
        );
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        let client = GoogleCalendarClient::new(Client::new(), "http://localhost:1234/", "token").unwrap();
        let url = client.endpoint(&["users", "me", "calendarList"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:1234/users/me/calendarList");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        assert!(GoogleCalendarClient::new(Client::new(), "not a url", "token").is_err());
    }
}
