use super::models::EventList;
use super::token::TokenManager;
use super::EventQuery;
use crate::config::Config;
use crate::error::{google_calendar_error, DaemonResult};
use reqwest::Client;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use url::Url;

/// Google Calendar REST endpoint
const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    calendar_id: String,
    token_manager: TokenManager,
    client: Client,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    ListEvents(EventQuery, oneshot::Sender<DaemonResult<EventList>>),
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    /// List events matching the query
    pub async fn list_events(&self, query: EventQuery) -> DaemonResult<EventList> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(GoogleCalendarCommand::ListEvents(query, response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .await
            .map_err(|_| google_calendar_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> DaemonResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(config: &Config) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            calendar_id: config.google_calendar_id.clone(),
            token_manager: TokenManager::new(config),
            client: Client::new(),
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::ListEvents(query, response_tx) => {
                    let result = self.list_events(&query).await;
                    let _ = response_tx.send(result);
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }

    /// Fetch every page of the events list for the query
    async fn list_events(&self, query: &EventQuery) -> DaemonResult<EventList> {
        let access_token = self.token_manager.get_access_token().await?;

        let mut merged = EventList::default();
        let mut page_token: Option<String> = None;
        loop {
            let url = self.events_url(query, page_token.as_deref())?;
            let page = self.fetch_page(url, &access_token).await?;

            merged.items.extend(page.items);
            merged.default_reminders = page.default_reminders;
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "Fetched {} events between {} and {}",
            merged.items.len(),
            query.time_min,
            query.time_max
        );
        Ok(merged)
    }

    fn events_url(&self, query: &EventQuery, page_token: Option<&str>) -> DaemonResult<Url> {
        let mut url = Url::parse(API_BASE)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| google_calendar_error("Calendar API URL cannot be a base"))?
            .extend(["calendars", self.calendar_id.as_str(), "events"]);

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("timeMin", &query.time_min.to_rfc3339());
            pairs.append_pair("timeMax", &query.time_max.to_rfc3339());
            if query.single_events {
                pairs.append_pair("singleEvents", "true");
            }
            for event_type in &query.event_types {
                pairs.append_pair("eventTypes", event_type.as_str());
            }
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }

        Ok(url)
    }

    async fn fetch_page(&self, url: Url, access_token: &str) -> DaemonResult<EventList> {
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse events response: {}", e))
        })
    }
}
