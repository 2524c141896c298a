use serde_json::json;
use tracing::{info, warn};

use crate::model::booking::Booking;

/// Best-effort email relay. Events are fired after the primary operation
/// has committed; a delivery failure is logged and never surfaced to the
/// caller.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl Notifier {
    pub fn new(endpoint: Option<String>) -> Self {
        if endpoint.is_none() {
            info!("NOTIFY_URL not set, notifications disabled");
        }
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Spawn a booking-created event off the request task.
    pub fn booking_created(&self, booking: &Booking, scooter_name: &str) {
        self.dispatch(json!({
            "type": "booking",
            "booking": {
                "id": booking.id,
                "rider": booking.rider_name,
                "riderEmail": booking.rider_email,
                "bike": scooter_name,
                "amount": format!("${}", booking.total_amount),
                "startDate": booking.start_date,
            },
        }));
    }

    /// Spawn a booking-approved event (status moved to Active).
    pub fn booking_approved(&self, booking: &Booking, scooter_name: &str) {
        if booking.rider_email.is_none() {
            return;
        }
        self.dispatch(json!({
            "type": "approval",
            "booking": {
                "id": booking.id,
                "rider": booking.rider_name,
                "riderEmail": booking.rider_email,
                "bike": scooter_name,
            },
        }));
    }

    fn dispatch(&self, event: serde_json::Value) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            let sent = client.post(&endpoint).json(&event).send().await;
            match sent {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => warn!("notification relay returned {}", resp.status()),
                Err(err) => warn!("failed to send notification: {err}"),
            }
        });
    }
}
