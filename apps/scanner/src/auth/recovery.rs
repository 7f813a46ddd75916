//! Password reset tickets.
//!
//! A ticket is a random single-use token bound to one email address with a
//! fixed lifetime. There is no mail transport, so the reset link is written
//! to the log for an operator to hand over.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;

#[derive(Debug, Clone)]
struct ResetTicket {
    email: String,
    expires_at: DateTime<Utc>,
}

pub struct RecoveryService {
    ttl: Duration,
    tickets: Mutex<HashMap<String, ResetTicket>>,
}

impl RecoveryService {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            tickets: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a ticket for `email` and returns its token (64 hex chars).
    /// Expired tickets are swept on every issue.
    pub fn issue(&self, email: &str) -> String {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        let token = hex::encode(bytes);
        let now = Utc::now();
        let lifetime = chrono::Duration::seconds(self.ttl.as_secs() as i64);

        let mut tickets = self.tickets.lock();
        tickets.retain(|_, t| t.expires_at > now);
        tickets.insert(
            token.clone(),
            ResetTicket {
                email: email.to_string(),
                expires_at: now + lifetime,
            },
        );
        token
    }

    /// True while the ticket exists and has not expired. Does not consume it.
    pub fn is_valid(&self, token: &str) -> bool {
        self.tickets
            .lock()
            .get(token)
            .is_some_and(|t| t.expires_at > Utc::now())
    }

    /// Removes the ticket and returns its email if it was still valid.
    pub fn consume(&self, token: &str) -> Option<String> {
        let ticket = self.tickets.lock().remove(token)?;
        (ticket.expires_at > Utc::now()).then_some(ticket.email)
    }
}
