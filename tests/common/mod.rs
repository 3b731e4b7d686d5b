#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use mediagate::config::Credentials;
use mediagate::services::{CacheTtls, Clock};
use secrecy::Secret;
use std::sync::Mutex;

/// Manually advanced clock for exercising TTL behavior.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn default_ttls() -> CacheTtls {
    CacheTtls {
        pending_secs: 900,
        authenticated_secs: 900,
        share_secs: 172_800,
    }
}

pub fn test_credentials() -> Credentials {
    Credentials {
        username: "alice".to_string(),
        password: Secret::new("correct".to_string()),
    }
}
