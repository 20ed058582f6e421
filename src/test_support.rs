//! In-memory fetcher and fixtures shared by unit tests

use crate::error::UpstreamFailure;
use crate::http::JsonFetcher;
use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Fail(UpstreamFailure),
}

#[derive(Debug, Clone)]
struct Route {
    path_fragment: String,
    reply: Reply,
    delay: Option<Duration>,
}

/// Answers by matching a fragment of the URL path and records every request
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingFetcher {
    routes: Vec<Route>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl RecordingFetcher {
    pub(crate) fn with_response(mut self, path_fragment: &str, body: Value) -> Self {
        self.routes.push(Route {
            path_fragment: path_fragment.to_string(),
            reply: Reply::Json(body),
            delay: None,
        });
        self
    }

    pub(crate) fn with_failure(mut self, path_fragment: &str, failure: UpstreamFailure) -> Self {
        self.routes.push(Route {
            path_fragment: path_fragment.to_string(),
            reply: Reply::Fail(failure),
            delay: None,
        });
        self
    }

    /// Delay the most recently added route
    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        if let Some(route) = self.routes.last_mut() {
            route.delay = Some(delay);
        }
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl JsonFetcher for RecordingFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, UpstreamFailure> {
        self.requests.lock().unwrap().push(url.to_string());

        let path = url.split('?').next().unwrap_or(url);
        let Some(route) = self
            .routes
            .iter()
            .find(|route| path.contains(&route.path_fragment))
        else {
            return Err(UpstreamFailure::Status(404));
        };

        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }

        match &route.reply {
            Reply::Json(body) => Ok(body.clone()),
            Reply::Fail(failure) => Err(failure.clone()),
        }
    }
}

/// `count` consecutive hourly Open-Meteo timestamps starting at midnight of `date`
pub(crate) fn hourly_times(date: &str, count: usize) -> Vec<String> {
    let start = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..count)
        .map(|i| {
            (start + TimeDelta::hours(i as i64))
                .format("%Y-%m-%dT%H:%M")
                .to_string()
        })
        .collect()
}
