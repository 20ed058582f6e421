//! Lookup session - the single "currently displayed" result slot
//!
//! Every lookup is tagged with a strictly increasing id. Only the outcome of
//! the most recently issued lookup is applied; anything older arriving late
//! is discarded.

use crate::error::ForecastError;
use crate::models::ForecastReport;
use tracing::{debug, warn};

/// Lifecycle of the displayed result: Idle → Pending → terminal outcome
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupOutcome {
    /// No lookup issued yet
    #[default]
    Idle,
    /// Lookup in flight
    Pending,
    Success(Box<ForecastReport>),
    NotFound { query: String },
    InvalidInput(String),
    UpstreamFailure(String),
}

impl LookupOutcome {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn report(&self) -> Option<&ForecastReport> {
        match self {
            Self::Success(report) => Some(report),
            _ => None,
        }
    }
}

impl From<Result<ForecastReport, ForecastError>> for LookupOutcome {
    fn from(result: Result<ForecastReport, ForecastError>) -> Self {
        match result {
            Ok(report) => Self::Success(Box::new(report)),
            Err(ForecastError::NotFound { query }) => Self::NotFound { query },
            Err(ForecastError::InvalidInput { message }) => Self::InvalidInput(message),
            Err(err) => Self::UpstreamFailure(err.user_message()),
        }
    }
}

/// Handle for one issued lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupTicket(u64);

impl LookupTicket {
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Owns the displayed outcome and the lookup sequence
#[derive(Debug, Default)]
pub struct LookupSession {
    last_issued: u64,
    outcome: LookupOutcome,
}

impl LookupSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new lookup and mark the slot pending
    pub fn begin(&mut self) -> LookupTicket {
        self.last_issued += 1;
        self.outcome = LookupOutcome::Pending;
        debug!("Issued lookup #{}", self.last_issued);
        LookupTicket(self.last_issued)
    }

    /// Apply an outcome if `ticket` is the latest lookup; returns whether it was applied
    pub fn resolve(&mut self, ticket: LookupTicket, outcome: LookupOutcome) -> bool {
        if ticket.0 != self.last_issued {
            warn!(
                "Discarding stale result of lookup #{} (latest is #{})",
                ticket.0, self.last_issued
            );
            return false;
        }
        self.outcome = outcome;
        true
    }

    #[must_use]
    pub fn outcome(&self) -> &LookupOutcome {
        &self.outcome
    }

    #[must_use]
    pub fn latest(&self) -> Option<LookupTicket> {
        (self.last_issued > 0).then_some(LookupTicket(self.last_issued))
    }
}
