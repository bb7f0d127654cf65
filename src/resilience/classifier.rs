//! Transient outcome classification.
//!
//! # Base rule
//! - Responses with status >= 500 or 408 are transient
//! - `Transport` failures are transient
//! - Everything else is not, including `Timeout` (opt-in) and `Cancelled` (never)
//!
//! Extra kinds, application tags and status rules are OR-ed onto the base
//! rule by [`ClassifierBuilder`]; the built classifier is immutable.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use hyper::StatusCode;

use crate::outcome::{ErrorKind, Outcome};

type StatusPredicate = Arc<dyn Fn(StatusCode) -> bool + Send + Sync>;

/// Decides whether an outcome qualifies for retry.
#[derive(Clone)]
pub struct TransientClassifier {
    kinds: HashSet<ErrorKind>,
    application_tags: HashSet<Cow<'static, str>>,
    statuses: HashSet<StatusCode>,
    status_predicates: Vec<StatusPredicate>,
}

impl TransientClassifier {
    /// The base HTTP rule with nothing registered on top.
    pub fn http() -> Self {
        ClassifierBuilder::new().build()
    }

    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::new()
    }

    pub fn is_transient(&self, outcome: &Outcome) -> bool {
        match outcome {
            Outcome::Response(response) => self.is_transient_status(response.status),
            Outcome::Failure(failure) => match failure.kind() {
                ErrorKind::Cancelled => false,
                ErrorKind::Application => {
                    self.kinds.contains(&ErrorKind::Application)
                        || failure
                            .tag()
                            .is_some_and(|tag| self.application_tags.contains(tag))
                }
                kind => self.kinds.contains(&kind),
            },
        }
    }

    fn is_transient_status(&self, status: StatusCode) -> bool {
        status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || self.statuses.contains(&status)
            || self.status_predicates.iter().any(|p| p(status))
    }
}

impl Default for TransientClassifier {
    fn default() -> Self {
        Self::http()
    }
}

impl fmt::Debug for TransientClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientClassifier")
            .field("kinds", &self.kinds)
            .field("application_tags", &self.application_tags)
            .field("statuses", &self.statuses)
            .field("status_predicates", &self.status_predicates.len())
            .finish()
    }
}

/// Accumulates opt-in rules before freezing them into a classifier.
pub struct ClassifierBuilder {
    kinds: HashSet<ErrorKind>,
    application_tags: HashSet<Cow<'static, str>>,
    statuses: HashSet<StatusCode>,
    status_predicates: Vec<StatusPredicate>,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self {
            kinds: HashSet::from([ErrorKind::Transport]),
            application_tags: HashSet::new(),
            statuses: HashSet::new(),
            status_predicates: Vec::new(),
        }
    }

    /// Treat every failure of `kind` as transient.
    pub fn or_kind(mut self, kind: ErrorKind) -> Self {
        if kind == ErrorKind::Cancelled {
            tracing::warn!("Ignoring request to retry cancelled calls");
            return self;
        }
        self.kinds.insert(kind);
        self
    }

    /// Treat application failures carrying `tag` as transient.
    pub fn or_application(mut self, tag: impl Into<Cow<'static, str>>) -> Self {
        self.application_tags.insert(tag.into());
        self
    }

    pub fn or_status(mut self, status: StatusCode) -> Self {
        self.statuses.insert(status);
        self
    }

    pub fn or_status_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(StatusCode) -> bool + Send + Sync + 'static,
    {
        self.status_predicates.push(Arc::new(predicate));
        self
    }

    pub fn build(self) -> TransientClassifier {
        TransientClassifier {
            kinds: self.kinds,
            application_tags: self.application_tags,
            statuses: self.statuses,
            status_predicates: self.status_predicates,
        }
    }
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Failure, HttpResponse};

    fn status(code: u16) -> Outcome {
        HttpResponse::new(StatusCode::from_u16(code).unwrap(), "").into()
    }

    fn failure(kind: ErrorKind) -> Outcome {
        Failure::new(kind).into()
    }

    fn app(tag: &'static str) -> Outcome {
        Failure::application(tag, std::io::Error::other("app")).into()
    }

    #[test]
    fn server_errors_and_request_timeout_are_transient() {
        let c = TransientClassifier::http();
        assert!(c.is_transient(&status(500)));
        assert!(c.is_transient(&status(503)));
        assert!(c.is_transient(&status(599)));
        assert!(c.is_transient(&status(408)));
    }

    #[test]
    fn success_and_client_errors_are_not_transient() {
        let c = TransientClassifier::http();
        assert!(!c.is_transient(&status(200)));
        assert!(!c.is_transient(&status(404)));
        assert!(!c.is_transient(&status(429)));
    }

    #[test]
    fn base_rule_covers_transport_only() {
        let c = TransientClassifier::http();
        assert!(c.is_transient(&failure(ErrorKind::Transport)));
        assert!(!c.is_transient(&failure(ErrorKind::Timeout)));
        assert!(!c.is_transient(&failure(ErrorKind::Protocol)));
        assert!(!c.is_transient(&app("invalid-handler")));
    }

    #[test]
    fn timeout_requires_opt_in() {
        let c = TransientClassifier::builder().or_kind(ErrorKind::Timeout).build();
        assert!(c.is_transient(&failure(ErrorKind::Timeout)));
    }

    #[test]
    fn application_tags_are_matched_individually() {
        let c = TransientClassifier::builder()
            .or_application("invalid-handler")
            .build();
        assert!(c.is_transient(&app("invalid-handler")));
        assert!(!c.is_transient(&app("other-handler")));
    }

    #[test]
    fn application_kind_covers_every_tag() {
        let c = TransientClassifier::builder()
            .or_kind(ErrorKind::Application)
            .build();
        assert!(c.is_transient(&app("anything")));
    }

    #[test]
    fn cancelled_is_never_transient() {
        let c = TransientClassifier::builder()
            .or_kind(ErrorKind::Cancelled)
            .build();
        assert!(!c.is_transient(&failure(ErrorKind::Cancelled)));
    }

    #[test]
    fn extra_status_rules_are_ored() {
        let c = TransientClassifier::builder()
            .or_status(StatusCode::TOO_MANY_REQUESTS)
            .or_status_if(|s| s == StatusCode::CONFLICT)
            .build();
        assert!(c.is_transient(&status(429)));
        assert!(c.is_transient(&status(409)));
        assert!(c.is_transient(&status(500)));
        assert!(!c.is_transient(&status(404)));
    }
}
