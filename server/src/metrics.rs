//! Business metrics for Eventbook.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `eventbook_bookings_total{outcome}` - Booking attempts by outcome
//!   (`admitted`, `already_booked`, `event_full`, `not_found`, `error`)
//! - `eventbook_bookings_cancelled_total` - Cancelled bookings
//! - `eventbook_events_created_total` - Events created
//! - `eventbook_events_deleted_total` - Events deleted
//! - `eventbook_logins_total{outcome}` - Login attempts (`success`, `failure`)
//! - `eventbook_registrations_total{role}` - New accounts by role
//!
//! HTTP request counters and latency histograms come from
//! [`eventbook_web::middleware`].

use eventbook_core::StoreError;
use metrics::describe_counter;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use std::net::SocketAddr;

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "eventbook_bookings_total",
        "Booking attempts by outcome (admitted, already_booked, event_full, not_found, error)"
    );
    describe_counter!(
        "eventbook_bookings_cancelled_total",
        "Total number of cancelled bookings"
    );
    describe_counter!(
        "eventbook_events_created_total",
        "Total number of events created"
    );
    describe_counter!(
        "eventbook_events_deleted_total",
        "Total number of events deleted"
    );
    describe_counter!(
        "eventbook_logins_total",
        "Login attempts by outcome (success, failure)"
    );
    describe_counter!(
        "eventbook_registrations_total",
        "New accounts by role"
    );

    tracing::info!("Business metrics registered");
}

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must run inside the Tokio runtime.
///
/// # Errors
///
/// Returns an error if the bucket configuration is rejected or a recorder is
/// already installed.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )?
        .install()?;

    register_business_metrics();
    tracing::info!(%addr, "Metrics exporter listening at http://{addr}/metrics");
    Ok(())
}

/// Label for a booking attempt's result.
#[must_use]
pub fn booking_outcome(result: Result<(), &StoreError>) -> &'static str {
    match result {
        Ok(()) => "admitted",
        Err(StoreError::AlreadyBooked) => "already_booked",
        Err(StoreError::EventFull) => "event_full",
        Err(StoreError::NotFound { .. }) => "not_found",
        Err(_) => "error",
    }
}

/// Record a booking attempt.
pub fn record_booking_attempt(outcome: &'static str) {
    metrics::counter!("eventbook_bookings_total", "outcome" => outcome).increment(1);
    tracing::debug!(outcome, "Recorded booking attempt");
}

/// Record a cancelled booking.
pub fn record_booking_cancelled() {
    metrics::counter!("eventbook_bookings_cancelled_total").increment(1);
}

/// Record event creation.
pub fn record_event_created() {
    metrics::counter!("eventbook_events_created_total").increment(1);
    tracing::debug!("Recorded event creation");
}

/// Record event deletion.
pub fn record_event_deleted() {
    metrics::counter!("eventbook_events_deleted_total").increment(1);
}

/// Record a login attempt.
pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("eventbook_logins_total", "outcome" => outcome).increment(1);
}

/// Record a new account.
pub fn record_registration(role: &'static str) {
    metrics::counter!("eventbook_registrations_total", "role" => role).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_outcome_labels() {
        assert_eq!(booking_outcome(Ok(())), "admitted");
        assert_eq!(booking_outcome(Err(&StoreError::EventFull)), "event_full");
        assert_eq!(booking_outcome(Err(&StoreError::AlreadyBooked)), "already_booked");
        assert_eq!(
            booking_outcome(Err(&StoreError::not_found("Event"))),
            "not_found"
        );
        assert_eq!(
            booking_outcome(Err(&StoreError::Database("down".into()))),
            "error"
        );
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        register_business_metrics();
        record_booking_attempt("admitted");
        record_event_created();
        record_login(false);
    }
}
