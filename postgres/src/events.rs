//! `events` table and the filtered listing query.
//!
//! Every read is a `LEFT JOIN bookings ... GROUP BY e.id` so the attendee
//! count is always derived, never stored.

use crate::rows::{EVENT_COLUMNS, EventColumns, EventCreatorRow, EventRow, capacity_column};
use crate::{PostgresStore, db_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventbook_core::repository::EventRepository;
use eventbook_core::{
    Event, EventFilter, EventId, EventPatch, EventSummary, EventWithCreator, NewEvent, Result,
    Stats, StoreError, UserId,
};
use sqlx::{Postgres, QueryBuilder};

fn summary_select() -> String {
    format!(
        "SELECT {EVENT_COLUMNS}, COUNT(b.id) AS current_attendees
         FROM events e
         LEFT JOIN bookings b ON b.event_id = e.id"
    )
}

/// Translate a filter into a query. Absent predicates add nothing.
///
/// The search term is matched with `strpos`, which is case-sensitive and
/// needs no `LIKE` escaping.
pub(crate) fn filtered_query(filter: &EventFilter) -> QueryBuilder<'_, Postgres> {
    let mut query = QueryBuilder::new(summary_select());
    query.push(" WHERE TRUE");

    if !filter.categories.is_empty() {
        query
            .push(" AND e.category = ANY(")
            .push_bind(&filter.categories)
            .push(")");
    }
    if !filter.locations.is_empty() {
        query
            .push(" AND e.location = ANY(")
            .push_bind(&filter.locations)
            .push(")");
    }
    if let Some(start) = filter.start {
        query.push(" AND e.date >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        query.push(" AND e.date <= ").push_bind(end);
    }
    if let Some(created_by) = filter.created_by {
        query.push(" AND e.created_by = ").push_bind(created_by.0);
    }
    if let Some(search) = &filter.search {
        query
            .push(" AND (strpos(e.title, ")
            .push_bind(search)
            .push(") > 0 OR strpos(e.description, ")
            .push_bind(search)
            .push(") > 0)");
    }

    query.push(" GROUP BY e.id ORDER BY e.date ASC");
    if let Some(limit) = filter.limit {
        query.push(" LIMIT ").push_bind(i64::from(limit));
    }
    query
}

impl PostgresStore {
    async fn fetch_summary(&self, id: EventId) -> Result<Option<EventSummary>> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            "{} WHERE e.id = $1 GROUP BY e.id",
            summary_select()
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(EventSummary::try_from).transpose()
    }
}

#[async_trait]
impl EventRepository for PostgresStore {
    async fn create(
        &self,
        event: NewEvent,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<EventSummary> {
        event.validate()?;
        let row: EventColumns = sqlx::query_as(&format!(
            "INSERT INTO events AS e
                 (id, title, description, date, end_date, category, location,
                  max_attendees, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(EventId::new().0)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.end_date)
        .bind(&event.category)
        .bind(&event.location)
        .bind(capacity_column(event.max_attendees)?)
        .bind(created_by.0)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if crate::is_foreign_key_violation(&e) {
                StoreError::not_found("User")
            } else {
                db_error(e)
            }
        })?;

        let event = Event::try_from(row)?;
        tracing::debug!(event_id = %event.id, created_by = %created_by, "Event created");
        Ok(EventSummary {
            event,
            current_attendees: 0,
        })
    }

    async fn get(&self, id: EventId) -> Result<Option<EventSummary>> {
        self.fetch_summary(id).await
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<EventSummary>> {
        let rows: Vec<EventRow> = filtered_query(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(EventSummary::try_from).collect()
    }

    async fn popular(&self, limit: u32) -> Result<Vec<EventSummary>> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "{} GROUP BY e.id ORDER BY current_attendees DESC, e.date ASC LIMIT $1",
            summary_select()
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(EventSummary::try_from).collect()
    }

    async fn update(
        &self,
        id: EventId,
        patch: EventPatch,
        now: DateTime<Utc>,
    ) -> Result<EventSummary> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Lock the event so no booking is admitted between the count and the
        // capacity change.
        let current: Option<EventColumns> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = $1 FOR UPDATE"
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        let current = Event::try_from(current.ok_or_else(|| StoreError::not_found("Event"))?)?;

        let patched = patch.apply(&current, now)?;

        let attendees: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE event_id = $1")
            .bind(id.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
        if i64::from(patched.max_attendees) < attendees {
            return Err(StoreError::Validation(format!(
                "maxAttendees cannot be below the current booking count ({attendees})"
            )));
        }

        sqlx::query(
            "UPDATE events
             SET title = $2, description = $3, date = $4, end_date = $5, category = $6,
                 location = $7, max_attendees = $8, updated_at = $9
             WHERE id = $1",
        )
        .bind(id.0)
        .bind(&patched.title)
        .bind(&patched.description)
        .bind(patched.date)
        .bind(patched.end_date)
        .bind(&patched.category)
        .bind(&patched.location)
        .bind(capacity_column(patched.max_attendees)?)
        .bind(patched.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        let current_attendees = u32::try_from(attendees)
            .map_err(|_| StoreError::Database("attendee count out of range".to_string()))?;
        Ok(EventSummary {
            event: patched,
            current_attendees,
        })
    }

    async fn delete(&self, id: EventId) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Event"));
        }
        tracing::debug!(event_id = %id, "Event deleted with its bookings");
        Ok(())
    }

    async fn list_with_creators(&self) -> Result<Vec<EventWithCreator>> {
        let rows: Vec<EventCreatorRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS}, COUNT(b.id) AS current_attendees,
                    u.id AS creator_id, u.name AS creator_name, u.email AS creator_email
             FROM events e
             LEFT JOIN bookings b ON b.event_id = e.id
             LEFT JOIN users u ON u.id = e.created_by
             GROUP BY e.id, u.id
             ORDER BY e.date ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(EventWithCreator::try_from).collect()
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<Stats> {
        let (total_users, total_events, total_bookings, upcoming_events): (i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT
                     (SELECT COUNT(*) FROM users),
                     (SELECT COUNT(*) FROM events),
                     (SELECT COUNT(*) FROM bookings),
                     (SELECT COUNT(*) FROM events WHERE date >= $1)",
            )
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(Stats {
            total_users: total_users.unsigned_abs(),
            total_events: total_events.unsigned_abs(),
            total_bookings: total_bookings.unsigned_abs(),
            upcoming_events: upcoming_events.unsigned_abs(),
        })
    }
}
