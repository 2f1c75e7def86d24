//! `bookings` table and atomic admission.
//!
//! [`BookingRepository::book`] runs in one transaction:
//!
//! 1. `SELECT max_attendees ... FOR UPDATE` locks the event row, so
//!    concurrent admissions for the same event queue up here
//! 2. duplicate check and booking count
//! 3. [`admit`] decides
//! 4. insert, then commit
//!
//! The `UNIQUE (event_id, user_id)` constraint still backs the duplicate
//! rule; a violation maps to [`StoreError::AlreadyBooked`].

use crate::rows::{BOOKING_COLUMNS, BookingEventRow, BookingRow, EVENT_COLUMNS};
use crate::{PostgresStore, db_error, is_foreign_key_violation, is_unique_violation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventbook_core::booking::admit;
use eventbook_core::repository::BookingRepository;
use eventbook_core::{
    Booking, BookingId, BookingWithEvent, EventId, Result, StoreError, UserId,
};

#[async_trait]
impl BookingRepository for PostgresStore {
    async fn book(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let capacity: Option<i32> =
            sqlx::query_scalar("SELECT max_attendees FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
        let capacity = capacity.ok_or_else(|| StoreError::not_found("Event"))?;

        let (already_booked, current): (bool, i64) = sqlx::query_as(
            "SELECT COALESCE(BOOL_OR(user_id = $2), FALSE), COUNT(*)
             FROM bookings WHERE event_id = $1",
        )
        .bind(event_id.0)
        .bind(user_id.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        let decision = admit(
            already_booked,
            current.unsigned_abs(),
            u32::try_from(capacity).unwrap_or(0),
        );
        tracing::debug!(
            event_id = %event_id,
            user_id = %user_id,
            current,
            capacity,
            decision = decision.as_str(),
            "Booking admission"
        );
        // Dropping the transaction rolls it back.
        decision.into_result()?;

        let row: BookingRow = sqlx::query_as(&format!(
            "INSERT INTO bookings (id, event_id, user_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(BookingId::new().0)
        .bind(event_id.0)
        .bind(user_id.0)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::AlreadyBooked
            } else if is_foreign_key_violation(&e) {
                StoreError::not_found("User")
            } else {
                db_error(e)
            }
        })?;

        tx.commit().await.map_err(db_error)?;
        Ok(row.into())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(row.map(Booking::from))
    }

    async fn delete(&self, id: BookingId) -> Result<()> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Booking"));
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<BookingWithEvent>> {
        let rows: Vec<BookingEventRow> = sqlx::query_as(&format!(
            "SELECT b.id AS booking_id, b.user_id AS booking_user_id,
                    b.created_at AS booking_created_at, b.updated_at AS booking_updated_at,
                    {EVENT_COLUMNS}
             FROM bookings b
             JOIN events e ON e.id = b.event_id
             WHERE b.user_id = $1
             ORDER BY e.date ASC"
        ))
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(BookingWithEvent::try_from).collect()
    }
}
