//! SQL for the booking tables.
//!
//! Functions take any Postgres executor so the same statement runs against
//! the pool or inside a transaction.

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{OccupiedDayEntry, PaymentStatus, Reservation, Resource};

use super::models::{OccupiedDayRow, ReservationRow, ResourceRow};

const RESOURCE_COLUMNS: &str = r#"
    id, kind, name, description, rate, duration_hours,
    owner_id, image_urls, created_at
"#;

const RESERVATION_COLUMNS: &str = r#"
    id, resource_id, resource_kind, user_id,
    customer_name, customer_email, customer_phone,
    pickup_location, dropoff_location,
    start_date, end_date, total_amount, payment_status, created_at
"#;

/// Insert a resource
pub async fn insert_resource<'e>(
    executor: impl PgExecutor<'e>,
    resource: &Resource,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO resources
            (id, kind, name, description, rate, duration_hours,
             owner_id, image_urls, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(resource.id)
    .bind(resource.kind.as_str())
    .bind(&resource.name)
    .bind(&resource.description)
    .bind(resource.rate)
    .bind(resource.duration_hours)
    .bind(resource.owner_id)
    .bind(&resource.image_urls)
    .bind(resource.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Get a resource by id
pub async fn find_resource<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<ResourceRow>, sqlx::Error> {
    let sql = format!("SELECT {} FROM resources WHERE id = $1", RESOURCE_COLUMNS);
    sqlx::query_as::<_, ResourceRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Take a shared lock on a resource row; `None` if it does not exist.
///
/// Held by a reservation write so the resource cannot be deleted under it.
pub async fn lock_resource_for_share<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM resources WHERE id = $1 FOR SHARE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Take an exclusive lock on a resource row ahead of deleting it
pub async fn lock_resource_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM resources WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// List resources, newest first, with optional kind and owner filters
pub async fn list_resources<'e>(
    executor: impl PgExecutor<'e>,
    kind: Option<&str>,
    owner_id: Option<Uuid>,
) -> Result<Vec<ResourceRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM resources
        WHERE ($1::text IS NULL OR kind = $1)
          AND ($2::uuid IS NULL OR owner_id = $2)
        ORDER BY created_at DESC
        "#,
        RESOURCE_COLUMNS
    );
    sqlx::query_as::<_, ResourceRow>(&sql)
        .bind(kind)
        .bind(owner_id)
        .fetch_all(executor)
        .await
}

/// Delete a resource; returns the number of rows removed
pub async fn delete_resource<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM resources WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Occupied-day entries for a resource
pub async fn occupied_entries<'e>(
    executor: impl PgExecutor<'e>,
    resource_id: Uuid,
) -> Result<Vec<OccupiedDayRow>, sqlx::Error> {
    sqlx::query_as::<_, OccupiedDayRow>(
        r#"
        SELECT resource_id, start_date, end_date, reservation_id
        FROM occupied_days
        WHERE resource_id = $1
        ORDER BY start_date
        "#,
    )
    .bind(resource_id)
    .fetch_all(executor)
    .await
}

/// Insert an occupied-day entry.
///
/// The `occupied_days_no_overlap` exclusion constraint rejects ranges that
/// collide with another entry for the same resource.
pub async fn insert_occupied_entry<'e>(
    executor: impl PgExecutor<'e>,
    entry: &OccupiedDayEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO occupied_days (reservation_id, resource_id, start_date, end_date)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(entry.reservation_id)
    .bind(entry.resource_id)
    .bind(entry.start_date)
    .bind(entry.end_date)
    .execute(executor)
    .await?;

    Ok(())
}

/// Release the occupied-day entry of a reservation
pub async fn delete_occupied_entry<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM occupied_days WHERE reservation_id = $1")
        .bind(reservation_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Insert a reservation
pub async fn insert_reservation<'e>(
    executor: impl PgExecutor<'e>,
    reservation: &Reservation,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO reservations
            (id, resource_id, resource_kind, user_id,
             customer_name, customer_email, customer_phone,
             pickup_location, dropoff_location,
             start_date, end_date, total_amount, payment_status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(reservation.id)
    .bind(reservation.resource_id)
    .bind(reservation.resource_kind.as_str())
    .bind(reservation.user_id)
    .bind(&reservation.customer.name)
    .bind(&reservation.customer.email)
    .bind(&reservation.customer.phone)
    .bind(&reservation.pickup_location)
    .bind(&reservation.dropoff_location)
    .bind(reservation.start_date)
    .bind(reservation.end_date)
    .bind(reservation.total_amount)
    .bind(reservation.payment_status.as_str())
    .bind(reservation.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Get a reservation by id
pub async fn find_reservation<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<ReservationRow>, sqlx::Error> {
    let sql = format!("SELECT {} FROM reservations WHERE id = $1", RESERVATION_COLUMNS);
    sqlx::query_as::<_, ReservationRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Lock a reservation row for a status change
pub async fn find_reservation_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<ReservationRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM reservations WHERE id = $1 FOR UPDATE",
        RESERVATION_COLUMNS
    );
    sqlx::query_as::<_, ReservationRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// List reservations, newest first
pub async fn list_reservations<'e>(
    executor: impl PgExecutor<'e>,
    resource_id: Option<Uuid>,
) -> Result<Vec<ReservationRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM reservations
        WHERE ($1::uuid IS NULL OR resource_id = $1)
        ORDER BY created_at DESC
        "#,
        RESERVATION_COLUMNS
    );
    sqlx::query_as::<_, ReservationRow>(&sql)
        .bind(resource_id)
        .fetch_all(executor)
        .await
}

/// Count reservations that still hold dates on a resource
pub async fn count_active_reservations<'e>(
    executor: impl PgExecutor<'e>,
    resource_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM reservations
        WHERE resource_id = $1
          AND payment_status IN ('pending', 'paid')
        "#,
    )
    .bind(resource_id)
    .fetch_one(executor)
    .await
}

/// Update the payment status of a reservation
pub async fn update_payment_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: PaymentStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE reservations SET payment_status = $2 WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Delete a reservation row
pub async fn delete_reservation<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
