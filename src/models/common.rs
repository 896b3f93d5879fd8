use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the `error` field in every failed response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Calendar day at the gym; every "today" rule uses local time.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Start of the local calendar day `date`, as a UTC instant.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Start of the day after `date`, the exclusive upper bound of that day.
pub fn day_end_exclusive(date: NaiveDate) -> DateTime<Utc> {
    day_start(date + Duration::days(1))
}
