use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Split `[begin, end)` into per-day slices of the given timezone.
///
/// Returns `(local date, overlap seconds)` in chronological order. The slices
/// sum to the elapsed time. An end exactly at local midnight does not open an
/// empty trailing day; a zero-length span yields one empty slice on its begin
/// date.
pub fn split_across_days(begin: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> Vec<(NaiveDate, i64)> {
    let first = begin.with_timezone(&tz).date_naive();
    if end <= begin {
        return vec![(first, 0)];
    }

    let mut slices = Vec::new();
    let mut cursor = begin;
    let mut date = first;
    loop {
        let next = date
            .succ_opt()
            .and_then(|d| local_midnight(d, tz))
            .filter(|m| *m > cursor)
            .unwrap_or(end);
        let slice_end = next.min(end);
        slices.push((date, (slice_end - cursor).num_seconds()));
        if slice_end >= end {
            break;
        }
        cursor = slice_end;
        date = cursor.with_timezone(&tz).date_naive();
    }
    slices
}

/// First instant of `date` in `tz`. When midnight falls into a DST gap the
/// day starts at the first existing hour.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    (0..24).find_map(|hour| {
        let local = date.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}
