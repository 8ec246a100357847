// Calendar helpers for timeframe bucketing.
use chrono::{Datelike, Months, NaiveDate, Weekday};

use crate::models::Timeframe;

/// Last calendar day of the period that `date` falls in.
///
/// Weekly periods are ISO weeks (Monday to Sunday), so the end is the ISO
/// week's Sunday even when that Sunday lies in the following month or year.
/// Monthly periods end on the last day of the calendar month. Daily periods
/// are the date itself. Two dates share a bucket exactly when they share a
/// period end, which makes this usable as a grouping key.
pub fn period_end(date: NaiveDate, timeframe: Timeframe) -> Option<NaiveDate> {
    match timeframe {
        Timeframe::Daily => Some(date),
        Timeframe::Weekly => {
            let week = date.iso_week();
            NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Sun)
        }
        Timeframe::Monthly => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?
            .checked_add_months(Months::new(1))?
            .pred_opt(),
    }
}
