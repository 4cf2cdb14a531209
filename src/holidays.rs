// src/holidays.rs
//
// Static holiday reference data: public holidays (fixed dates plus the
// Easter-derived movable feasts, NRW set) and named school holiday ranges.
// Nothing here is mutated at runtime.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicHoliday {
    pub date: NaiveDate,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchoolHoliday {
    pub name: &'static str,
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
}

/// Easter Sunday for a Gregorian year, per the Gauss algorithm.
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year % 4;
    let c = year % 7;
    let k = year / 100;
    let p = (13 + 8 * k) / 25;
    let q = k / 4;
    let m = (15 - p + k - q) % 30;
    let n = (4 + k - q) % 7;
    let d = (19 * a + m) % 30;
    let e = (2 * b + 4 * c + 6 * d + n) % 7;

    // Exceptions where the formula overshoots into the next lunar month.
    let offset = if d == 29 && e == 6 {
        28
    } else if d == 28 && e == 6 && (11 * m + 11) % 30 < 19 {
        27
    } else {
        d + e
    };

    // March 22 is the earliest possible Easter.
    NaiveDate::from_ymd_opt(year, 3, 22).expect("valid date") + chrono::Duration::days(offset as i64)
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid static holiday date")
}

/// Public holidays for a year, sorted by date.
pub fn public_holidays(year: i32) -> Vec<PublicHoliday> {
    let easter = easter_sunday(year);
    let mut days = vec![
        PublicHoliday { date: ymd(year, 1, 1), name: "Neujahr" },
        PublicHoliday { date: easter - chrono::Duration::days(2), name: "Karfreitag" },
        PublicHoliday { date: easter + chrono::Duration::days(1), name: "Ostermontag" },
        PublicHoliday { date: ymd(year, 5, 1), name: "Tag der Arbeit" },
        PublicHoliday { date: easter + chrono::Duration::days(39), name: "Christi Himmelfahrt" },
        PublicHoliday { date: easter + chrono::Duration::days(50), name: "Pfingstmontag" },
        PublicHoliday { date: easter + chrono::Duration::days(60), name: "Fronleichnam" },
        PublicHoliday { date: ymd(year, 10, 3), name: "Tag der Deutschen Einheit" },
        PublicHoliday { date: ymd(year, 11, 1), name: "Allerheiligen" },
        PublicHoliday { date: ymd(year, 12, 25), name: "1. Weihnachtstag" },
        PublicHoliday { date: ymd(year, 12, 26), name: "2. Weihnachtstag" },
    ];
    days.sort_by_key(|h| h.date);
    days
}

pub fn public_holiday_on(date: NaiveDate) -> Option<&'static str> {
    public_holidays(date.year())
        .into_iter()
        .find(|h| h.date == date)
        .map(|h| h.name)
}

/// School holiday ranges (NRW). Extended by hand once the next school year
/// is published.
pub static SCHOOL_HOLIDAYS: Lazy<Vec<SchoolHoliday>> = Lazy::new(|| {
    vec![
        SchoolHoliday { name: "Weihnachtsferien 2024/25", start: ymd(2024, 12, 23), end: ymd(2025, 1, 6) },
        SchoolHoliday { name: "Osterferien 2025", start: ymd(2025, 4, 14), end: ymd(2025, 4, 26) },
        SchoolHoliday { name: "Sommerferien 2025", start: ymd(2025, 7, 14), end: ymd(2025, 8, 26) },
        SchoolHoliday { name: "Herbstferien 2025", start: ymd(2025, 10, 13), end: ymd(2025, 10, 25) },
        SchoolHoliday { name: "Weihnachtsferien 2025/26", start: ymd(2025, 12, 22), end: ymd(2026, 1, 6) },
        SchoolHoliday { name: "Osterferien 2026", start: ymd(2026, 3, 30), end: ymd(2026, 4, 11) },
        SchoolHoliday { name: "Sommerferien 2026", start: ymd(2026, 7, 20), end: ymd(2026, 9, 1) },
        SchoolHoliday { name: "Herbstferien 2026", start: ymd(2026, 10, 19), end: ymd(2026, 10, 31) },
    ]
});

pub fn school_holiday_on(date: NaiveDate) -> Option<&'static str> {
    SCHOOL_HOLIDAYS
        .iter()
        .find(|h| h.start <= date && date <= h.end)
        .map(|h| h.name)
}
