//! Local date and time values without time zones
//!
//! These are plain validated value types that box like primitives and print
//! in ISO 8601 form. [`Period`] is the exact distance between two of them,
//! kept as a signed count of milliseconds on the proleptic Gregorian
//! calendar.

use std::fmt;
use std::ops::{Add, Sub};

use crate::error::ReflectionResult;
use crate::reflection::{Reflected, Type, TypeBuilder};

/// Invalid component passed to a date or time constructor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateTimeError {
    #[error("{component} {value} is out of range")]
    OutOfRange {
        component: &'static str,
        value: i64,
    },
}

fn check(component: &'static str, value: i64, min: i64, max: i64) -> Result<(), DateTimeError> {
    if value < min || value > max {
        return Err(DateTimeError::OutOfRange { component, value });
    }
    Ok(())
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Date without time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDate {
    year: i32,
    month: u32,
    day: u32,
}

impl LocalDate {
    /// Validate a Gregorian date in years 1 to 9999
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, DateTimeError> {
        check("year", year.into(), 1, 9999)?;
        check("month", month.into(), 1, 12)?;
        check("day", day.into(), 1, days_in_month(year, month).into())?;
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Combine with a time of day
    pub fn at(self, time: LocalTime) -> LocalDateTime {
        LocalDateTime::new(self, time)
    }

    /// Days since 1970-01-01
    fn day_number(&self) -> i64 {
        let year = i64::from(self.year) - i64::from(self.month <= 2);
        let era = year.div_euclid(400);
        let year_of_era = year - era * 400;
        let month = i64::from(self.month);
        let day_of_year = (153 * (month + if month > 2 { -3 } else { 9 }) + 2) / 5 + i64::from(self.day) - 1;
        let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
        era * 146_097 + day_of_era - 719_468
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Time of day with millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalTime {
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
}

impl LocalTime {
    /// Validate a 24-hour clock time
    pub fn new(hour: u32, minute: u32, second: u32, millisecond: u32) -> Result<Self, DateTimeError> {
        check("hour", hour.into(), 0, 23)?;
        check("minute", minute.into(), 0, 59)?;
        check("second", second.into(), 0, 59)?;
        check("millisecond", millisecond.into(), 0, 999)?;
        Ok(Self {
            hour,
            minute,
            second,
            millisecond,
        })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    pub fn millisecond(&self) -> u32 {
        self.millisecond
    }

    fn millisecond_of_day(&self) -> i64 {
        i64::from(((self.hour * 60 + self.minute) * 60 + self.second) * 1000 + self.millisecond)
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if self.millisecond != 0 {
            write!(f, ".{:03}", self.millisecond)?;
        }
        Ok(())
    }
}

/// Time of day truncated to the minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalMinute {
    hour: u32,
    minute: u32,
}

impl LocalMinute {
    /// Validate a 24-hour clock minute
    pub fn new(hour: u32, minute: u32) -> Result<Self, DateTimeError> {
        check("hour", hour.into(), 0, 23)?;
        check("minute", minute.into(), 0, 59)?;
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Minutes since midnight
    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    /// The same minute with zero seconds
    pub fn to_time(self) -> LocalTime {
        LocalTime {
            hour: self.hour,
            minute: self.minute,
            second: 0,
            millisecond: 0,
        }
    }
}

impl fmt::Display for LocalMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Date and time without time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDateTime {
    date: LocalDate,
    time: LocalTime,
}

impl LocalDateTime {
    pub fn new(date: LocalDate, time: LocalTime) -> Self {
        Self { date, time }
    }

    pub fn date(&self) -> LocalDate {
        self.date
    }

    pub fn time(&self) -> LocalTime {
        self.time
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)
    }
}

const MILLIS_PER_SECOND: i64 = 1000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Signed amount of time between two local values.
///
/// Components are read off the total and share its sign: a period of minus
/// one hour and eleven minutes has `hours() == -1` and `minutes() == -11`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    milliseconds: i64,
}

impl Period {
    /// The empty period
    pub const ZERO: Period = Period { milliseconds: 0 };

    /// Seven days per week
    pub fn from_weeks(weeks: i64) -> Self {
        Self::from_days(weeks * 7)
    }

    pub fn from_days(days: i64) -> Self {
        Self::from_milliseconds(days * MILLIS_PER_DAY)
    }

    pub fn from_hours(hours: i64) -> Self {
        Self::from_milliseconds(hours * MILLIS_PER_HOUR)
    }

    pub fn from_minutes(minutes: i64) -> Self {
        Self::from_milliseconds(minutes * MILLIS_PER_MINUTE)
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self::from_milliseconds(seconds * MILLIS_PER_SECOND)
    }

    pub fn from_milliseconds(milliseconds: i64) -> Self {
        Self { milliseconds }
    }

    /// `end - start`
    pub fn between_dates(start: LocalDate, end: LocalDate) -> Self {
        Self::from_days(end.day_number() - start.day_number())
    }

    /// `end - start`
    pub fn between_times(start: LocalTime, end: LocalTime) -> Self {
        Self::from_milliseconds(end.millisecond_of_day() - start.millisecond_of_day())
    }

    /// `end - start`
    pub fn between(start: LocalDateTime, end: LocalDateTime) -> Self {
        Self::between_dates(start.date, end.date) + Self::between_times(start.time, end.time)
    }

    /// Whole days
    pub fn days(&self) -> i64 {
        self.milliseconds / MILLIS_PER_DAY
    }

    /// Hours within the day, `-23..=23`
    pub fn hours(&self) -> i64 {
        self.milliseconds % MILLIS_PER_DAY / MILLIS_PER_HOUR
    }

    pub fn minutes(&self) -> i64 {
        self.milliseconds % MILLIS_PER_HOUR / MILLIS_PER_MINUTE
    }

    pub fn seconds(&self) -> i64 {
        self.milliseconds % MILLIS_PER_MINUTE / MILLIS_PER_SECOND
    }

    /// Milliseconds within the second
    pub fn milliseconds(&self) -> i64 {
        self.milliseconds % MILLIS_PER_SECOND
    }

    /// The whole period in milliseconds
    pub fn total_milliseconds(&self) -> i64 {
        self.milliseconds
    }
}

impl Add for Period {
    type Output = Period;

    fn add(self, other: Period) -> Period {
        Period::from_milliseconds(self.milliseconds + other.milliseconds)
    }
}

impl Sub for Period {
    type Output = Period;

    fn sub(self, other: Period) -> Period {
        Period::from_milliseconds(self.milliseconds - other.milliseconds)
    }
}

/// NodaTime round-trip form, `P9DT1H11M11S111s`; zero prints as `P`
impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("P")?;
        if self.days() != 0 {
            write!(f, "{}D", self.days())?;
        }
        if self.milliseconds % MILLIS_PER_DAY == 0 {
            return Ok(());
        }
        f.write_str("T")?;
        for (value, unit) in [
            (self.hours(), "H"),
            (self.minutes(), "M"),
            (self.seconds(), "S"),
            (self.milliseconds(), "s"),
        ] {
            if value != 0 {
                write!(f, "{value}{unit}")?;
            }
        }
        Ok(())
    }
}

macro_rules! noda_types {
    ($($ty:ident),+ $(,)?) => {$(
        impl Reflected for $ty {
            fn build_type() -> ReflectionResult<Type> {
                TypeBuilder::<$ty>::new("NodaTime", stringify!($ty)).build()
            }
        }

        crate::convert::displayed_value_type!($ty);
        crate::__object_conversions!($ty);
    )+};
}

noda_types!(LocalDate, LocalTime, LocalMinute, LocalDateTime, Period);
