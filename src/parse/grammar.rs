use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use winnow::ascii::{digit1, space0, space1};
use winnow::combinator::{alt, opt, preceded, repeat};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// Starting point of a date expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Base {
    Now,
    Today,
    Tomorrow,
    Yesterday,
    Absolute(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
}

impl Unit {
    fn from_word(word: &str) -> Option<Unit> {
        match word {
            "sec" | "secs" | "second" | "seconds" => Some(Unit::Second),
            "min" | "mins" | "minute" | "minutes" => Some(Unit::Minute),
            "hour" | "hours" => Some(Unit::Hour),
            "day" | "days" => Some(Unit::Day),
            "week" | "weeks" => Some(Unit::Week),
            _ => None,
        }
    }

    fn delta(self, amount: i64) -> Option<TimeDelta> {
        match self {
            Unit::Second => TimeDelta::try_seconds(amount),
            Unit::Minute => TimeDelta::try_minutes(amount),
            Unit::Hour => TimeDelta::try_hours(amount),
            Unit::Day => TimeDelta::try_days(amount),
            Unit::Week => TimeDelta::try_weeks(amount),
        }
    }
}

/// A parsed, not yet resolved, date expression: an optional base and any
/// number of signed offsets applied left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DateExpr {
    pub(crate) base: Option<Base>,
    pub(crate) offsets: Vec<(i64, Unit)>,
}

impl DateExpr {
    pub(crate) fn is_empty(&self) -> bool {
        self.base.is_none() && self.offsets.is_empty()
    }

    /// Resolve against the reference time. `None` on arithmetic overflow.
    pub(crate) fn resolve(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let midnight = now.date().and_time(NaiveTime::MIN);
        let mut at = match self.base {
            None | Some(Base::Now) => now,
            Some(Base::Today) => midnight,
            Some(Base::Tomorrow) => midnight.checked_add_signed(TimeDelta::try_days(1)?)?,
            Some(Base::Yesterday) => midnight.checked_sub_signed(TimeDelta::try_days(1)?)?,
            Some(Base::Absolute(at)) => at,
        };
        for (amount, unit) in &self.offsets {
            at = at.checked_add_signed(unit.delta(*amount)?)?;
        }
        Some(at)
    }
}

// -- Numbers ----------------------------------------------------------------

fn year(input: &mut &str) -> ModalResult<i32> {
    take_while(4, |c: char| c.is_ascii_digit())
        .try_map(str::parse::<i32>)
        .parse_next(input)
}

/// Two-digit year: `00`-`69` is 2000-2069, `70`-`99` is 1970-1999.
fn short_year(input: &mut &str) -> ModalResult<i32> {
    take_while(2, |c: char| c.is_ascii_digit())
        .try_map(str::parse::<i32>)
        .map(|y| if y < 70 { 2000 + y } else { 1900 + y })
        .parse_next(input)
}

fn two_digits(input: &mut &str) -> ModalResult<u32> {
    take_while(1..=2, |c: char| c.is_ascii_digit())
        .try_map(str::parse::<u32>)
        .parse_next(input)
}

/// Day of month with an optional English ordinal suffix (`5th`).
fn day_of_month(input: &mut &str) -> ModalResult<u32> {
    let day = two_digits.parse_next(input)?;
    opt(alt(("st", "nd", "rd", "th"))).parse_next(input)?;
    Ok(day)
}

fn month_from_word(word: &str) -> Option<u32> {
    match word {
        "jan" | "january" => Some(1),
        "feb" | "february" => Some(2),
        "mar" | "march" => Some(3),
        "apr" | "april" => Some(4),
        "may" => Some(5),
        "jun" | "june" => Some(6),
        "jul" | "july" => Some(7),
        "aug" | "august" => Some(8),
        "sep" | "sept" | "september" => Some(9),
        "oct" | "october" => Some(10),
        "nov" | "november" => Some(11),
        "dec" | "december" => Some(12),
        _ => None,
    }
}

fn month_name(input: &mut &str) -> ModalResult<u32> {
    take_while(3.., |c: char| c.is_ascii_alphabetic())
        .verify_map(month_from_word)
        .parse_next(input)
}

/// Separator between the parts of a written-out date: spaces, commas or
/// dashes.
fn part_separator(input: &mut &str) -> ModalResult<()> {
    take_while(1.., |c: char| c == ' ' || c == ',' || c == '-')
        .void()
        .parse_next(input)
}

// -- Absolute dates ---------------------------------------------------------

fn iso_date(input: &mut &str) -> ModalResult<NaiveDate> {
    (year, '-', two_digits, '-', two_digits)
        .verify_map(|(y, _, m, _, d)| NaiveDate::from_ymd_opt(y, m, d))
        .parse_next(input)
}

/// `YYYY/MM/DD`.
fn slash_iso_date(input: &mut &str) -> ModalResult<NaiveDate> {
    (year, '/', two_digits, '/', two_digits)
        .verify_map(|(y, _, m, _, d)| NaiveDate::from_ymd_opt(y, m, d))
        .parse_next(input)
}

/// `MM/DD/YYYY` or `MM/DD/YY`.
fn us_date(input: &mut &str) -> ModalResult<NaiveDate> {
    (two_digits, '/', two_digits, '/', alt((year, short_year)))
        .verify_map(|(m, _, d, _, y)| NaiveDate::from_ymd_opt(y, m, d))
        .parse_next(input)
}

fn eu_date(input: &mut &str) -> ModalResult<NaiveDate> {
    (two_digits, '.', two_digits, '.', year)
        .verify_map(|(d, _, m, _, y)| NaiveDate::from_ymd_opt(y, m, d))
        .parse_next(input)
}

/// `Jan 5, 2024`, `January 5th 2024`.
fn month_first_date(input: &mut &str) -> ModalResult<NaiveDate> {
    (month_name, part_separator, day_of_month, part_separator, year)
        .verify_map(|(m, _, d, _, y)| NaiveDate::from_ymd_opt(y, m, d))
        .parse_next(input)
}

/// `5 January 2024`, `05-jan-2024`.
fn day_first_date(input: &mut &str) -> ModalResult<NaiveDate> {
    (day_of_month, part_separator, month_name, part_separator, year)
        .verify_map(|(d, _, m, _, y)| NaiveDate::from_ymd_opt(y, m, d))
        .parse_next(input)
}

/// `HH:MM[:SS[.fraction]] [am|pm]`. Fractions of a second are dropped.
fn time(input: &mut &str) -> ModalResult<NaiveTime> {
    (
        two_digits,
        ':',
        two_digits,
        opt(preceded(':', two_digits)),
        opt(preceded('.', digit1)),
        opt(preceded(space0, alt(("am".value(false), "pm".value(true))))),
    )
        .verify_map(|(h, _, m, s, _, pm)| {
            let h = match pm {
                None => h,
                Some(_) if !(1..=12).contains(&h) => return None,
                Some(pm) => h % 12 + if pm { 12 } else { 0 },
            };
            NaiveTime::from_hms_opt(h, m, s.unwrap_or(0))
        })
        .parse_next(input)
}

fn absolute(input: &mut &str) -> ModalResult<NaiveDateTime> {
    let date = alt((
        iso_date,
        slash_iso_date,
        us_date,
        eu_date,
        month_first_date,
        day_first_date,
    ))
    .parse_next(input)?;
    let time = opt(preceded(alt(('t'.void(), space1.void())), time)).parse_next(input)?;
    Ok(date.and_time(time.unwrap_or(NaiveTime::MIN)))
}

fn timestamp(input: &mut &str) -> ModalResult<NaiveDateTime> {
    preceded('@', digit1.try_map(str::parse::<i64>))
        .verify_map(|secs| DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc()))
        .parse_next(input)
}

// -- Bases and offsets ------------------------------------------------------

fn base(input: &mut &str) -> ModalResult<Base> {
    alt((
        absolute.map(Base::Absolute),
        timestamp.map(Base::Absolute),
        "now".value(Base::Now),
        "today".value(Base::Today),
        "midnight".value(Base::Today),
        "tomorrow".value(Base::Tomorrow),
        "yesterday".value(Base::Yesterday),
    ))
    .parse_next(input)
}

fn offset(input: &mut &str) -> ModalResult<(i64, Unit)> {
    let sign = opt(one_of(['+', '-'])).parse_next(input)?;
    space0.parse_next(input)?;
    let amount: i64 = digit1.try_map(str::parse::<i64>).parse_next(input)?;
    space0.parse_next(input)?;
    let unit = take_while(1.., |c: char| c.is_ascii_alphabetic())
        .verify_map(Unit::from_word)
        .context(StrContext::Expected(StrContextValue::Description(
            "time unit",
        )))
        .parse_next(input)?;
    Ok((if sign == Some('-') { -amount } else { amount }, unit))
}

// -- Top-level parser -------------------------------------------------------

/// Expects lower-cased input.
pub(crate) fn date_expr(input: &mut &str) -> ModalResult<DateExpr> {
    space0.parse_next(input)?;
    let base = opt(base).parse_next(input)?;
    let offsets: Vec<(i64, Unit)> = repeat(0.., preceded(space0, offset)).parse_next(input)?;
    space0.parse_next(input)?;
    Ok(DateExpr { base, offsets })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(input: &str) -> DateExpr {
        date_expr.parse(input).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parse_iso_date() {
        assert_eq!(
            expr("2024-01-05").base,
            Some(Base::Absolute(at(2024, 1, 5, 0, 0, 0)))
        );
    }

    #[test]
    fn parse_iso_datetime_with_t_separator() {
        assert_eq!(
            expr("2024-01-05t10:30").base,
            Some(Base::Absolute(at(2024, 1, 5, 10, 30, 0)))
        );
    }

    #[test]
    fn parse_us_and_eu_dates() {
        assert_eq!(
            expr("01/05/2024 08:00:15").base,
            Some(Base::Absolute(at(2024, 1, 5, 8, 0, 15)))
        );
        assert_eq!(
            expr("05.01.2024").base,
            Some(Base::Absolute(at(2024, 1, 5, 0, 0, 0)))
        );
    }

    #[test]
    fn parse_slash_iso_date() {
        assert_eq!(
            expr("2024/01/05").base,
            Some(Base::Absolute(at(2024, 1, 5, 0, 0, 0)))
        );
    }

    #[test]
    fn parse_month_first_names() {
        let jan5 = Some(Base::Absolute(at(2024, 1, 5, 0, 0, 0)));
        assert_eq!(expr("jan 5, 2024").base, jan5);
        assert_eq!(expr("january 5 2024").base, jan5);
        assert_eq!(expr("january 5th, 2024").base, jan5);
        assert_eq!(
            expr("sept 30, 2023 18:00").base,
            Some(Base::Absolute(at(2023, 9, 30, 18, 0, 0)))
        );
    }

    #[test]
    fn parse_day_first_names() {
        let jan5 = Some(Base::Absolute(at(2024, 1, 5, 0, 0, 0)));
        assert_eq!(expr("5 january 2024").base, jan5);
        assert_eq!(expr("05-jan-2024").base, jan5);
    }

    #[test]
    fn parse_short_year_us_date() {
        assert_eq!(
            expr("1/5/24").base,
            Some(Base::Absolute(at(2024, 1, 5, 0, 0, 0)))
        );
        assert_eq!(
            expr("12/31/99").base,
            Some(Base::Absolute(at(1999, 12, 31, 0, 0, 0)))
        );
    }

    #[test]
    fn parse_fractional_seconds() {
        assert_eq!(
            expr("2024-01-05 10:30:00.000").base,
            Some(Base::Absolute(at(2024, 1, 5, 10, 30, 0)))
        );
    }

    #[test]
    fn parse_meridiem() {
        assert_eq!(
            expr("01/05/2024 12:15 am").base,
            Some(Base::Absolute(at(2024, 1, 5, 0, 15, 0)))
        );
        assert_eq!(
            expr("jan 5, 2024 3:00pm").base,
            Some(Base::Absolute(at(2024, 1, 5, 15, 0, 0)))
        );
        assert!(date_expr.parse("2024-01-05 13:00 pm").is_err());
    }

    #[test]
    fn unit_words_are_not_months() {
        let parsed = expr("3 weeks");
        assert_eq!(parsed.base, None);
        assert!(date_expr.parse("5 smarch 2024").is_err());
    }

    #[test]
    fn parse_keywords() {
        assert_eq!(expr("now").base, Some(Base::Now));
        assert_eq!(expr("midnight").base, Some(Base::Today));
        assert_eq!(expr("tomorrow").base, Some(Base::Tomorrow));
    }

    #[test]
    fn parse_offsets() {
        let parsed = expr("today +1 day -2 hours");
        assert_eq!(parsed.base, Some(Base::Today));
        assert_eq!(parsed.offsets, vec![(1, Unit::Day), (-2, Unit::Hour)]);
    }

    #[test]
    fn parse_bare_offset() {
        let parsed = expr("3 weeks");
        assert_eq!(parsed.base, None);
        assert_eq!(parsed.offsets, vec![(3, Unit::Week)]);
    }

    #[test]
    fn invalid_calendar_date_rejected() {
        assert!(date_expr.parse("2024-02-30").is_err());
        assert!(date_expr.parse("2024-13-01").is_err());
    }

    #[test]
    fn unknown_unit_rejected() {
        assert!(date_expr.parse("+1 fortnight").is_err());
    }

    #[test]
    fn resolve_relative_to_reference() {
        let now = at(2024, 3, 10, 15, 45, 0);
        assert_eq!(expr("now").resolve(now), Some(now));
        assert_eq!(expr("tomorrow").resolve(now), Some(at(2024, 3, 11, 0, 0, 0)));
        assert_eq!(
            expr("yesterday +6 hours").resolve(now),
            Some(at(2024, 3, 9, 6, 0, 0))
        );
        assert_eq!(expr("-15 min").resolve(now), Some(at(2024, 3, 10, 15, 30, 0)));
    }
}
