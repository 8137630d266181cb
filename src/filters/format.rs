//! Locale-aware date, time, number and currency formatting.
//!
//! Only a handful of locales are known; anything else formats as `en-US`.
//! Dates are formatted in UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::core::{Result, TemplateError};
use crate::expression::{Map, Value};

/// Locale used by `date`, `time` and `currency` when none is given.
pub const DEFAULT_LOCALE: &str = "de-DE";

/// Locale used for unknown locale tags and by `numberFormat` without one.
pub const FALLBACK_LOCALE: &str = "en-US";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateOrder {
    /// `10/17/26`, `Oct 17, 2026`
    MonthFirst,
    /// `17.10.2026`, `17 Oct 2026`
    DayFirst,
}

pub(crate) struct Locale {
    tag: &'static str,
    decimal: char,
    group: char,
    /// Currency symbol goes after the amount, separated by a no-break space.
    symbol_after: bool,
    order: DateOrder,
    short_date: fn(&DateTime<Utc>) -> String,
    months: [&'static str; 12],
    months_abbr: [&'static str; 12],
    weekdays: [&'static str; 7],
    twelve_hour: bool,
}

const EN_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const EN_MONTHS_ABBR: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
const EN_WEEKDAYS: [&str; 7] =
    ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

fn short_date_de(d: &DateTime<Utc>) -> String {
    d.format("%d.%m.%y").to_string()
}

fn short_date_us(d: &DateTime<Utc>) -> String {
    format!("{}/{}/{}", d.month(), d.day(), d.format("%y"))
}

fn short_date_slashed(d: &DateTime<Utc>) -> String {
    d.format("%d/%m/%Y").to_string()
}

static LOCALES: &[Locale] = &[
    Locale {
        tag: "de-DE",
        decimal: ',',
        group: '.',
        symbol_after: true,
        order: DateOrder::DayFirst,
        short_date: short_date_de,
        months: [
            "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
            "Oktober", "November", "Dezember",
        ],
        months_abbr: [
            "Jan.", "Feb.", "März", "Apr.", "Mai", "Juni", "Juli", "Aug.", "Sept.", "Okt.",
            "Nov.", "Dez.",
        ],
        weekdays: ["Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag", "Sonntag"],
        twelve_hour: false,
    },
    Locale {
        tag: "en-US",
        decimal: '.',
        group: ',',
        symbol_after: false,
        order: DateOrder::MonthFirst,
        short_date: short_date_us,
        months: EN_MONTHS,
        months_abbr: EN_MONTHS_ABBR,
        weekdays: EN_WEEKDAYS,
        twelve_hour: true,
    },
    Locale {
        tag: "en-GB",
        decimal: '.',
        group: ',',
        symbol_after: false,
        order: DateOrder::DayFirst,
        short_date: short_date_slashed,
        months: EN_MONTHS,
        months_abbr: EN_MONTHS_ABBR,
        weekdays: EN_WEEKDAYS,
        twelve_hour: false,
    },
    Locale {
        tag: "fr-FR",
        decimal: ',',
        group: '\u{202f}',
        symbol_after: true,
        order: DateOrder::DayFirst,
        short_date: short_date_slashed,
        months: [
            "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
            "octobre", "novembre", "décembre",
        ],
        months_abbr: [
            "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.",
            "nov.", "déc.",
        ],
        weekdays: ["lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche"],
        twelve_hour: false,
    },
];

/// Find a locale by tag (case-insensitive, `_` accepted for `-`).
pub(crate) fn locale(tag: Option<&str>, default: &str) -> &'static Locale {
    let wanted = tag.unwrap_or(default).replace('_', "-");
    LOCALES
        .iter()
        .find(|l| l.tag.eq_ignore_ascii_case(&wanted))
        .or_else(|| LOCALES.iter().find(|l| l.tag == FALLBACK_LOCALE))
        .unwrap_or(&LOCALES[0])
}

/// Interpret a value as a point in time.
///
/// Accepts RFC 3339 text, `YYYY-MM-DD` (midnight UTC), `YYYY-MM-DD HH:MM:SS`
/// and epoch milliseconds.
pub(crate) fn parse_date(value: &Value) -> Result<DateTime<Utc>> {
    let invalid = || TemplateError::expression("Invalid time value");
    match value {
        Value::Number(ms) if ms.is_finite() => {
            Utc.timestamp_millis_opt(*ms as i64).single().ok_or_else(invalid)
        }
        Value::String(text) => {
            let text = text.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Ok(dt.with_timezone(&Utc));
            }
            if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                return Ok(date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc());
            }
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|naive| naive.and_utc())
                .ok_or_else(invalid)
        }
        Value::Safe(inner) => parse_date(inner),
        _ => Err(invalid()),
    }
}

fn style<'a>(options: Option<&'a Map>, key: &str, default: &'a str) -> &'a str {
    options.and_then(|o| o.get(key)).and_then(Value::as_str).unwrap_or(default)
}

pub(crate) fn format_date(date: &DateTime<Utc>, locale: &Locale, options: Option<&Map>) -> Result<String> {
    let day = date.day();
    let year = date.year();
    let month = date.month0() as usize;
    let weekday = locale.weekdays[date.weekday().num_days_from_monday() as usize];
    let formatted = match (style(options, "dateStyle", "medium"), locale.order, locale.tag) {
        ("short", _, _) => (locale.short_date)(date),
        ("medium", _, "de-DE") => date.format("%d.%m.%Y").to_string(),
        ("medium", DateOrder::MonthFirst, _) => {
            format!("{} {day}, {year}", locale.months_abbr[month])
        }
        ("medium", DateOrder::DayFirst, _) => format!("{day} {} {year}", locale.months_abbr[month]),
        ("long", _, "de-DE") => format!("{day}. {} {year}", locale.months[month]),
        ("long", DateOrder::MonthFirst, _) => format!("{} {day}, {year}", locale.months[month]),
        ("long", DateOrder::DayFirst, _) => format!("{day} {} {year}", locale.months[month]),
        ("full", _, "de-DE") => format!("{weekday}, {day}. {} {year}", locale.months[month]),
        ("full", DateOrder::MonthFirst, _) => {
            format!("{weekday}, {} {day}, {year}", locale.months[month])
        }
        ("full", DateOrder::DayFirst, _) => format!("{weekday} {day} {} {year}", locale.months[month]),
        (other, _, _) => {
            return Err(TemplateError::expression(format!("invalid dateStyle '{other}'")));
        }
    };
    Ok(formatted)
}

pub(crate) fn format_time(date: &DateTime<Utc>, locale: &Locale, options: Option<&Map>) -> Result<String> {
    let with_seconds = match style(options, "timeStyle", "short") {
        "short" => false,
        "medium" | "long" | "full" => true,
        other => return Err(TemplateError::expression(format!("invalid timeStyle '{other}'"))),
    };
    let (hour, minute, second) = (date.hour(), date.minute(), date.second());
    let seconds = if with_seconds { format!(":{second:02}") } else { String::new() };
    if locale.twelve_hour {
        let (is_pm, hour12) = date.hour12();
        Ok(format!("{hour12}:{minute:02}{seconds} {}", if is_pm { "PM" } else { "AM" }))
    } else {
        Ok(format!("{hour:02}:{minute:02}{seconds}"))
    }
}

/// Format a number with the locale's separators.
pub(crate) fn format_decimal(value: f64, locale: &Locale, min_fraction: usize, max_fraction: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }
    let max_fraction = max_fraction.max(min_fraction);
    let fixed = format!("{:.*}", max_fraction, value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let mut fraction = fraction.to_string();
    while fraction.len() > min_fraction && fraction.ends_with('0') {
        fraction.pop();
    }

    let mut grouped = String::new();
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(locale.group);
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !fraction.is_empty() {
        out.push(locale.decimal);
        out.push_str(&fraction);
    }
    out
}

fn currency_symbol(code: &str) -> (String, usize) {
    match code.to_ascii_lowercase().as_str() {
        "eur" => ("€".to_string(), 2),
        "usd" => ("$".to_string(), 2),
        "gbp" => ("£".to_string(), 2),
        "jpy" => ("¥".to_string(), 0),
        other => (other.to_ascii_uppercase(), 2),
    }
}

pub(crate) fn format_currency(amount: f64, locale: &Locale, code: &str) -> Result<String> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(TemplateError::expression(format!("Invalid currency code : {code}")));
    }
    let (symbol, digits) = currency_symbol(code);
    let number = format_decimal(amount, locale, digits, digits);
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest.to_string()),
        None => ("", number.clone()),
    };
    Ok(if locale.symbol_after {
        format!("{sign}{digits}\u{a0}{symbol}")
    } else {
        format!("{sign}{symbol}{digits}")
    })
}
