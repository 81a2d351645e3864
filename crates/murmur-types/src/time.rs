use chrono::{DateTime, Datelike, Utc};

/// Renders a timestamp the way API clients display it, e.g. `Oct 18th 2026`.
pub fn render(ts: &DateTime<Utc>) -> String {
    let day = ts.day();
    format!(
        "{} {}{} {}",
        ts.format("%b"),
        day,
        ordinal_suffix(day),
        ts.year()
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn on(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, month, day, 15, 30, 0).unwrap()
    }

    #[test]
    fn renders_month_ordinal_and_year() {
        assert_eq!(render(&on(10, 18)), "Oct 18th 2026");
        assert_eq!(render(&on(1, 1)), "Jan 1st 2026");
        assert_eq!(render(&on(2, 22)), "Feb 22nd 2026");
        assert_eq!(render(&on(3, 23)), "Mar 23rd 2026");
    }

    #[test]
    fn teens_always_take_th() {
        assert_eq!(render(&on(5, 11)), "May 11th 2026");
        assert_eq!(render(&on(5, 12)), "May 12th 2026");
        assert_eq!(render(&on(5, 13)), "May 13th 2026");
    }

    #[test]
    fn renders_the_given_instant_not_the_current_one() {
        let old = Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(render(&old), "Dec 31st 2019");
    }
}
