//! Turns the provider's flat 3-hour forecast feed into hourly and daily views.

use chrono::NaiveDate;

use crate::model::{DailySummary, Forecast, Reading};

/// Readings kept for the hourly view: 8 x 3h ≈ the next 24 hours.
pub const HOURLY_SLOTS: usize = 8;

/// Maximum number of daily summaries.
pub const DAILY_SLOTS: usize = 5;

/// Split `readings` into the first [`HOURLY_SLOTS`] readings and up to
/// [`DAILY_SLOTS`] per-day summaries, ordered by each day's first appearance.
pub fn aggregate(readings: &[Reading]) -> Forecast {
    let hourly = readings.iter().take(HOURLY_SLOTS).cloned().collect();

    let mut buckets: Vec<DayBucket<'_>> = Vec::new();
    for reading in readings {
        let date = reading.date();
        match buckets.iter_mut().find(|bucket| bucket.date == date) {
            Some(bucket) => bucket.readings.push(reading),
            None => buckets.push(DayBucket { date, readings: vec![reading] }),
        }
    }

    let daily = buckets
        .into_iter()
        .take(DAILY_SLOTS)
        .filter_map(DayBucket::summarize)
        .collect();

    Forecast { hourly, daily }
}

struct DayBucket<'a> {
    date: NaiveDate,
    readings: Vec<&'a Reading>,
}

impl DayBucket<'_> {
    fn summarize(self) -> Option<DailySummary> {
        let first = self.readings.first()?;
        let count = self.readings.len() as f64;

        let temps = self.readings.iter().map(|r| r.temperature);
        let temp_min = temps.clone().fold(f64::INFINITY, f64::min);
        let temp_max = temps.clone().fold(f64::NEG_INFINITY, f64::max);
        // Summation error can push the mean of near-equal values just outside the range.
        let temp_avg = (temps.sum::<f64>() / count).clamp(temp_min, temp_max);

        let humidity_sum: f64 = self.readings.iter().map(|r| f64::from(r.humidity)).sum();
        let wind_sum: f64 = self.readings.iter().map(|r| r.wind_speed).sum();

        Some(DailySummary {
            date: self.date,
            representative_timestamp: first.timestamp,
            temp_min,
            temp_max,
            temp_avg,
            dominant_condition: dominant(self.readings.iter().map(|r| r.condition.as_str())),
            dominant_icon_code: dominant(self.readings.iter().map(|r| r.icon_code.as_str())),
            avg_humidity: (humidity_sum / count).round() as u8,
            avg_wind_speed: wind_sum / count,
        })
    }
}

/// Most frequent value; among equally frequent values the first seen wins.
fn dominant<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((value, n));
        }
    }

    best.map(|(value, _)| value.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;
    // 2024-01-15T00:00:00Z
    const BASE: i64 = 1_705_276_800;

    fn reading(timestamp: i64, temperature: f64, condition: &str) -> Reading {
        Reading {
            timestamp,
            temperature,
            condition: condition.to_string(),
            icon_code: format!("{}-icon", condition.to_lowercase()),
            humidity: 60,
            wind_speed: 3.0,
        }
    }

    /// `per_day` readings at 3h steps for each of `days` consecutive days.
    fn feed(days: i64, per_day: i64) -> Vec<Reading> {
        (0..days)
            .flat_map(|d| {
                (0..per_day).map(move |i| {
                    reading(BASE + d * DAY + i * 3 * 3600, (d * 10 + i) as f64, "Clouds")
                })
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_views() {
        let forecast = aggregate(&[]);
        assert!(forecast.hourly.is_empty());
        assert!(forecast.daily.is_empty());
    }

    #[test]
    fn hourly_keeps_short_input_verbatim() {
        let input = feed(1, 3);
        let forecast = aggregate(&input);
        assert_eq!(forecast.hourly, input);
    }

    #[test]
    fn hourly_is_capped_at_eight_in_order() {
        let input = feed(3, 8);
        let forecast = aggregate(&input);
        assert_eq!(forecast.hourly.len(), HOURLY_SLOTS);
        assert_eq!(forecast.hourly[..], input[..HOURLY_SLOTS]);
    }

    #[test]
    fn daily_min_max_avg_over_one_day() {
        let input = vec![
            reading(BASE, 4.0, "Rain"),
            reading(BASE + 3 * 3600, -1.5, "Rain"),
            reading(BASE + 6 * 3600, 9.5, "Clear"),
            reading(BASE + 9 * 3600, 2.0, "Rain"),
        ];
        let forecast = aggregate(&input);
        assert_eq!(forecast.daily.len(), 1);

        let day = &forecast.daily[0];
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(day.representative_timestamp, BASE);
        assert_eq!(day.temp_min, -1.5);
        assert_eq!(day.temp_max, 9.5);
        assert_eq!(day.temp_avg, 3.5);
        assert!(day.temp_min <= day.temp_avg && day.temp_avg <= day.temp_max);
        assert_eq!(day.dominant_condition, "Rain");
        assert_eq!(day.dominant_icon_code, "rain-icon");
    }

    #[test]
    fn average_stays_within_range_for_equal_values() {
        let input: Vec<Reading> = (0..3).map(|i| reading(BASE + i * 3600, 0.1, "Clear")).collect();
        let day = &aggregate(&input).daily[0];
        assert!(day.temp_min <= day.temp_avg && day.temp_avg <= day.temp_max);
    }

    #[test]
    fn daily_is_capped_at_first_five_days() {
        let input = feed(10, 2);
        let forecast = aggregate(&input);

        assert_eq!(forecast.daily.len(), DAILY_SLOTS);
        let dates: Vec<NaiveDate> = forecast.daily.iter().map(|d| d.date).collect();
        let expected: Vec<NaiveDate> = (0..5)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, 15 + d).unwrap())
            .collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn fewer_days_than_cap_is_not_an_error() {
        let forecast = aggregate(&feed(2, 8));
        assert_eq!(forecast.daily.len(), 2);
    }

    #[test]
    fn days_ordered_by_first_appearance() {
        let input = vec![
            reading(BASE + 2 * DAY, 1.0, "Snow"),
            reading(BASE, 2.0, "Clear"),
            reading(BASE + 2 * DAY + 3600, 3.0, "Snow"),
        ];
        let forecast = aggregate(&input);
        assert_eq!(forecast.daily.len(), 2);
        assert_eq!(forecast.daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
        assert_eq!(forecast.daily[0].temp_min, 1.0);
        assert_eq!(forecast.daily[0].temp_max, 3.0);
        assert_eq!(forecast.daily[1].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn dominant_condition_tie_goes_to_first_seen() {
        let input = vec![
            reading(BASE, 1.0, "Clear"),
            reading(BASE + 3600, 1.0, "Clouds"),
            reading(BASE + 7200, 1.0, "Clear"),
            reading(BASE + 10800, 1.0, "Clouds"),
        ];
        assert_eq!(aggregate(&input).daily[0].dominant_condition, "Clear");

        let input = vec![
            reading(BASE, 1.0, "Clear"),
            reading(BASE + 3600, 1.0, "Clouds"),
            reading(BASE + 7200, 1.0, "Clouds"),
            reading(BASE + 10800, 1.0, "Clear"),
        ];
        assert_eq!(aggregate(&input).daily[0].dominant_condition, "Clear");
    }

    #[test]
    fn humidity_rounded_wind_unrounded() {
        let mut a = reading(BASE, 1.0, "Clear");
        a.humidity = 70;
        a.wind_speed = 1.0;
        let mut b = reading(BASE + 3600, 1.0, "Clear");
        b.humidity = 75;
        b.wind_speed = 2.5;

        let day = &aggregate(&[a, b]).daily[0];
        assert_eq!(day.avg_humidity, 73);
        assert_eq!(day.avg_wind_speed, 1.75);
    }
}
