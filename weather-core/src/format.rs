//! Display helpers for raw provider values.

use chrono::{DateTime, Timelike, Utc};

use crate::model::TemperatureUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// "Monday, January 15, 2024"
    #[default]
    Long,
    /// "Mon, Jan 15"
    Short,
    /// "3:00 PM"
    Time,
}

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub fn format_temperature(temp: f64, unit: TemperatureUnit) -> String {
    format!("{}{}", temp.round() as i64, unit.temperature_symbol())
}

/// Formats an epoch-seconds timestamp in UTC.
pub fn format_date(timestamp: i64, style: DateStyle) -> String {
    let Some(dt) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
        return String::new();
    };

    let pattern = match style {
        DateStyle::Long => "%A, %B %-d, %Y",
        DateStyle::Short => "%a, %b %-d",
        DateStyle::Time => "%-I:%M %p",
    };
    dt.format(pattern).to_string()
}

pub fn format_wind_speed(speed: f64, unit: TemperatureUnit) -> String {
    format!("{} {}", speed.round() as i64, unit.speed_symbol())
}

/// 16-point compass direction for a bearing in degrees.
pub fn wind_direction(degrees: f64) -> &'static str {
    let index = (degrees.rem_euclid(360.0) / 22.5).round() as usize % COMPASS.len();
    COMPASS[index]
}

pub fn format_humidity(humidity: u8) -> String {
    format!("{humidity}%")
}

pub fn format_pressure(pressure: u32) -> String {
    format!("{pressure} hPa")
}

/// Visibility in meters, shown in km once it reaches 1 km.
pub fn format_visibility(meters: u32) -> String {
    if meters >= 1000 {
        format!("{:.1} km", f64::from(meters) / 1000.0)
    } else {
        format!("{meters} m")
    }
}

pub fn greeting(now: DateTime<Utc>) -> &'static str {
    match now.hour() {
        0..=11 => "Good Morning",
        12..=17 => "Good Afternoon",
        _ => "Good Evening",
    }
}

pub fn uv_index_category(uvi: f64) -> &'static str {
    if uvi <= 2.0 {
        "Low"
    } else if uvi <= 5.0 {
        "Moderate"
    } else if uvi <= 7.0 {
        "High"
    } else if uvi <= 10.0 {
        "Very High"
    } else {
        "Extreme"
    }
}

/// Emoji for an OpenWeather icon code ("01d", "10n", ...). Unknown codes show a cloud.
pub fn weather_emoji(icon: &str) -> &'static str {
    match icon {
        "01d" => "☀️",
        "01n" | "02n" => "🌙",
        "02d" => "⛅",
        "09d" | "09n" | "10n" => "🌧️",
        "10d" => "🌦️",
        "11d" | "11n" => "⛈️",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫️",
        _ => "☁️",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn temperature_rounds_and_suffixes_unit() {
        assert_eq!(format_temperature(21.6, TemperatureUnit::Metric), "22°C");
        assert_eq!(format_temperature(70.2, TemperatureUnit::Imperial), "70°F");
        assert_eq!(format_temperature(-3.4, TemperatureUnit::Metric), "-3°C");
    }

    #[test]
    fn date_styles() {
        // 2024-01-15T15:00:00Z
        let ts = 1_705_330_800;
        assert_eq!(format_date(ts, DateStyle::Long), "Monday, January 15, 2024");
        assert_eq!(format_date(ts, DateStyle::Short), "Mon, Jan 15");
        assert_eq!(format_date(ts, DateStyle::Time), "3:00 PM");
    }

    #[test]
    fn wind_speed_and_direction() {
        assert_eq!(format_wind_speed(3.6, TemperatureUnit::Metric), "4 m/s");
        assert_eq!(format_wind_speed(10.1, TemperatureUnit::Imperial), "10 mph");
        assert_eq!(wind_direction(0.0), "N");
        assert_eq!(wind_direction(90.0), "E");
        assert_eq!(wind_direction(200.0), "SSW");
        assert_eq!(wind_direction(350.0), "N");
    }

    #[test]
    fn simple_suffixes() {
        assert_eq!(format_humidity(64), "64%");
        assert_eq!(format_pressure(1013), "1013 hPa");
        assert_eq!(format_visibility(10_000), "10.0 km");
        assert_eq!(format_visibility(800), "800 m");
    }

    #[test]
    fn greeting_by_hour() {
        let at = |h| Utc.with_ymd_and_hms(2024, 1, 15, h, 0, 0).unwrap();
        assert_eq!(greeting(at(8)), "Good Morning");
        assert_eq!(greeting(at(12)), "Good Afternoon");
        assert_eq!(greeting(at(20)), "Good Evening");
    }

    #[test]
    fn uv_categories() {
        assert_eq!(uv_index_category(1.0), "Low");
        assert_eq!(uv_index_category(6.5), "High");
        assert_eq!(uv_index_category(11.0), "Extreme");
    }

    #[test]
    fn weather_emoji_by_icon_code() {
        assert_eq!(weather_emoji("01d"), "☀️");
        assert_eq!(weather_emoji("01n"), "🌙");
        assert_eq!(weather_emoji("10d"), "🌦️");
        assert_eq!(weather_emoji("10n"), "🌧️");
        assert_eq!(weather_emoji("04d"), "☁️");
        assert_eq!(weather_emoji(""), "☁️");
    }
}
