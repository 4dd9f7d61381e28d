use chrono::Utc;
use weather_core::{
    Appearance, FavoriteLocation, Snapshot, ThemeState,
    format::{
        DateStyle, format_date, format_humidity, format_pressure, format_temperature,
        format_visibility, format_wind_speed, greeting, weather_emoji, wind_direction,
    },
};

const RESET: &str = "\x1b[0m";

fn accent(theme: &ThemeState) -> &'static str {
    match theme.appearance() {
        Appearance::Light => "\x1b[1;34m",
        Appearance::Dark => "\x1b[1;96m",
    }
}

/// Current conditions, the next hours and the daily outlook.
pub fn weather(snapshot: &Snapshot, theme: &ThemeState, favorite: bool) {
    let unit = snapshot.unit;
    let accent = accent(theme);

    if let Some(error) = &snapshot.error {
        eprintln!("! {error}");
    }

    let Some(current) = &snapshot.current else {
        println!("No weather loaded yet. Try `weather show --city <name>`.");
        return;
    };

    let star = if favorite { " ★" } else { "" };
    println!("{}", greeting(Utc::now()));
    println!("{accent}{}, {}{star}{RESET}", current.name, current.country);
    println!("{}", format_date(current.observed_at.timestamp(), DateStyle::Long));
    println!();
    println!(
        "  {} {}  {} ({})",
        weather_emoji(&current.icon),
        format_temperature(current.temperature, unit),
        current.condition,
        current.description
    );
    println!(
        "  Feels like {}   H {}  L {}",
        format_temperature(current.feels_like, unit),
        format_temperature(current.temp_max, unit),
        format_temperature(current.temp_min, unit)
    );
    println!(
        "  Wind {} {}   Humidity {}   Pressure {}",
        format_wind_speed(current.wind_speed, unit),
        wind_direction(current.wind_deg),
        format_humidity(current.humidity),
        format_pressure(current.pressure)
    );
    if let Some(visibility) = current.visibility {
        println!("  Visibility {}   Clouds {}%", format_visibility(visibility), current.cloudiness);
    }

    if let Some(report) = &snapshot.forecast {
        if !report.forecast.hourly.is_empty() {
            println!();
            println!("{accent}Next hours{RESET}");
            for reading in &report.forecast.hourly {
                println!(
                    "  {:>8}  {:>6}  {} {}",
                    format_date(reading.timestamp, DateStyle::Time),
                    format_temperature(reading.temperature, unit),
                    weather_emoji(&reading.icon_code),
                    reading.condition
                );
            }
        }

        if !report.forecast.daily.is_empty() {
            println!();
            println!("{accent}Daily{RESET}");
            for day in &report.forecast.daily {
                println!(
                    "  {:<12} {:>6} / {:<6} {} {:<14} {} {}",
                    format_date(day.representative_timestamp, DateStyle::Short),
                    format_temperature(day.temp_max, unit),
                    format_temperature(day.temp_min, unit),
                    weather_emoji(&day.dominant_icon_code),
                    day.dominant_condition,
                    format_humidity(day.avg_humidity),
                    format_wind_speed(day.avg_wind_speed, unit)
                );
            }
        }
    }

    if let Some(at) = snapshot.last_update {
        println!();
        println!("Updated {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
}

pub fn favorites(favorites: &[FavoriteLocation]) {
    if favorites.is_empty() {
        println!("No favorites saved. Add one with `weather favorites add`.");
        return;
    }

    for fav in favorites {
        println!("{}, {} ({:.4}, {:.4})", fav.name, fav.country, fav.latitude, fav.longitude);
    }
}
