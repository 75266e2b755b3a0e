//! Version-neutral weather forecast

use crate::dto::WeatherForecast;
use chrono::{Days, Local};
use keyver_core::{get, Json, ResponseDoc, RouteError, RouteVersionTable};
use rand::seq::SliceRandom;
use rand::Rng;

pub const SUMMARIES: [&str; 10] = [
    "Freezing", "Bracing", "Chilly", "Cool", "Mild", "Warm", "Balmy", "Hot", "Sweltering",
    "Scorching",
];

/// Forecasts for the next five days
pub fn forecast() -> Vec<WeatherForecast> {
    let mut rng = rand::thread_rng();
    let today = Local::now().date_naive();

    (1..=5u64)
        .filter_map(|day| {
            let date = today.checked_add_days(Days::new(day))?;
            let summary = SUMMARIES.choose(&mut rng).copied().unwrap_or("Mild");
            Some(WeatherForecast::new(date, rng.gen_range(-20..55), summary))
        })
        .collect()
}

pub fn register(table: &mut RouteVersionTable) -> Result<(), RouteError> {
    table.neutral(
        "/WeatherForecast",
        get(|| async { Json(forecast()) })
            .summary("Weather Forecast")
            .description("This endpoint get's next 5 days weather forecast")
            .tag("Weather Forecast")
            .response(200, ResponseDoc::new("Success").schema("WeatherForecast").list()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_consecutive_days() {
        let days = forecast();

        assert_eq!(days.len(), 5);
        assert!(days.windows(2).all(|w| w[1].date == w[0].date + Days::new(1)));
        assert!(days
            .iter()
            .all(|d| (-20..55).contains(&d.temperature_c)
                && SUMMARIES.contains(&d.summary.as_deref().unwrap_or(""))));
    }
}
