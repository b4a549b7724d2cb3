use std::time::Duration;

use async_trait::async_trait;
use log::trace;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::WeatherConfig;

use super::{OutdoorError, OutdoorTemperatureManager};

pub const OWM_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

/// Current conditions from openweathermap.org for a single city.
pub struct OpenWeatherMap {
    client: Client,
    url: String,
    key: String,
    city_id: String,
    timeout: Duration,
}

impl OpenWeatherMap {
    pub fn new(config: &WeatherConfig, timeout: Duration) -> Result<Self, OutdoorError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(OutdoorError::Client)?;

        Ok(Self {
            client,
            url: config.get_url().to_owned(),
            key: config.get_key().to_owned(),
            city_id: config.get_city_id().to_owned(),
            timeout,
        })
    }
}

#[derive(Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
}

#[derive(Deserialize)]
struct WeatherMain {
    temp: f32,
}

#[async_trait]
impl OutdoorTemperatureManager for OpenWeatherMap {
    async fn get_outdoor_temperature(&self) -> Result<f32, OutdoorError> {
        let response = self.client.get(&self.url)
            .query(&[
                ("units", "Imperial"),
                ("id", self.city_id.as_str()),
                ("appid", self.key.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(OutdoorError::Status { status: status.as_u16(), body });
        }
        trace!("Weather response: {}", body);

        let weather: WeatherResponse = serde_json::from_str(&body)?;
        Ok(weather.main.temp)
    }
}
