use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{DeviceState, HvacMode, ThermostatError, ThermostatManager};

pub const API_URL: &str = "https://developer-api.nest.com";

/// Nest REST API client.
///
/// The API answers most requests with a 307 to a per-user host. Redirects are
/// followed by hand so the bearer token is sent along, and the last location is
/// remembered so later polls can go straight there.
pub struct NestThermostat {
    client: Client,
    api_url: String,
    token: String,
    read_redirect: Mutex<Option<String>>,
    write_redirect: Mutex<Option<String>>,
}

impl NestThermostat {
    pub fn new(api_url: String, token: String, timeout: Duration) -> Result<Self, ThermostatError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(ThermostatError::Client)?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token,
            read_redirect: Mutex::new(None),
            write_redirect: Mutex::new(None),
        })
    }

    fn device_url(&self, device_id: &str) -> String {
        format!("{}/devices/thermostats/{}", self.api_url, device_id)
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Response, ThermostatError> {
        let mut request = self.client.request(method, url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        request.send().await
            .map_err(|source| ThermostatError::Network { url: url.to_owned(), source })
    }

    /// Sends to `url`, following at most one 307 and caching where it pointed.
    async fn send_following(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        cache: &Mutex<Option<String>>,
    ) -> Result<String, ThermostatError> {
        let mut response = self.send(method.clone(), url, body).await?;
        let mut final_url = url.to_owned();

        if response.status() == StatusCode::TEMPORARY_REDIRECT {
            let location = response.headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
                .ok_or_else(|| ThermostatError::MissingRedirectLocation { url: url.to_owned() })?;
            debug!("Redirecting {} {} to {}", method, url, location);
            store(cache, Some(location.clone()));

            response = self.send(method, &location, body).await?;
            final_url = location;
        }

        let status = response.status();
        let text = response.text().await
            .map_err(|source| ThermostatError::Network { url: final_url.clone(), source })?;

        if status != StatusCode::OK {
            return Err(ThermostatError::Status {
                url: final_url,
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// Uses the cached redirect if there is one. If that comes back with an
    /// error status it is dropped and the canonical url is tried once.
    async fn request(
        &self,
        method: Method,
        canonical_url: &str,
        body: Option<&Value>,
        cache: &Mutex<Option<String>>,
    ) -> Result<String, ThermostatError> {
        let cached = load(cache);
        let url = cached.as_deref().unwrap_or(canonical_url);

        match self.send_following(method.clone(), url, body, cache).await {
            Err(ThermostatError::Status { status, .. }) if cached.is_some() => {
                info!("Cached redirect URL didn't work ({}) - trying '{}'", status, canonical_url);
                store(cache, None);
                self.send_following(method, canonical_url, body, cache).await
            }
            result => result,
        }
    }

    async fn write(&self, device_id: &str, payload: Value) -> Result<(), ThermostatError> {
        let url = self.device_url(device_id);
        self.request(Method::PUT, &url, Some(&payload), &self.write_redirect).await?;
        Ok(())
    }
}

fn load(cache: &Mutex<Option<String>>) -> Option<String> {
    cache.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn store(cache: &Mutex<Option<String>>, value: Option<String>) {
    *cache.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

#[async_trait]
impl ThermostatManager for NestThermostat {
    async fn read_device(&self) -> Result<DeviceState, ThermostatError> {
        let text = self.request(Method::GET, &self.api_url, None, &self.read_redirect).await?;
        parse_device_state(&text)
    }

    async fn set_hvac_mode(&self, device_id: &str, mode: HvacMode) -> Result<(), ThermostatError> {
        self.write(device_id, json!({ "hvac_mode": mode })).await
    }

    async fn set_target_temperature(&self, device_id: &str, target: f32) -> Result<(), ThermostatError> {
        // The API only accepts whole degrees for the _f fields.
        self.write(device_id, json!({ "target_temperature_f": target.round() as i64 })).await
    }
}

#[derive(Deserialize)]
struct NestResponse {
    devices: NestDevices,
}

#[derive(Deserialize)]
struct NestDevices {
    #[serde(default)]
    thermostats: Map<String, Value>,
}

/// There should only ever be one thermostat on the account, so take the first
/// one in the order the response lists them.
fn parse_device_state(json: &str) -> Result<DeviceState, ThermostatError> {
    let response: NestResponse = serde_json::from_str(json)?;
    let thermostat = response.devices.thermostats
        .into_iter()
        .next()
        .map(|(_, thermostat)| thermostat)
        .ok_or(ThermostatError::NoThermostat)?;
    Ok(serde_json::from_value(thermostat)?)
}
