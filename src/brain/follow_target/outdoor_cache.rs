use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::brain::BrainFailure;
use crate::brain_fail;
use crate::io::outdoor::OutdoorTemperatureManager;
use crate::time_util::mytime::TimeProvider;

/// The outdoor temperature changes slowly and the weather API is rate
/// limited, so it is only fetched once per refresh interval.
///
/// A failed fetch leaves the temperature unknown until the next refresh.
pub struct OutdoorCache {
    refresh: Duration,
    last_checked: Option<DateTime<Utc>>,
    value: Option<f32>,
}

impl OutdoorCache {
    pub fn new(refresh: Duration) -> Self {
        Self {
            refresh,
            last_checked: None,
            value: None,
        }
    }

    fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_checked {
            None => true,
            // A clock that went backwards counts as due.
            Some(last) => (now - last).to_std().map_or(true, |elapsed| elapsed > self.refresh),
        }
    }

    pub fn get(
        &mut self,
        runtime: &Runtime,
        source: Option<&dyn OutdoorTemperatureManager>,
        time_provider: &impl TimeProvider,
    ) -> Result<Option<f32>, BrainFailure> {
        let Some(source) = source else {
            return Ok(None);
        };

        let now = time_provider.get_utc_time();
        if self.is_due(now) {
            debug!("Fetching outdoor temperature");
            self.last_checked = Some(now);
            self.value = match runtime.block_on(source.get_outdoor_temperature()) {
                Ok(temp) => Some(temp),
                Err(err) if err.is_fatal() => {
                    return Err(brain_fail!(format!("Cannot get outdoor temperature: {}", err)));
                }
                Err(err) => {
                    warn!("Outdoor temperature unknown: {}", err);
                    None
                }
            };
        }
        Ok(self.value)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::io::dummy::DummyIO;
    use crate::io::outdoor::dummy::{Dummy, ModifyState};
    use crate::time_util::mytime::DummyTimeProvider;
    use crate::time_util::test_utils::{date, time};

    use super::*;

    fn start_time() -> DateTime<Utc> {
        Utc.from_utc_datetime(&date(2020, 6, 8).and_time(time(9, 0, 0)))
    }

    #[test]
    fn refreshes_after_interval() {
        let rt = Runtime::new().expect("Failed to create runtime.");
        let (source, sender) = Dummy::create(&Some(55.0));
        let mut cache = OutdoorCache::new(Duration::from_secs(30));
        let mut time_provider = DummyTimeProvider::new(start_time());

        assert_eq!(cache.get(&rt, Some(&source as &dyn OutdoorTemperatureManager), &time_provider).unwrap(), Some(55.0));

        sender.send(ModifyState::SetTemp(60.0)).unwrap();
        time_provider.advance(chrono::Duration::seconds(30));
        assert_eq!(cache.get(&rt, Some(&source as &dyn OutdoorTemperatureManager), &time_provider).unwrap(), Some(55.0), "Exactly the interval is not yet due");
        assert_eq!(source.fetches(), 1);

        time_provider.advance(chrono::Duration::seconds(1));
        assert_eq!(cache.get(&rt, Some(&source as &dyn OutdoorTemperatureManager), &time_provider).unwrap(), Some(60.0));
        assert_eq!(source.fetches(), 2);
    }

    #[test]
    fn failure_is_unknown_until_next_refresh() {
        let rt = Runtime::new().expect("Failed to create runtime.");
        let (source, sender) = Dummy::create(&None);
        let mut cache = OutdoorCache::new(Duration::from_secs(30));
        let mut time_provider = DummyTimeProvider::new(start_time());

        assert_eq!(cache.get(&rt, Some(&source as &dyn OutdoorTemperatureManager), &time_provider).unwrap(), None);

        sender.send(ModifyState::SetTemp(48.0)).unwrap();
        time_provider.advance(chrono::Duration::seconds(10));
        assert_eq!(cache.get(&rt, Some(&source as &dyn OutdoorTemperatureManager), &time_provider).unwrap(), None);

        time_provider.advance(chrono::Duration::seconds(30));
        assert_eq!(cache.get(&rt, Some(&source as &dyn OutdoorTemperatureManager), &time_provider).unwrap(), Some(48.0));

        sender.send(ModifyState::Unavailable).unwrap();
        time_provider.advance(chrono::Duration::seconds(31));
        assert_eq!(cache.get(&rt, Some(&source as &dyn OutdoorTemperatureManager), &time_provider).unwrap(), None, "Old reading should not be kept");
    }

    #[test]
    fn no_source_is_unknown() {
        let rt = Runtime::new().expect("Failed to create runtime.");
        let mut cache = OutdoorCache::new(Duration::from_secs(30));
        let time_provider = DummyTimeProvider::new(start_time());
        assert_eq!(cache.get(&rt, None, &time_provider).unwrap(), None);
    }
}
