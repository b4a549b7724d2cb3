use chrono::{DateTime, Utc};

pub trait TimeProvider {
    fn get_utc_time(&self) -> DateTime<Utc>;
}

#[derive(Default)]
pub struct RealTimeProvider {}

impl TimeProvider for RealTimeProvider {
    fn get_utc_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
#[derive(Debug)]
pub struct DummyTimeProvider {
    utc_time: DateTime<Utc>,
}

#[cfg(test)]
impl DummyTimeProvider {
    pub fn new(utc_time: DateTime<Utc>) -> Self {
        Self { utc_time }
    }

    /// Move the time returned by this dummy time provider forward by the given duration
    pub fn advance(&mut self, duration: chrono::Duration) {
        self.utc_time += duration;
    }
}

#[cfg(test)]
impl TimeProvider for DummyTimeProvider {
    fn get_utc_time(&self) -> DateTime<Utc> {
        self.utc_time
    }
}
