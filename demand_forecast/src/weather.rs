//! Simulated weather for future days
//!
//! Future weather is unknown, so forecasts draw it from a season-conditioned
//! distribution. The sampler is a trait so callers can swap in a seeded or
//! fixed source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution, Normal};

/// Season regime used to pick a weather distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Summer,
    /// Spring, fall, or anything unrecognised
    Mild,
}

impl Season {
    /// Map a season label; unknown or missing labels fall back to [`Season::Mild`]
    pub fn parse(label: Option<&str>) -> Self {
        match label.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("winter") => Season::Winter,
            Some("summer") => Season::Summer,
            _ => Season::Mild,
        }
    }

    /// (temperature mean, temperature std, rain probability, humidity mean, humidity std)
    fn regime(&self) -> (f64, f64, f64, f64, f64) {
        match self {
            Season::Winter => (65.0, 10.0, 0.3, 60.0, 10.0),
            Season::Summer => (85.0, 8.0, 0.2, 70.0, 12.0),
            Season::Mild => (75.0, 12.0, 0.25, 65.0, 15.0),
        }
    }
}

/// One simulated day of weather
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedWeather {
    pub temperature: f64,
    pub is_rainy: bool,
    pub humidity: f64,
}

/// Source of simulated weather for forecast days
pub trait WeatherSampler {
    fn sample(&mut self, season: Season) -> SimulatedWeather;
}

/// Draws weather from per-season normal and Bernoulli distributions
#[derive(Debug, Clone)]
pub struct SeasonalWeather<R: Rng> {
    rng: R,
}

impl<R: Rng> SeasonalWeather<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl SeasonalWeather<StdRng> {
    /// Reproducible weather for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Weather seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> WeatherSampler for SeasonalWeather<R> {
    fn sample(&mut self, season: Season) -> SimulatedWeather {
        let (temp_mean, temp_std, rain_p, humidity_mean, humidity_std) = season.regime();
        let temperature = Normal::new(temp_mean, temp_std)
            .map(|d| d.sample(&mut self.rng))
            .unwrap_or(temp_mean);
        let is_rainy = Bernoulli::new(rain_p)
            .map(|d| d.sample(&mut self.rng))
            .unwrap_or(false);
        let humidity = Normal::new(humidity_mean, humidity_std)
            .map(|d| d.sample(&mut self.rng))
            .unwrap_or(humidity_mean);

        SimulatedWeather {
            temperature,
            is_rainy,
            humidity,
        }
    }
}

/// Returns the same weather for every day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWeather(pub SimulatedWeather);

impl WeatherSampler for FixedWeather {
    fn sample(&mut self, _season: Season) -> SimulatedWeather {
        self.0
    }
}
