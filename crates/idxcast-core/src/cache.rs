//! In-memory cache for assembled forecast results.
//!
//! The cache is owned by the caller and mutated through `&mut self`; a
//! single-session front end holds one and passes it along.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::forecast::{ForecastEngine, ForecastResult};
use crate::Symbol;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    symbol: Symbol,
    horizon: u32,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: ForecastResult,
    expires_at: Instant,
}

/// Forecast results keyed by `(symbol, horizon)` with a time-to-live.
#[derive(Debug, Clone)]
pub struct ForecastCache {
    map: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ForecastCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            ttl,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl == Duration::ZERO
    }

    /// Unexpired result for the key, if any.
    pub fn get(&self, symbol: &Symbol, horizon: u32) -> Option<&ForecastResult> {
        let key = CacheKey {
            symbol: symbol.clone(),
            horizon,
        };
        self.map
            .get(&key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| &entry.result)
    }

    /// Store a result. Empty results are not stored so a later run can
    /// retry the fetch.
    pub fn put(&mut self, symbol: Symbol, horizon: u32, result: ForecastResult) {
        if self.is_disabled() || result.is_empty() {
            return;
        }

        let expires_at = Instant::now() + self.ttl;
        self.map
            .insert(CacheKey { symbol, horizon }, CacheEntry { result, expires_at });
    }

    /// Cached result, or run the engine and cache what it returns.
    pub async fn get_or_run(
        &mut self,
        engine: &ForecastEngine,
        symbol: &Symbol,
        horizon: u32,
    ) -> ForecastResult {
        if let Some(result) = self.get(symbol, horizon) {
            return result.clone();
        }

        let result = engine.run(symbol, horizon).await;
        self.put(symbol.clone(), horizon, result.clone());
        result
    }

    /// Drop every horizon cached for `symbol`.
    pub fn invalidate(&mut self, symbol: &Symbol) {
        self.map.retain(|key, _| &key.symbol != symbol);
    }

    pub fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Number of entries, including expired ones not yet cleared.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::TodayOverview;

    fn symbol(value: &str) -> Symbol {
        Symbol::parse(value).expect("valid symbol")
    }

    fn result(last_close: f64) -> ForecastResult {
        let mut result = ForecastResult::empty("LightGBM");
        result.today_overview = Some(TodayOverview {
            last_close,
            change_pct: 0.0,
            volume: String::from("-"),
        });
        result
    }

    #[test]
    fn stores_and_separates_by_horizon() {
        let mut cache = ForecastCache::default();
        let bbri = symbol("BBRI.JK");

        assert!(cache.get(&bbri, 7).is_none());
        cache.put(bbri.clone(), 7, result(100.0));
        cache.put(bbri.clone(), 14, result(200.0));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&bbri, 7), Some(&result(100.0)));
        assert_eq!(cache.get(&bbri, 14), Some(&result(200.0)));
        assert!(cache.get(&symbol("BBCA.JK"), 7).is_none());
    }

    #[test]
    fn entries_expire() {
        let mut cache = ForecastCache::new(Duration::from_millis(20));
        let bbri = symbol("BBRI.JK");

        cache.put(bbri.clone(), 7, result(100.0));
        assert!(cache.get(&bbri, 7).is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get(&bbri, 7).is_none());

        cache.clear_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn empty_results_are_not_cached() {
        let mut cache = ForecastCache::default();
        cache.put(symbol("BBRI.JK"), 7, ForecastResult::empty("LightGBM"));
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_drops_all_horizons_for_symbol() {
        let mut cache = ForecastCache::default();
        cache.put(symbol("BBRI.JK"), 7, result(1.0));
        cache.put(symbol("BBRI.JK"), 30, result(2.0));
        cache.put(symbol("TLKM.JK"), 7, result(3.0));

        cache.invalidate(&symbol("BBRI.JK"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let mut cache = ForecastCache::disabled();
        assert!(cache.is_disabled());
        cache.put(symbol("BBRI.JK"), 7, result(1.0));
        assert_eq!(cache.len(), 0);
    }
}
