//! Thresholds for itinerary recalculation.

/// Configuration parameters for recalculating itineraries from
/// transit-only backends.
///
/// All distances are in meters and all times in seconds.
#[derive(Debug, Clone)]
pub struct RecalculationConfig {
    /// Walks shorter than this are not routed.
    pub min_walk_routing_distance: f64,

    /// Transit legs at the ends of an itinerary this short are replaced
    /// by walking.
    pub min_transit_leg_distance: f64,

    /// A boundary transit leg whose far stop is within this distance of the
    /// query endpoint may be walked instead.
    pub max_walk_optimization_distance: f64,

    /// Largest extra distance accepted when walking past the near stop of
    /// such a leg.
    pub max_walk_optimization_distance_difference: f64,

    /// Spare time required on top of an interior walk's duration.
    pub min_intermediate_walking_slack_secs: f64,

    /// Itineraries with a longer walk are dropped.
    pub max_walking_distance: f64,

    /// Keep itineraries that consist of a single walk.
    pub allow_walking_only: bool,
}

impl Default for RecalculationConfig {
    fn default() -> Self {
        Self {
            min_walk_routing_distance: 100.0,
            min_transit_leg_distance: 300.0,
            max_walk_optimization_distance: 1000.0,
            max_walk_optimization_distance_difference: 500.0,
            min_intermediate_walking_slack_secs: 60.0,
            max_walking_distance: 2000.0,
            allow_walking_only: false,
        }
    }
}

impl RecalculationConfig {
    pub fn with_min_walk_routing_distance(mut self, meters: f64) -> Self {
        self.min_walk_routing_distance = meters;
        self
    }

    pub fn with_min_transit_leg_distance(mut self, meters: f64) -> Self {
        self.min_transit_leg_distance = meters;
        self
    }

    pub fn with_max_walking_distance(mut self, meters: f64) -> Self {
        self.max_walking_distance = meters;
        self
    }

    pub fn with_min_intermediate_walking_slack(mut self, secs: f64) -> Self {
        self.min_intermediate_walking_slack_secs = secs;
        self
    }

    pub fn with_allow_walking_only(mut self, allow: bool) -> Self {
        self.allow_walking_only = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RecalculationConfig::default();

        assert_eq!(config.min_walk_routing_distance, 100.0);
        assert_eq!(config.min_transit_leg_distance, 300.0);
        assert_eq!(config.max_walk_optimization_distance, 1000.0);
        assert_eq!(config.max_walk_optimization_distance_difference, 500.0);
        assert_eq!(config.min_intermediate_walking_slack_secs, 60.0);
        assert_eq!(config.max_walking_distance, 2000.0);
        assert!(!config.allow_walking_only);
    }

    #[test]
    fn custom_config() {
        let config = RecalculationConfig::default()
            .with_min_walk_routing_distance(50.0)
            .with_min_transit_leg_distance(200.0)
            .with_max_walking_distance(1500.0)
            .with_min_intermediate_walking_slack(90.0)
            .with_allow_walking_only(true);

        assert_eq!(config.min_walk_routing_distance, 50.0);
        assert_eq!(config.min_transit_leg_distance, 200.0);
        assert_eq!(config.max_walking_distance, 1500.0);
        assert_eq!(config.min_intermediate_walking_slack_secs, 90.0);
        assert!(config.allow_walking_only);
    }
}
