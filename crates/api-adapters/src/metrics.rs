//! Prometheus counters for the badge desk.
//!
//! ## Counters
//! - `badges_composed_total{template,outcome}`
//! - `resolutions_total{outcome}`
//! - `pickups_total{outcome}`

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Content type of the text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct BadgeLabels {
    template: String,
    outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct OutcomeLabels {
    outcome: String,
}

pub struct Metrics {
    registry: Registry,
    badges: Family<BadgeLabels, Counter>,
    resolutions: Family<OutcomeLabels, Counter>,
    pickups: Family<OutcomeLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let badges = Family::<BadgeLabels, Counter>::default();
        let resolutions = Family::<OutcomeLabels, Counter>::default();
        let pickups = Family::<OutcomeLabels, Counter>::default();

        registry.register(
            "badges_composed",
            "Badge documents composed, by template and outcome",
            badges.clone(),
        );
        registry.register(
            "resolutions",
            "Scanned-code resolutions, by outcome",
            resolutions.clone(),
        );
        registry.register(
            "pickups",
            "Pickup ledger appends, by outcome",
            pickups.clone(),
        );

        Self {
            registry,
            badges,
            resolutions,
            pickups,
        }
    }

    pub fn record_badge(&self, template: &str, outcome: &str) {
        self.badges
            .get_or_create(&BadgeLabels {
                template: template.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn record_resolution(&self, outcome: &str) {
        self.resolutions
            .get_or_create(&OutcomeLabels {
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn record_pickup(&self, outcome: &str) {
        self.pickups
            .get_or_create(&OutcomeLabels {
                outcome: outcome.to_string(),
            })
            .inc();
    }

    /// Renders every registered metric in the text exposition format.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
