//! Prometheus counters exposed at `/metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use domains::{LikeToggle, MediaKind};

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct OutcomeLabels {
    outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: String,
}

#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    stories_created: Counter,
    like_toggles: Family<OutcomeLabels, Counter>,
    uploads: Family<KindLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("storytime");
        let stories_created = Counter::default();
        let like_toggles = Family::<OutcomeLabels, Counter>::default();
        let uploads = Family::<KindLabels, Counter>::default();

        registry.register("stories_created", "Stories created", stories_created.clone());
        registry.register("like_toggles", "Like toggles by outcome", like_toggles.clone());
        registry.register("media_uploads", "Media attached to stories", uploads.clone());

        Self {
            registry,
            stories_created,
            like_toggles,
            uploads,
        }
    }

    pub fn story_created(&self) {
        self.stories_created.inc();
    }

    pub fn like_toggled(&self, outcome: LikeToggle) {
        let outcome = if outcome.liked { "liked" } else { "unliked" };
        self.like_toggles
            .get_or_create(&OutcomeLabels {
                outcome: outcome.into(),
            })
            .inc();
    }

    pub fn media_uploaded(&self, kind: MediaKind) {
        self.uploads
            .get_or_create(&KindLabels {
                kind: kind.as_str().into(),
            })
            .inc();
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}
