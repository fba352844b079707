use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("line_webhook_statds")
        .with_description("LINE echo webhook statistics")
        .with_unit("event")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

pub fn incr_signature_statds(result: &str) {
    incr_statds("signature".to_string(), result.into())
}

pub fn incr_event_outcome_statds(outcome: &str) {
    incr_statds("event_outcome".to_string(), outcome.into())
}
