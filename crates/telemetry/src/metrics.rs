use lazy_static::lazy_static;
use prometheus::{
    Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ==== Detection Ingest Metrics ====
    pub static ref MONITOR_DETECTIONS_INGESTED: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "monitor_detections_ingested_total",
                "Total number of detection batches ingested",
            ),
            &["zone"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Alert Metrics ====
    pub static ref MONITOR_ALERTS_FIRED: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new("monitor_alerts_fired_total", "Total number of alerts fired"),
            &["type", "severity"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref MONITOR_ALERTS_SUPPRESSED: IntCounter = {
        let metric = IntCounter::new(
            "monitor_alerts_suppressed_total",
            "Total number of alerts suppressed by the cool-down window",
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Prediction Metrics ====
    pub static ref MONITOR_PREDICTIONS: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "monitor_predictions_total",
                "Total number of risk predictions served",
            ),
            &["outcome"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref MONITOR_PREDICTION_LATENCY: Histogram = {
        let metric = Histogram::with_opts(
            HistogramOpts::new(
                "monitor_prediction_latency_seconds",
                "Latency of remote inference attempts",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0]),
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Refresh Cycle Metrics ====
    pub static ref MONITOR_REFRESH_CYCLES: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "monitor_refresh_cycles_total",
                "Total number of periodic refresh cycles",
            ),
            &["status"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Parking Metrics ====
    pub static ref MONITOR_PARKING_OCCUPANCY: Gauge = {
        let metric = Gauge::new(
            "monitor_parking_occupancy_ratio",
            "Occupied-or-reserved share of the parking fleet",
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };
}
