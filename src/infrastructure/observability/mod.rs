//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_auth_event, record_http_request,
    set_active_sessions, AuthEvent, PrometheusMetrics,
};
