//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use axum::{body::Body, http::Request, response::Response, Router};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// Field values recorded on a span or event, rendered as strings.
#[derive(Debug, Clone, Default)]
pub struct Fields(pub HashMap<String, String>);

impl Fields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

#[derive(Debug, Clone)]
pub struct CapturedSpan {
    pub name: &'static str,
    pub fields: Fields,
}

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: tracing::Level,
    pub fields: Fields,
}

impl CapturedEvent {
    pub fn message(&self) -> &str {
        self.fields.get("message").unwrap_or_default()
    }
}

#[derive(Default)]
struct Inner {
    spans: Vec<CapturedSpan>,
    /// Span ID to index in `spans`. IDs are reused once a span closes.
    live: HashMap<u64, usize>,
    events: Vec<CapturedEvent>,
}

/// Layer that keeps every span and event for later assertions.
#[derive(Clone, Default)]
pub struct Capture {
    inner: Arc<Mutex<Inner>>,
}

impl Capture {
    /// Install as the thread-local default subscriber.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    pub fn spans(&self, name: &str) -> Vec<CapturedSpan> {
        let inner = self.inner.lock().unwrap();
        inner
            .spans
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|e| e.message().to_string())
            .collect()
    }
}

impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        attrs.record(&mut fields);

        let mut inner = self.inner.lock().unwrap();
        let index = inner.spans.len();
        inner.spans.push(CapturedSpan {
            name: attrs.metadata().name(),
            fields,
        });
        inner.live.insert(id.into_u64(), index);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(&index) = inner.live.get(&id.into_u64()) {
            values.record(&mut inner.spans[index].fields);
        }
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        event.record(&mut fields);

        self.inner.lock().unwrap().events.push(CapturedEvent {
            level: *event.metadata().level(),
            fields,
        });
    }
}

pub async fn send(router: Router, request: Request<Body>) -> Response {
    router.oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
