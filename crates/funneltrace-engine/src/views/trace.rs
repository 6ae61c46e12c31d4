//! Per-session trace timeline.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use funneltrace_core::admin::{
    AdminApi, CorrelationSummary, EventRecord, IntegrationLogRecord, SessionDetail, SessionTrace,
    TraceStep, CRM_INTEGRATION, GA4_INTEGRATION, META_INTEGRATION,
};
use funneltrace_core::format::format_currency;
use funneltrace_core::payload::parse_opaque_json;
use funneltrace_core::status::business_status;

/// Fetch one session's detail and derive its trace view. Unlike batch
/// aggregation there is nothing to degrade to here: without the one detail
/// document the trace view has no content, so the fetch error propagates.
pub async fn load_session_trace<A>(api: &A, event_id: &str) -> Result<SessionTrace>
where
    A: AdminApi + ?Sized,
{
    let detail = api.get_session_detail(event_id).await?;
    let timeline = build_timeline(&detail);
    let correlation = correlation_summary(&detail);
    Ok(SessionTrace {
        detail,
        timeline,
        correlation,
    })
}

/// Merge one session's heterogeneous records into a single chronological
/// list of typed steps.
///
/// The collections carry no total order of their own; this builder imposes
/// one: session first, then events (each purchase followed by its inferred
/// payment-webhook step), then orders, then integration deliveries minus
/// the CRM rows, and finally a stable sort by timestamp. Stability keeps an
/// inferred step right behind its purchase event when timestamps tie.
pub fn build_timeline(detail: &SessionDetail) -> Vec<TraceStep> {
    let mut steps = vec![TraceStep {
        id: format!("session-{}", detail.session.event_id),
        title: "tracking_session".to_string(),
        subtitle: "session created".to_string(),
        timestamp: detail.session.created_at,
        status: "PROCESSED".to_string(),
        payload: to_payload(&detail.session),
    }];

    let mut events = detail.events.clone();
    events.sort_by_key(|event| event.created_at);
    for event in &events {
        let status = if event.event_type == "purchase" {
            "SUCCESS"
        } else {
            "SENT"
        };
        steps.push(TraceStep {
            id: format!("event-{}", event.id),
            title: format!("tracking_event: {}", event.event_type),
            subtitle: format!("eventId={}", event.event_id),
            timestamp: event.created_at,
            status: status.to_string(),
            payload: to_payload(event),
        });

        if event.event_type == "purchase" {
            if let Some(inferred) = infer_payment_webhook_step(event) {
                steps.push(inferred);
            }
        }
    }

    let mut orders = detail.orders.clone();
    orders.sort_by_key(|order| order.created_at);
    for order in &orders {
        steps.push(TraceStep {
            id: format!("order-{}", order.id),
            title: "order persisted".to_string(),
            subtitle: format!(
                "amount={}",
                format_currency(Some(order.amount), Some(&order.currency))
            ),
            timestamp: order.created_at,
            status: business_status(order),
            payload: to_payload(order),
        });
    }

    let mut integrations: Vec<&IntegrationLogRecord> = detail
        .integrations
        .iter()
        .filter(|row| row.integration != CRM_INTEGRATION)
        .collect();
    integrations.sort_by_key(|row| row.created_at);
    for row in integrations {
        let status = if row.status.is_empty() {
            "N/A".to_string()
        } else {
            row.status.clone()
        };
        steps.push(TraceStep {
            id: format!("integration-{}", row.id),
            title: integration_title(&row.integration),
            subtitle: integration_subtitle(row),
            timestamp: row.created_at,
            status,
            payload: integration_payload(row),
        });
    }

    steps.sort_by_key(|step| step.timestamp);
    steps
}

/// Synthesize the upstream payment-webhook confirmation a purchase event
/// implies. The purchase payload is opaque; when it parses, the step carries
/// the payload's own `type`/`id` and the purchase event's timestamp. When it
/// does not, no step is emitted: best-effort enrichment, not a failure.
fn infer_payment_webhook_step(event: &EventRecord) -> Option<TraceStep> {
    let payload = parse_opaque_json(event.payload_json.as_deref())?;

    let webhook_id = payload
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let webhook_type = payload
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("checkout.session.completed")
        .to_string();

    Some(TraceStep {
        id: format!("stripe-{}", event.id),
        title: "stripe_webhook_event (inferred)".to_string(),
        subtitle: format!("{webhook_type} - {webhook_id}"),
        timestamp: event.created_at,
        status: "PROCESSED".to_string(),
        payload,
    })
}

fn integration_title(integration: &str) -> String {
    match integration {
        GA4_INTEGRATION => "integration: GA4 MP".to_string(),
        META_INTEGRATION => "integration: Meta CAPI".to_string(),
        CRM_INTEGRATION => "integration: Pipedrive".to_string(),
        other => format!("integration: {other}"),
    }
}

fn integration_subtitle(row: &IntegrationLogRecord) -> String {
    let mut chunks: Vec<String> = Vec::new();
    if let Some(http_status) = row.http_status {
        chunks.push(format!("http={http_status}"));
    }
    if let Some(latency_ms) = row.latency_ms {
        chunks.push(format!("latency={latency_ms}ms"));
    }
    if let Some(error) = row.error_message.as_deref().filter(|e| !e.is_empty()) {
        chunks.push(error.to_string());
    }

    if chunks.is_empty() {
        format!("status={}", row.status)
    } else {
        chunks.join(" | ")
    }
}

/// The full log row, with request/response payload strings opportunistically
/// upgraded to structured JSON. Unparseable payloads stay raw strings.
fn integration_payload(row: &IntegrationLogRecord) -> Value {
    let mut payload = to_payload(row);
    if let Value::Object(fields) = &mut payload {
        if let Some(parsed) = parse_opaque_json(row.request_payload.as_deref()) {
            fields.insert("requestPayload".to_string(), parsed);
        }
        if let Some(parsed) = parse_opaque_json(row.response_payload.as_deref()) {
            fields.insert("responsePayload".to_string(), parsed);
        }
    }
    payload
}

/// Cross-system identifiers for the trace header: the first order's payment
/// identifiers plus the Meta delivery trace id.
pub fn correlation_summary(detail: &SessionDetail) -> CorrelationSummary {
    let order = detail.orders.first();
    CorrelationSummary {
        event_id: detail.session.event_id.clone(),
        order_id: order
            .map(|o| o.id.clone())
            .unwrap_or_else(|| "-".to_string()),
        payment_intent_id: order
            .and_then(|o| o.payment_intent_id.clone())
            .unwrap_or_else(|| "-".to_string()),
        stripe_session_id: order
            .map(|o| o.stripe_session_id.clone())
            .unwrap_or_else(|| "-".to_string()),
        transaction_id: order
            .map(|o| o.stripe_session_id.clone())
            .unwrap_or_else(|| "-".to_string()),
        fbtrace_id: resolve_fbtrace_id(detail),
    }
}

/// Pull `fbtrace_id` out of the Meta delivery's response payload. Missing
/// row, unparseable payload or an absent/empty field all yield "N/A";
/// malformed payloads never error.
pub fn resolve_fbtrace_id(detail: &SessionDetail) -> String {
    let Some(meta) = detail
        .integrations
        .iter()
        .find(|row| row.integration == META_INTEGRATION)
    else {
        return "N/A".to_string();
    };
    let Some(parsed) = parse_opaque_json(meta.response_payload.as_deref()) else {
        return "N/A".to_string();
    };
    match parsed.get("fbtrace_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => "N/A".to_string(),
    }
}

fn to_payload<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
