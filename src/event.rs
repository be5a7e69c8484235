//! Detection event parsing and logging.
//!
//! Cameras push best-effort JSON bodies to `POST /event`. Parsing is total:
//! a malformed body or a missing field never fails the request, it just
//! degrades to defaults. Missing values render as `"?"` in the log record,
//! mirroring what the cameras themselves omit.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt::Display;
use tracing::info;

/// Hough-transform candidate attached to a meteor event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeteorCandidate {
    pub rho: Option<f64>,
    pub theta: Option<f64>,
    pub votes: Option<i64>,
    pub length_px: Option<f64>,
}

/// IVS scan counters attached to a stack event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IvsCounters {
    pub polls: Option<i64>,
    pub active_polls: Option<i64>,
    pub total_rois: Option<i64>,
    pub last_rois: Option<i64>,
}

/// A detection event pushed by a camera, classified by its `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionEvent {
    Meteor {
        camera_id: String,
        timestamp_ms: i64,
        candidate: MeteorCandidate,
    },
    Stack {
        camera_id: String,
        timestamp_ms: i64,
        filename: Option<String>,
        ivs: IvsCounters,
    },
    Other {
        camera_id: String,
        timestamp_ms: i64,
        kind: String,
    },
}

/// Parse a raw event body into a [`DetectionEvent`].
///
/// Total over all inputs: bodies that are not JSON, or not a JSON object,
/// are treated as an empty object. `camera_id` defaults to `"unknown"` and
/// `timestamp_ms` to the receipt time.
pub fn parse_event(body: &[u8], received_at: DateTime<Utc>) -> DetectionEvent {
    let obj = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let camera_id = str_field(&obj, "camera_id").unwrap_or_else(|| "unknown".to_string());
    let timestamp_ms = obj
        .get("timestamp_ms")
        .and_then(Value::as_i64)
        .unwrap_or_else(|| received_at.timestamp_millis());
    let kind = str_field(&obj, "type").unwrap_or_else(|| "unknown".to_string());

    match kind.as_str() {
        "meteor" => {
            let cand = obj.get("candidate").and_then(Value::as_object);
            let candidate = MeteorCandidate {
                rho: cand.and_then(|c| c.get("rho")).and_then(Value::as_f64),
                theta: cand.and_then(|c| c.get("theta")).and_then(Value::as_f64),
                votes: cand.and_then(|c| c.get("votes")).and_then(Value::as_i64),
                length_px: cand.and_then(|c| c.get("length_px")).and_then(Value::as_f64),
            };
            DetectionEvent::Meteor {
                camera_id,
                timestamp_ms,
                candidate,
            }
        }
        "stack" => DetectionEvent::Stack {
            camera_id,
            timestamp_ms,
            filename: str_field(&obj, "filename"),
            ivs: IvsCounters {
                polls: obj.get("ivs_polls").and_then(Value::as_i64),
                active_polls: obj.get("ivs_active_polls").and_then(Value::as_i64),
                total_rois: obj.get("ivs_total_rois").and_then(Value::as_i64),
                last_rois: obj.get("ivs_last_rois").and_then(Value::as_i64),
            },
        },
        _ => DetectionEvent::Other {
            camera_id,
            timestamp_ms,
            kind,
        },
    }
}

/// Emit the structured log record for an event. Never fails.
pub fn record(event: &DetectionEvent) {
    match event {
        DetectionEvent::Meteor {
            camera_id,
            timestamp_ms,
            candidate,
        } => {
            info!(
                camera = %camera_id,
                ts_ms = timestamp_ms,
                rho = %opt(&candidate.rho),
                theta = %opt(&candidate.theta),
                votes = %opt(&candidate.votes),
                length_px = %opt(&candidate.length_px),
                "meteor event"
            );
        }
        DetectionEvent::Stack {
            camera_id,
            timestamp_ms,
            filename,
            ivs,
        } => {
            info!(
                camera = %camera_id,
                ts_ms = timestamp_ms,
                file = %opt(filename),
                ivs_polls = %opt(&ivs.polls),
                ivs_active_polls = %opt(&ivs.active_polls),
                ivs_total_rois = %opt(&ivs.total_rois),
                ivs_last_rois = %opt(&ivs.last_rois),
                "stack event"
            );
        }
        DetectionEvent::Other {
            camera_id,
            timestamp_ms,
            kind,
        } => {
            info!(
                camera = %camera_id,
                ts_ms = timestamp_ms,
                kind = %kind,
                "event"
            );
        }
    }
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Placeholder rendering for absent fields.
fn opt<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn receipt_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 16, 2, 0, 0).unwrap()
    }

    #[test]
    fn meteor_event_with_full_candidate() {
        let body = br#"{"type":"meteor","camera_id":"cam3","timestamp_ms":1718500000000,
            "candidate":{"rho":12.3,"theta":45,"votes":9,"length_px":30}}"#;

        let event = parse_event(body, receipt_time());
        assert_eq!(
            event,
            DetectionEvent::Meteor {
                camera_id: "cam3".to_string(),
                timestamp_ms: 1718500000000,
                candidate: MeteorCandidate {
                    rho: Some(12.3),
                    theta: Some(45.0),
                    votes: Some(9),
                    length_px: Some(30.0),
                },
            }
        );
    }

    #[test]
    fn meteor_event_with_missing_candidate_fields() {
        let body = br#"{"type":"meteor","camera_id":"cam1","candidate":{"rho":1.5}}"#;

        match parse_event(body, receipt_time()) {
            DetectionEvent::Meteor { candidate, .. } => {
                assert_eq!(candidate.rho, Some(1.5));
                assert_eq!(candidate.theta, None);
                assert_eq!(candidate.votes, None);
                assert_eq!(candidate.length_px, None);
            }
            other => panic!("expected meteor event, got {:?}", other),
        }
    }

    #[test]
    fn stack_event_with_ivs_counters() {
        let body = br#"{"type":"stack","camera_id":"cam2","filename":"stack_001.jpg",
            "ivs_polls":120,"ivs_active_polls":14,"ivs_total_rois":33,"ivs_last_rois":2}"#;

        match parse_event(body, receipt_time()) {
            DetectionEvent::Stack {
                camera_id,
                filename,
                ivs,
                ..
            } => {
                assert_eq!(camera_id, "cam2");
                assert_eq!(filename.as_deref(), Some("stack_001.jpg"));
                assert_eq!(ivs.polls, Some(120));
                assert_eq!(ivs.active_polls, Some(14));
                assert_eq!(ivs.total_rois, Some(33));
                assert_eq!(ivs.last_rois, Some(2));
            }
            other => panic!("expected stack event, got {:?}", other),
        }
    }

    #[test]
    fn non_json_body_degrades_to_unknown() {
        let event = parse_event(b"not json", receipt_time());
        assert_eq!(
            event,
            DetectionEvent::Other {
                camera_id: "unknown".to_string(),
                timestamp_ms: receipt_time().timestamp_millis(),
                kind: "unknown".to_string(),
            }
        );
    }

    #[test]
    fn non_object_json_degrades_to_unknown() {
        let event = parse_event(b"[1,2,3]", receipt_time());
        assert!(matches!(event, DetectionEvent::Other { ref kind, .. } if kind == "unknown"));
    }

    #[test]
    fn unrecognized_type_keeps_raw_tag() {
        let body = br#"{"type":"heartbeat","camera_id":"cam9"}"#;
        match parse_event(body, receipt_time()) {
            DetectionEvent::Other { camera_id, kind, .. } => {
                assert_eq!(camera_id, "cam9");
                assert_eq!(kind, "heartbeat");
            }
            other => panic!("expected other event, got {:?}", other),
        }
    }

    #[test]
    fn missing_timestamp_defaults_to_receipt_time() {
        let body = br#"{"type":"meteor"}"#;
        match parse_event(body, receipt_time()) {
            DetectionEvent::Meteor { timestamp_ms, .. } => {
                assert_eq!(timestamp_ms, receipt_time().timestamp_millis());
            }
            other => panic!("expected meteor event, got {:?}", other),
        }
    }

    #[test]
    fn placeholder_renders_missing_values() {
        assert_eq!(opt::<f64>(&None), "?");
        assert_eq!(opt(&Some(12.3)), "12.3");
    }

    #[test]
    fn record_never_panics() {
        record(&parse_event(b"not json", receipt_time()));
        record(&parse_event(br#"{"type":"meteor"}"#, receipt_time()));
        record(&parse_event(br#"{"type":"stack"}"#, receipt_time()));
    }
}
