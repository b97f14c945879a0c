use k8s_openapi::api::core::v1::Event;
use kube::api::ListParams;
use kube::{Api, Client};
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::AppResult;
use crate::types::EventRecord;

pub const REASON_PULLED: &str = "Pulled";

lazy_static! {
    // The message format is kubelet-defined and not guaranteed stable; a
    // non-match is a normal outcome, not a parse failure.
    static ref PULLED_RE: Regex =
        Regex::new(r#"Successfully pulled image ".*" in (.*)"#).unwrap();
}

/// Extract the trailing duration phrase from a "Pulled" event message. The
/// value stays an opaque string; downstream consumers may parse it.
pub fn parse_pull_message(message: &str) -> Option<String> {
    PULLED_RE
        .captures(message)
        .map(|captures| captures[1].to_string())
}

/// Pick the pull duration out of an ordered event listing. The event store
/// does not guarantee a single occurrence, so the most recently listed
/// "Pulled" event wins.
pub fn pull_duration_from(events: &[EventRecord]) -> Option<String> {
    let last = events
        .iter()
        .filter(|e| e.reason == REASON_PULLED && e.object_kind == "Pod")
        .last()?;
    parse_pull_message(&last.message)
}

/// Query the cluster's event log for the pod's image-pull duration.
pub async fn find_pull_duration(
    client: Client,
    namespace: &str,
    pod_name: &str,
) -> AppResult<Option<String>> {
    let api: Api<Event> = Api::namespaced(client, namespace);
    let fields =
        format!("involvedObject.kind=Pod,involvedObject.name={pod_name},reason={REASON_PULLED}");
    let list = api.list(&ListParams::default().fields(&fields)).await?;

    let records: Vec<EventRecord> = list
        .items
        .iter()
        .map(|e| EventRecord {
            reason: e.reason.clone().unwrap_or_default(),
            message: e.message.clone().unwrap_or_default(),
            object_kind: e.involved_object.kind.clone().unwrap_or_default(),
            object_name: e.involved_object.name.clone().unwrap_or_default(),
        })
        .collect();

    Ok(pull_duration_from(&records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulled(message: &str) -> EventRecord {
        EventRecord {
            reason: REASON_PULLED.into(),
            message: message.into(),
            object_kind: "Pod".into(),
            object_name: "w".into(),
        }
    }

    #[test]
    fn parses_trailing_duration_phrase() {
        let msg = r#"Successfully pulled image "rootproject/root:6.32.02-ubuntu24.04" in 2.3s"#;
        assert_eq!(parse_pull_message(msg), Some("2.3s".to_string()));
    }

    #[test]
    fn non_matching_message_is_absent() {
        assert_eq!(parse_pull_message("Container image already present"), None);
        assert_eq!(pull_duration_from(&[]), None);
    }

    #[test]
    fn last_listed_pulled_event_wins() {
        let events = vec![
            pulled(r#"Successfully pulled image "busybox" in 4.1s"#),
            EventRecord {
                reason: "Started".into(),
                message: "Started container w".into(),
                object_kind: "Pod".into(),
                object_name: "w".into(),
            },
            pulled(r#"Successfully pulled image "busybox" in 850ms"#),
        ];

        assert_eq!(pull_duration_from(&events), Some("850ms".to_string()));
    }

    #[test]
    fn unparseable_last_event_is_absent_not_an_error() {
        let events = vec![
            pulled(r#"Successfully pulled image "busybox" in 4.1s"#),
            pulled("Image pull cached"),
        ];

        // Last-write-wins applies before parsing; earlier events are not
        // consulted as a fallback.
        assert_eq!(pull_duration_from(&events), None);
    }
}
