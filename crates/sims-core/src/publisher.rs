//! Publisher API (C5). Grounded on `publisher.go`'s `Unicast`/`Multicast`:
//! validate the event before the recipient, never block on delivery, and
//! let `Multicast` always succeed at the call level while reporting one
//! `ErrorCode` per recipient.

use std::collections::HashMap;

use sims_protocol::{Event, ErrorCode, MulticastResponse, SimsError};

use crate::identity::UserKey;
use crate::registry::Registry;

pub struct Publisher<'a> {
    registry: &'a Registry,
}

impl<'a> Publisher<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Publisher { registry }
    }

    /// Order matters: a missing event is reported before an invalid kind,
    /// and both are reported before a missing recipient. This is spec.md
    /// §4.4/§8's mandated order, not the original's -- `publisher.go`
    /// actually looks up the recipient (`ERR_NOT_FOUND`) before it checks
    /// the event at all.
    pub fn unicast(
        &self,
        user_id: &str,
        event: Option<Event>,
        selector: Option<serde_json::Value>,
    ) -> Result<(), SimsError> {
        let mut event = event.ok_or(SimsError::MissingEvent)?;
        if event.kind.is_heartbeat() {
            return Err(SimsError::InvalidEventType);
        }
        let key = UserKey::new(user_id)?;
        if selector.is_some() {
            event.selector = selector;
        }
        let channel = self.registry.find_channel(&key).ok_or(SimsError::NotFound)?;
        channel.try_send(event).map_err(|_| SimsError::NoConsumer)
    }

    pub fn multicast(
        &self,
        user_ids: &[String],
        event: Option<Event>,
        selector: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<MulticastResponse, SimsError> {
        if user_ids.is_empty() {
            return Err(SimsError::MissingUserId);
        }
        let mut selector = selector.unwrap_or_default();
        let mut user_errcode: HashMap<String, ErrorCode> = HashMap::new();
        for user_id in user_ids {
            let per_user_selector = selector.remove(user_id);
            if let Err(err) = self.unicast(user_id, event.clone(), per_user_selector) {
                user_errcode.insert(user_id.clone(), err.code());
            }
        }
        Ok(MulticastResponse { user_errcode })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::identity::key_from_header;
    use sims_protocol::{EventKind, Header};

    fn text_event() -> Event {
        Event {
            kind: EventKind::text(),
            data: b"hi".to_vec(),
            selector: None,
        }
    }

    fn connect(registry: &Registry, user_id: &str) {
        registry.create_event_queue(
            &key_from_header(Some(&Header {
                user_id: user_id.to_owned(),
                request_id: None,
            }))
            .unwrap(),
        );
    }

    #[test]
    fn unicast_missing_event_is_rejected() {
        let registry = Registry::new(RegistryConfig::default());
        let publisher = Publisher::new(&registry);
        assert!(matches!(
            publisher.unicast("alice", None, None),
            Err(SimsError::MissingEvent)
        ));
    }

    #[test]
    fn unicast_heartbeat_kind_is_rejected() {
        let registry = Registry::new(RegistryConfig::default());
        let publisher = Publisher::new(&registry);
        assert!(matches!(
            publisher.unicast("alice", Some(Event::heartbeat()), None),
            Err(SimsError::InvalidEventType)
        ));
    }

    #[test]
    fn unicast_to_unconnected_user_is_not_found() {
        let registry = Registry::new(RegistryConfig::default());
        let publisher = Publisher::new(&registry);
        assert!(matches!(
            publisher.unicast("ghost", Some(text_event()), None),
            Err(SimsError::NotFound)
        ));
    }

    #[test]
    fn unicast_with_no_reader_is_no_consumer() {
        let registry = Registry::new(RegistryConfig::default());
        connect(&registry, "alice");
        let publisher = Publisher::new(&registry);
        assert!(matches!(
            publisher.unicast("alice", Some(text_event()), None),
            Err(SimsError::NoConsumer)
        ));
    }

    #[test]
    fn multicast_with_no_recipients_is_rejected() {
        let registry = Registry::new(RegistryConfig::default());
        let publisher = Publisher::new(&registry);
        assert!(matches!(
            publisher.multicast(&[], Some(text_event()), None),
            Err(SimsError::MissingUserId)
        ));
    }

    #[test]
    fn multicast_reports_per_recipient_failure_but_succeeds_overall() {
        let registry = Registry::new(RegistryConfig::default());
        connect(&registry, "alice");
        let publisher = Publisher::new(&registry);
        let response = publisher
            .multicast(
                &["alice".to_owned(), "ghost".to_owned()],
                Some(text_event()),
                None,
            )
            .unwrap();
        assert_eq!(response.user_errcode.len(), 2);
        assert_eq!(response.user_errcode["alice"], ErrorCode::NoConsumer);
        assert_eq!(response.user_errcode["ghost"], ErrorCode::NotFound);
    }
}
