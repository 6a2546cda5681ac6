//! Domain layer: match events, validation and season derivation.
//!
//! Everything in this module is pure. I/O lives in [`crate::log`],
//! [`crate::persistence`] and the stages in [`crate::service`].

pub mod event_id;
pub mod event_type;
pub mod match_event;
pub mod season;
pub mod timestamp;
pub mod validator;

pub use event_id::EventId;
pub use event_type::EventType;
pub use match_event::{EnrichmentRecord, MatchEvent, StoredItem};
pub use season::derive_season;
pub use timestamp::parse_timestamp;
pub use validator::{EVENT_ID_MAX_LEN, check_event_id, check_storable, validate};
