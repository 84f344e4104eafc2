//! Wire types for the Bot API

use serde::Deserialize;
use serde_json::Value;

/// A channel message as returned by the search and channel endpoints.
/// The API omits fields freely, so everything is optional; consumers
/// decide which absences they can live with.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Convert a response array into messages, dropping entries that are not
/// message objects. Some result arrays mix plain strings in with the
/// messages; those carry nothing usable.
pub(crate) fn messages_from(values: Vec<Value>) -> Vec<Message> {
    values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect()
}
