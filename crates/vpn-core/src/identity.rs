//! Endpoint identifiers and the remote instance names derived from them.
//!
//! The name is the only link between a local endpoint and its instance, so
//! `parse_id(&remote_name(id)) == Some(id)` must hold for every `id`.

use uuid::Uuid;

/// Prefix carried by the name of every instance backing an endpoint.
pub const NAME_PREFIX: &str = "vpn-";

/// Fresh random endpoint identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn remote_name(id: &str) -> String {
    format!("{NAME_PREFIX}{id}")
}

/// Recover the endpoint id from an instance name. `None` for foreign
/// instances and for the bare prefix.
pub fn parse_id(name: &str) -> Option<&str> {
    name.strip_prefix(NAME_PREFIX).filter(|id| !id.is_empty())
}
