//! Locality scopes carried in the first name component.

use ndnfw_common::Name;

/// First component of names that must never cross a non-local face.
pub const LOCALHOST: &[u8] = b"localhost";

/// First component of names that may cross at most one non-local link.
pub const LOCALHOP: &[u8] = b"localhop";

/// Returns true for `/localhost` and everything under it.
pub fn is_localhost(name: &Name) -> bool {
    first_component_is(name, LOCALHOST)
}

/// Returns true for `/localhop` and everything under it.
pub fn is_localhop(name: &Name) -> bool {
    first_component_is(name, LOCALHOP)
}

fn first_component_is(name: &Name, component: &[u8]) -> bool {
    name.get(0).map_or(false, |c| c.as_bytes().as_ref() == component)
}
