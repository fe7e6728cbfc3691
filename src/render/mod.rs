//! Output rendering: fixed chat replies and JSON.

pub(crate) mod json;
pub(crate) mod reply;
