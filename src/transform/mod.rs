//! Transform adapters from upstream API shapes into per-turn domain values.

pub(crate) mod adverse_event;
pub(crate) mod drug;
