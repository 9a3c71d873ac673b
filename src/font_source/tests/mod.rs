//! Builder tests against small but complete source documents

pub(crate) mod fixtures;
