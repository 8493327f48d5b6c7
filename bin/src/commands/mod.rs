//! CLI command implementations.

pub(crate) mod scale;
pub(crate) mod status;
pub(crate) mod synchronize;
pub(crate) mod update;
