//! Identifier helpers
//!
//! Every record id is a fresh uuid7 bech32-encoded under a human-readable
//! prefix, so ids are time-ordered, collision-free and self-describing.
use crate::error::WorkflowError;
use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique prefixed id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

pub(crate) fn mint_id(hrp: &str) -> Result<String, WorkflowError> {
    new_uuid_to_bech32(hrp).map_err(|e| WorkflowError::Identifier(e.to_string()))
}

pub fn report_id() -> anyhow::Result<String> {
    new_uuid_to_bech32("report_")
}

pub fn user_id() -> anyhow::Result<String> {
    new_uuid_to_bech32("user_")
}
