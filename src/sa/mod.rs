//! Subnet administration record queries served from the topology store.

pub mod lft_record;

use std::fmt;

pub use lft_record::{IB_LFTR_COMPMASK_BLOCK, IB_LFTR_COMPMASK_LID, LftRecord, SaMethod, query_lft_records};

/// SA MAD status a query is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaStatus {
    NoResources,
    ReqInvalid,
    NoRecords,
    TooManyRecords,
    UnsupMethodAttr,
}

impl SaStatus {
    /// Status field value as it goes on the wire.
    pub fn code(&self) -> u16 {
        match self {
            SaStatus::UnsupMethodAttr => 0x000c,
            SaStatus::NoResources => 0x0100,
            SaStatus::ReqInvalid => 0x0200,
            SaStatus::NoRecords => 0x0300,
            SaStatus::TooManyRecords => 0x0400,
        }
    }
}

impl fmt::Display for SaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SaStatus::NoResources => "insufficient resources",
            SaStatus::ReqInvalid => "invalid request",
            SaStatus::NoRecords => "no records",
            SaStatus::TooManyRecords => "too many records",
            SaStatus::UnsupMethodAttr => "unsupported method or attribute",
        };
        write!(f, "{} (0x{:04x})", msg, self.code())
    }
}

impl std::error::Error for SaStatus {}
