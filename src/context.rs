//! Per-request context. The transport carries it opaquely and hands it back
//! with the correlated response; handlers trust it over anything in the
//! response payload.

use crate::enums::SmiAttrID;

/// NodeInfo Get. `node_guid`/`port_num` name the port the request went out
/// through, or 0 for the hop-0 probe of the manager's own node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeInfoContext {
    pub node_guid: u64,
    pub port_num: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchInfoContext {
    pub node_guid: u64,
    pub set_method: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortInfoContext {
    pub node_guid: u64,
    pub port_guid: u64,
    pub port_num: u8,
    pub set_method: bool,
    pub light_sweep: bool,
    pub update_master_sm_base_lid: bool,
    pub ignore_errors: bool,
    pub active_transition: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PKeyContext {
    pub node_guid: u64,
    pub port_guid: u64,
    pub port_num: u8,
    pub block_num: u16,
    pub set_method: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SmInfoContext {
    pub port_guid: u64,
    pub set_method: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LftContext {
    pub node_guid: u64,
    pub block_num: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MadContext {
    NodeInfo(NodeInfoContext),
    SwitchInfo(SwitchInfoContext),
    PortInfo(PortInfoContext),
    PKey(PKeyContext),
    SmInfo(SmInfoContext),
    Lft(LftContext),
}

impl MadContext {
    /// Attribute a request carrying this context must be for.
    pub fn attr_id(&self) -> SmiAttrID {
        match self {
            MadContext::NodeInfo(_) => SmiAttrID::NodeInfo,
            MadContext::SwitchInfo(_) => SmiAttrID::SwitchInfo,
            MadContext::PortInfo(_) => SmiAttrID::PortInfo,
            MadContext::PKey(_) => SmiAttrID::PKeyTable,
            MadContext::SmInfo(_) => SmiAttrID::SmInfo,
            MadContext::Lft(_) => SmiAttrID::LinearFwdTable,
        }
    }
}
