use crate::enums::IbNodeType;
use crate::mad::{IB_LFT_BLOCK_SIZE, IB_LFT_NO_PATH, node_info, switch_info};
use crate::subnet::port::PhysPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Channel adapter or router.
    Endpoint,
    Switch,
}

#[derive(Debug, Clone)]
pub struct Switch {
    pub switch_info: switch_info,
    /// Linear forwarding table, egress port indexed by LID.
    pub lft: Vec<u8>,
}

impl Switch {
    pub fn new(switch_info: switch_info) -> Self {
        let top = switch_info.linear_fdb_top() as usize;
        Switch { switch_info, lft: vec![IB_LFT_NO_PATH; top + 1] }
    }

    pub fn max_block_id_in_use(&self) -> u16 {
        (self.switch_info.linear_fdb_top() as usize / IB_LFT_BLOCK_SIZE) as u16
    }

    /// Copies block `block_num` into `out`, padding LIDs past the table with
    /// "no path".
    pub fn fwd_tbl_block(&self, block_num: u16, out: &mut [u8; IB_LFT_BLOCK_SIZE]) {
        let base = block_num as usize * IB_LFT_BLOCK_SIZE;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.lft.get(base + i).copied().unwrap_or(IB_LFT_NO_PATH);
        }
    }

    pub fn set_fwd_tbl_block(&mut self, block_num: u16, block: &[u8]) {
        let base = block_num as usize * IB_LFT_BLOCK_SIZE;
        let end = base + block.len().min(IB_LFT_BLOCK_SIZE);
        if self.lft.len() < end {
            self.lft.resize(end, IB_LFT_NO_PATH);
        }
        self.lft[base..end].copy_from_slice(&block[..end - base]);
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub node_info: node_info,
    pub sw: Option<Switch>,
    pub physps: Vec<PhysPort>,
    pub walked_gen: u64,
}

impl Node {
    /// Node with an invalid physical port slot for each of `0..=nports`.
    pub fn new(node_info: node_info) -> Self {
        let guid = node_info.node_guid_ho();
        let physps = (0..=node_info.nports).map(|n| PhysPort::new(guid, n)).collect();
        Node { node_info, sw: None, physps, walked_gen: 0 }
    }

    pub fn guid(&self) -> u64 {
        self.node_info.node_guid_ho()
    }

    pub fn node_type(&self) -> Result<IbNodeType, ()> {
        IbNodeType::try_from(self.node_info.node_type)
    }

    pub fn kind(&self) -> Option<NodeKind> {
        match self.node_type() {
            Ok(IbNodeType::CA) | Ok(IbNodeType::Router) => Some(NodeKind::Endpoint),
            Ok(IbNodeType::Switch) => Some(NodeKind::Switch),
            _ => None,
        }
    }

    pub fn physp(&self, port_num: u8) -> Option<&PhysPort> {
        self.physps.get(port_num as usize)
    }

    pub fn physp_mut(&mut self, port_num: u8) -> Option<&mut PhysPort> {
        self.physps.get_mut(port_num as usize)
    }
}
