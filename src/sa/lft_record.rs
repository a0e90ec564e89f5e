//! LinearForwardingTableRecord queries.

use std::sync::RwLock;

use crate::mad::IB_LFT_BLOCK_SIZE;
use crate::sa::SaStatus;
use crate::subnet::{Node, PhysPort, PortKey, Subnet};

pub const IB_LFTR_COMPMASK_LID: u64 = 1 << 0;
pub const IB_LFTR_COMPMASK_BLOCK: u64 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SaMethod {
    Get = 0x01,
    Set = 0x02,
    GetTable = 0x12,
    Delete = 0x15,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LftRecord {
    /// Base LID of the switch the block belongs to.
    pub lid: u16,
    pub block_num: u16,
    pub lft: [u8; IB_LFT_BLOCK_SIZE],
}

impl LftRecord {
    pub fn template(lid: u16, block_num: u16) -> Self {
        LftRecord { lid, block_num, lft: [0; IB_LFT_BLOCK_SIZE] }
    }
}

/// Answers a LinearForwardingTableRecord query from `requester`.
/// `comp_mask` selects which fields of `template` must match. Switches the
/// requester shares no partition with are invisible to it.
pub fn query_lft_records(
    subnet: &RwLock<Subnet>,
    requester: PortKey,
    method: SaMethod,
    comp_mask: u64,
    template: &LftRecord,
) -> Result<Vec<LftRecord>, SaStatus> {
    if !matches!(method, SaMethod::Get | SaMethod::GetTable) {
        log::error!("[lftr_rcv] ERR 4408: Unsupported Method ({:?})", method);
        return Err(SaStatus::UnsupMethodAttr);
    }

    let subn = subnet.read().map_err(|_| {
        log::error!("[lftr_rcv] Topology lock poisoned");
        SaStatus::NoResources
    })?;

    let Some(req_physp) = subn.physp(requester).filter(|p| p.valid) else {
        log::error!(
            "[lftr_rcv] ERR 4407: Cannot find requester physical port 0x{:016x}:{}",
            requester.node_guid,
            requester.port_num
        );
        return Err(SaStatus::ReqInvalid);
    };

    let mut switches: Vec<&Node> = subn.node_guid_tbl.values().filter(|n| n.sw.is_some()).collect();
    switches.sort_by_key(|n| n.guid());

    let mut records = Vec::new();
    for node in switches {
        by_comp_mask(&subn, node, req_physp, comp_mask, template, &mut records);
    }

    if method == SaMethod::Get {
        match records.len() {
            0 => return Err(SaStatus::NoRecords),
            1 => {}
            n => {
                log::error!("[lftr_rcv] ERR 4409: Got more than one record for SubnAdmGet ({})", n);
                return Err(SaStatus::TooManyRecords);
            }
        }
    }

    log::debug!("[lftr_rcv] Returning {} records", records.len());
    Ok(records)
}

fn by_comp_mask(
    subn: &Subnet,
    node: &Node,
    req_physp: &PhysPort,
    comp_mask: u64,
    template: &LftRecord,
    records: &mut Vec<LftRecord>,
) {
    let Some(sw) = node.sw.as_ref() else {
        return;
    };

    let Some(port) = subn.port(node.node_info.port_guid_ho()) else {
        log::error!("[lftr_rcv] ERR 4405: Failed to find port by node GUID 0x{:016x}", node.guid());
        return;
    };
    let Some(physp) = subn.physp(port.default_key()).filter(|p| p.valid) else {
        log::error!("[lftr_rcv] ERR 4406: Failed to find default physical port of 0x{:016x}", node.guid());
        return;
    };

    if !physp.shares_pkey_with(req_physp) {
        return;
    }

    let (min_lid, max_lid) = physp.lid_range();
    if comp_mask & IB_LFTR_COMPMASK_LID != 0 {
        log::trace!(
            "[lftr_rcv] Comparing LID {} to port LID range {} .. {}",
            template.lid,
            min_lid,
            max_lid
        );
        if template.lid < min_lid || template.lid > max_lid {
            return;
        }
    }

    let (min_block, max_block) = if comp_mask & IB_LFTR_COMPMASK_BLOCK != 0 {
        (template.block_num, template.block_num)
    } else {
        (0, sw.max_block_id_in_use())
    };

    for block_num in min_block..=max_block {
        let mut lft = [0; IB_LFT_BLOCK_SIZE];
        sw.fwd_tbl_block(block_num, &mut lft);
        log::trace!(
            "[lftr_rcv] New LinearForwardingTable: sw 0x{:016x} block {} lid {}",
            node.guid(),
            block_num,
            min_lid
        );
        records.push(LftRecord { lid: min_lid, block_num, lft });
    }
}
