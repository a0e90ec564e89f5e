use std::io;

use crate::context::{LftContext, MadContext, PortInfoContext, SwitchInfoContext};
use crate::discovery::{Discovery, Response, dr_payload};
use crate::enums::SmiAttrID;
use crate::lock_err;
use crate::mad::switch_info;
use crate::subnet::{NodeKind, Switch};

/// Stores SwitchInfo and asks for the PortInfo of every port and the whole
/// forwarding table. NodeInfo only requests it once per sweep for a switch.
pub(crate) fn process(d: &Discovery, ctx: &SwitchInfoContext, resp: &Response) -> io::Result<()> {
    let dr = dr_payload(resp, SmiAttrID::SwitchInfo)?;
    let status = resp.status();
    if status != 0 {
        log::error!(
            "[si_rcv] ERR 3601: Error status 0x{:x} for SwitchInfo of 0x{:016x}",
            status,
            ctx.node_guid
        );
        return Ok(());
    }

    let si = switch_info::from_bytes(&dr.attr_layout)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "could not parse SwitchInfo"))?;
    let path = resp.envelope_path(&dr);

    let mut subn = d.subnet.write().map_err(lock_err)?;
    let Some(node) = subn.node_mut(ctx.node_guid) else {
        log::error!("[si_rcv] ERR 3602: SwitchInfo for unknown node 0x{:016x}", ctx.node_guid);
        return Ok(());
    };
    if node.kind() != Some(NodeKind::Switch) {
        log::error!("[si_rcv] ERR 3603: SwitchInfo for non-switch node 0x{:016x}", ctx.node_guid);
        return Ok(());
    }

    match node.sw.as_mut() {
        Some(sw) => sw.switch_info = si,
        None => node.sw = Some(Switch::new(si)),
    }

    if ctx.set_method {
        return Ok(());
    }

    let port_guid = node.node_info.port_guid_ho();
    let nports = node.node_info.nports;
    let max_block = node.sw.as_ref().map_or(0, |sw| sw.max_block_id_in_use());

    log::debug!(
        "[si_rcv] Switch 0x{:016x}: {} ports, LFT top {}",
        ctx.node_guid,
        nports,
        si.linear_fdb_top()
    );

    for port_num in 0..=nports {
        let pi_ctx = MadContext::PortInfo(PortInfoContext {
            node_guid: ctx.node_guid,
            port_guid,
            port_num,
            ..Default::default()
        });
        if let Err(e) = d.req.get(&path, SmiAttrID::PortInfo, port_num as u32, pi_ctx) {
            log::error!("[si_rcv] ERR 3604: Failure initiating PortInfo request for port {} ({})", port_num, e);
        }
    }

    for block_num in 0..=max_block {
        let lft_ctx = MadContext::Lft(LftContext { node_guid: ctx.node_guid, block_num });
        if let Err(e) = d.req.get(&path, SmiAttrID::LinearFwdTable, block_num as u32, lft_ctx) {
            log::error!("[si_rcv] ERR 3605: Failure initiating LFT request for block {} ({})", block_num, e);
        }
    }

    Ok(())
}
