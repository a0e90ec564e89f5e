use std::io;

use crate::context::SmInfoContext;
use crate::discovery::{Discovery, Response, dr_payload};
use crate::enums::SmiAttrID;
use crate::lock_err;
use crate::mad::sm_info;
use crate::subnet::RemoteSm;

/// Records the priority and state another manager reports.
pub(crate) fn process(d: &Discovery, ctx: &SmInfoContext, resp: &Response) -> io::Result<()> {
    let dr = dr_payload(resp, SmiAttrID::SmInfo)?;
    let status = resp.status();
    if status != 0 {
        log::warn!(
            "[smi_rcv] Error status 0x{:x} for SMInfo of port 0x{:016x}",
            status,
            ctx.port_guid
        );
        return Ok(());
    }

    let smi = sm_info::from_bytes(&dr.attr_layout)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "could not parse SMInfo"))?;

    let mut subn = d.subnet.write().map_err(lock_err)?;
    log::debug!(
        "[smi_rcv] SM on port 0x{:016x}: guid 0x{:016x} priority {} state {}",
        ctx.port_guid,
        smi.guid(),
        smi.priority(),
        smi.sm_state()
    );
    subn.sm_guid_tbl
        .entry(ctx.port_guid)
        .and_modify(|sm| sm.pri_state = smi.pri_state())
        .or_insert_with(|| RemoteSm::new(ctx.port_guid, smi.pri_state()));

    Ok(())
}
