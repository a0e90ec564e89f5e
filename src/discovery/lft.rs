use std::io;

use crate::context::LftContext;
use crate::discovery::{Discovery, Response, dr_payload};
use crate::enums::SmiAttrID;
use crate::lock_err;
use crate::mad::lft_block;

pub(crate) fn process(d: &Discovery, ctx: &LftContext, resp: &Response) -> io::Result<()> {
    let dr = dr_payload(resp, SmiAttrID::LinearFwdTable)?;
    let status = resp.status();
    if status != 0 {
        log::error!(
            "[lft_rcv] ERR 3A01: Error status 0x{:x} for LFT block {} of 0x{:016x}",
            status,
            ctx.block_num,
            ctx.node_guid
        );
        return Ok(());
    }

    let block = lft_block::from_bytes(&dr.attr_layout)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "could not parse LFT block"))?;

    let mut subn = d.subnet.write().map_err(lock_err)?;
    let Some(sw) = subn.node_mut(ctx.node_guid).and_then(|n| n.sw.as_mut()) else {
        log::error!("[lft_rcv] ERR 3A02: LFT block for unknown switch 0x{:016x}", ctx.node_guid);
        return Ok(());
    };

    let data = block.data;
    sw.set_fwd_tbl_block(ctx.block_num, &data);
    log::trace!("[lft_rcv] Stored block {} of 0x{:016x}", ctx.block_num, ctx.node_guid);
    Ok(())
}
