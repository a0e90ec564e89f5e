//! P_KeyTable retrieval: the per-port fan-out and the block receiver.

use std::io;

use crate::context::{MadContext, PKeyContext};
use crate::discovery::{Discovery, Response, dr_payload};
use crate::enums::SmiAttrID;
use crate::lock_err;
use crate::mad::{IB_NUM_PKEY_ELEMENTS_IN_BLOCK, pkey_table};
use crate::subnet::{NodeKind, PortKey, Subnet};

/// IBM (OUI 00:50:76). Its switches report an enforcement cap they do not
/// honour.
pub const IB_VENDOR_IBM: u32 = 0x005076;

/// Requests every P_KeyTable block of `key`. Returns the number of
/// requests handed to the transport; a failed one is logged and the
/// remaining blocks are still requested.
pub(crate) fn get_tables(d: &Discovery, subn: &mut Subnet, key: PortKey) -> u16 {
    let Some(node) = subn.node_mut(key.node_guid) else {
        return 0;
    };
    let Some(physp) = node.physp(key.port_num) else {
        return 0;
    };
    let path = physp.dr_path;
    let port_guid = physp.port_guid;
    let is_switch = node.kind() == Some(NodeKind::Switch);
    let vendor_id = node.node_info.vendor_id_ho();

    let cap = match node.sw.as_mut() {
        Some(sw) if key.port_num != 0 => {
            if vendor_id == IB_VENDOR_IBM {
                if sw.switch_info.enforce_cap() != 0 {
                    log::debug!(
                        "[pkey_get] Ignoring partition enforcement cap {} reported by vendor 0x{:06x}",
                        sw.switch_info.enforce_cap(),
                        vendor_id
                    );
                }
                sw.switch_info.set_enforce_cap(0);
            }
            let cap = sw.switch_info.enforce_cap();
            if cap == 0 {
                log::trace!(
                    "[pkey_get] No partition enforcement on switch 0x{:016x}, skipping port {}",
                    key.node_guid,
                    key.port_num
                );
                return 0;
            }
            cap
        }
        _ => node.node_info.partition_cap_ho(),
    };

    let max_blocks = cap.div_ceil(IB_NUM_PKEY_ELEMENTS_IN_BLOCK as u16);
    let mut issued = 0;

    for block_num in 0..max_blocks {
        let attr_mod = if is_switch {
            block_num as u32 | ((key.port_num as u32) << 16)
        } else {
            block_num as u32
        };
        let ctx = MadContext::PKey(PKeyContext {
            node_guid: key.node_guid,
            port_guid,
            port_num: key.port_num,
            block_num,
            set_method: false,
        });

        match d.req.get(&path, SmiAttrID::PKeyTable, attr_mod, ctx) {
            Ok(()) => issued += 1,
            Err(e) => log::error!(
                "[pkey_get] ERR 0F12: Failure initiating PKeyTable request for port {} block {} ({})",
                key.port_num,
                block_num,
                e
            ),
        }
    }

    issued
}

pub(crate) fn process_block(d: &Discovery, ctx: &PKeyContext, resp: &Response) -> io::Result<()> {
    let dr = dr_payload(resp, SmiAttrID::PKeyTable)?;
    let status = resp.status();
    if status != 0 {
        log::error!(
            "[pkey_rcv] ERR 0F13: Error status 0x{:x} for PKeyTable block {} of port 0x{:016x}",
            status,
            ctx.block_num,
            ctx.port_guid
        );
        return Ok(());
    }

    let tbl = pkey_table::from_bytes(&dr.attr_layout)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "could not parse PKeyTable"))?;

    let mut subn = d.subnet.write().map_err(lock_err)?;
    let Some(physp) = subn.physp_mut(PortKey::new(ctx.node_guid, ctx.port_num)).filter(|p| p.valid) else {
        log::warn!(
            "[pkey_rcv] PKeyTable block {} for unknown port {} of node 0x{:016x}",
            ctx.block_num,
            ctx.port_num,
            ctx.node_guid
        );
        return Ok(());
    };

    log::trace!(
        "[pkey_rcv] Storing block {} of port {} on 0x{:016x}",
        ctx.block_num,
        ctx.port_num,
        ctx.node_guid
    );
    physp.pkey_blocks.insert(ctx.block_num, tbl);
    Ok(())
}
