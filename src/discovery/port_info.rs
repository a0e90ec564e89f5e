//! PortInfo receiver: entry point for every PortInfo response.

use std::io;

use crate::context::PortInfoContext;
use crate::discovery::{Discovery, Response, dr_payload, endport, pkey, switch_port};
use crate::enums::SmiAttrID;
use crate::lock_err;
use crate::mad::{IB_SMP_STATUS_INVALID_FIELD, port_info};
use crate::req::Signal;
use crate::subnet::{NodeKind, PortKey, Subnet};

pub(crate) fn process(d: &Discovery, ctx: &PortInfoContext, resp: &Response) -> io::Result<()> {
    let dr = dr_payload(resp, SmiAttrID::PortInfo)?;
    let mut pi = port_info::from_bytes(&dr.attr_layout)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "could not parse PortInfo"))?;
    let tid = resp.mad.tid_ho();

    dump_port_info(log::Level::Trace, ctx.node_guid, ctx.port_guid, ctx.port_num, &pi);

    // Acted on once; later stages must not see it again
    if pi.client_register() != 0 {
        log::trace!("[pi_rcv] Client reregister received on response");
        pi.set_client_register(0);
    }

    if ctx.light_sweep {
        log::debug!(
            "[pi_rcv] Got light sweep response from remote port of parent node GUID 0x{:016x} port 0x{:016x}, commencing heavy sweep",
            ctx.node_guid,
            ctx.port_guid
        );
        d.state_mgr.signal(Signal::ChangeDetected);
        return Ok(());
    }

    let mut subn = d.subnet.write().map_err(lock_err)?;

    let Some(node_guid) = subn.port(ctx.port_guid).map(|p| p.node_guid) else {
        log::error!(
            "[pi_rcv] ERR 0F06: No port object for port with GUID 0x{:016x} for parent node GUID 0x{:016x}, TID 0x{:x}",
            ctx.port_guid,
            ctx.node_guid,
            tid
        );
        return Ok(());
    };
    let key = PortKey::new(node_guid, ctx.port_num);

    // A Set is acknowledged with a GetResp, so only the context can tell
    // the two apart.
    if ctx.set_method {
        process_set(&mut subn, ctx, key, resp, &pi);
        return Ok(());
    }

    let Some(node) = subn.node_mut(node_guid) else {
        log::error!(
            "[pi_rcv] ERR 0F09: Port 0x{:016x} refers to unknown node 0x{:016x}",
            ctx.port_guid,
            node_guid
        );
        return Ok(());
    };
    let kind = node.kind();
    let node_type = node.node_info.node_type;
    let Some(physp) = node.physp_mut(ctx.port_num) else {
        log::error!(
            "[pi_rcv] ERR 0F0A: Port num {} out of range for node 0x{:016x}",
            ctx.port_num,
            node_guid
        );
        return Ok(());
    };

    // Fresh path from the envelope, the stored one may be stale
    let path = resp.envelope_path(&dr);
    let first_seen = !physp.valid;
    if first_seen {
        log::debug!("[pi_rcv] Initializing port number {} path [{}]", ctx.port_num, path);
        physp.init(ctx.port_guid, path);
    } else {
        physp.dr_path = path;
    }

    if let Some(port) = subn.port_guid_tbl.get_mut(&ctx.port_guid) {
        port.discovery_count += 1;
        if first_seen {
            port.add_new_physp(ctx.port_num);
        }
    }

    log::debug!(
        "[pi_rcv] Discovered port num {} with GUID 0x{:016x} for parent node GUID 0x{:016x}, TID 0x{:x}",
        ctx.port_num,
        ctx.port_guid,
        node_guid,
        tid
    );

    if ctx.update_master_sm_base_lid {
        log::debug!(
            "[pi_rcv] update_master_sm is set, updating master_sm_base_lid to: {}",
            pi.master_sm_lid()
        );
        subn.master_sm_base_lid = pi.master_sm_lid();
    }

    match kind {
        Some(NodeKind::Endpoint) => process_ca_or_router_port(d, &mut subn, key, &pi),
        Some(NodeKind::Switch) => switch_port::process(d, &mut subn, key, &pi),
        None => {
            log::error!(
                "[pi_rcv] ERR 0F07: Unknown node type {} with GUID 0x{:016x}",
                node_type,
                node_guid
            );
        }
    }

    pkey::get_tables(d, &mut subn, key);

    Ok(())
}

fn process_set(subn: &mut Subnet, ctx: &PortInfoContext, key: PortKey, resp: &Response, pi: &port_info) {
    let status = resp.status();

    let Some(physp) = subn.physp_mut(key).filter(|p| p.valid) else {
        log::error!(
            "[pi_rcv] ERR 0F11: SetResp() for undiscovered port {} of node 0x{:016x}",
            key.port_num,
            key.node_guid
        );
        return;
    };

    if !ctx.ignore_errors && status != 0 {
        let level = if ctx.active_transition && status == IB_SMP_STATUS_INVALID_FIELD {
            log::info!(
                "[pi_rcv] Received error status 0x{:x} for SetResp() during ACTIVE transition",
                status
            );
            log::Level::Info
        } else {
            log::error!("[pi_rcv] ERR 0F10: Received error status 0x{:x} for SetResp()", status);
            log::Level::Error
        };
        dump_port_info(level, key.node_guid, physp.port_guid, key.port_num, pi);
    }

    log::trace!(
        "[pi_rcv] Received logical SetResp() for GUID 0x{:016x}, port num {} for parent node GUID 0x{:016x} TID 0x{:x}",
        physp.port_guid,
        key.port_num,
        key.node_guid,
        resp.mad.tid_ho()
    );

    physp.set_port_info(pi);
    physp.got_set_resp = true;
}

fn process_ca_or_router_port(d: &Discovery, subn: &mut Subnet, key: PortKey, pi: &port_info) {
    if let Some(physp) = subn.physp_mut(key) {
        physp.set_port_info(pi);
        if let Some(orig_lid) = physp.port_info.trim_base_lid() {
            log::error!("[pi_rcv] ERR 0F08: Invalid base LID 0x{:x} corrected", orig_lid);
        }
    }

    endport::process(d, subn, key, pi);
}

pub(crate) fn dump_port_info(level: log::Level, node_guid: u64, port_guid: u64, port_num: u8, pi: &port_info) {
    if !log::log_enabled!(level) {
        return;
    }
    log::log!(
        level,
        "PortInfo dump: node_guid 0x{:016x} port_guid 0x{:016x} port_num {}\n\
         \tbase_lid {} master_sm_base_lid {} capability_mask 0x{:08x}\n\
         \tlocal_port_num {} port_state {} phys_state {} lmc {}\n\
         \tlink_width_active {} link_speed_active {} mtu_cap {} neighbor_mtu {}",
        node_guid,
        port_guid,
        port_num,
        pi.lid(),
        pi.master_sm_lid(),
        pi.capability_mask(),
        pi.local_portnum(),
        pi.port_state(),
        pi.port_physical_state(),
        pi.lmc(),
        pi.link_width_active(),
        pi.link_speed_active(),
        pi.mtu_cap(),
        pi.neighbor_mtu()
    );
}
