//! NodeInfo receiver: creates nodes and ports, records adjacency, and
//! starts the per-node queries.

use std::io;

use crate::context::{MadContext, NodeInfoContext, PortInfoContext, SwitchInfoContext};
use crate::discovery::{Discovery, Response, dr_payload};
use crate::dr_path::DrPath;
use crate::enums::SmiAttrID;
use crate::lock_err;
use crate::mad::node_info;
use crate::subnet::{Node, NodeKind, Port, PortKey, Subnet};

pub(crate) fn process(d: &Discovery, ctx: &NodeInfoContext, resp: &Response) -> io::Result<()> {
    let dr = dr_payload(resp, SmiAttrID::NodeInfo)?;
    let status = resp.status();
    if status != 0 {
        log::error!(
            "[ni_rcv] ERR 0D01: Error status 0x{:x} for NodeInfo via port {} of 0x{:016x}",
            status,
            ctx.port_num,
            ctx.node_guid
        );
        return Ok(());
    }

    let ni = node_info::from_bytes(&dr.attr_layout)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "could not parse NodeInfo"))?;
    let path = resp.envelope_path(&dr);

    let mut subn = d.subnet.write().map_err(lock_err)?;
    process_locked(d, &mut subn, ctx, &ni, path);
    Ok(())
}

fn process_locked(d: &Discovery, subn: &mut Subnet, ctx: &NodeInfoContext, ni: &node_info, path: DrPath) {
    let node_guid = ni.node_guid_ho();
    let port_guid = ni.port_guid_ho();
    let local_port = ni.local_port;

    let node_is_new = !subn.node_guid_tbl.contains_key(&node_guid);
    if node_is_new {
        let node = Node::new(*ni);
        if node.kind().is_none() {
            log::error!(
                "[ni_rcv] ERR 0D02: Unsupported node type {} for GUID 0x{:016x}",
                ni.node_type,
                node_guid
            );
            return;
        }
        log::debug!(
            "[ni_rcv] New node 0x{:016x} type {} with {} ports via [{}]",
            node_guid,
            ni.node_type,
            ni.nports,
            path
        );
        subn.node_guid_tbl.insert(node_guid, node);
    }

    let sweep = subn.sweep_gen;
    let Some(node) = subn.node_mut(node_guid) else {
        return;
    };
    let Some(kind) = node.kind() else {
        return;
    };

    // First visit in this sweep: a switch gets re-read from SwitchInfo down
    let walk_switch = kind == NodeKind::Switch && (node_is_new || node.walked_gen != sweep);

    if node.physp(local_port).is_none() {
        log::error!(
            "[ni_rcv] ERR 0D03: Local port {} beyond the {} ports of 0x{:016x}",
            local_port,
            ni.nports,
            node_guid
        );
        return;
    }
    if walk_switch {
        node.walked_gen = sweep;
    }
    let Some(physp) = node.physp_mut(local_port) else {
        return;
    };
    if !physp.valid {
        physp.init(port_guid, path);
    }
    let endport_walked = physp.walked_gen == sweep;
    if kind == NodeKind::Endpoint {
        physp.walked_gen = sweep;
    }

    // A switch has one port GUID for all its physical ports
    let default_port = match kind {
        NodeKind::Switch => 0,
        NodeKind::Endpoint => local_port,
    };
    let port_is_new = !subn.port_guid_tbl.contains_key(&port_guid);
    if port_is_new {
        subn.port_guid_tbl.insert(port_guid, Port::new(port_guid, node_guid, default_port));
    }
    if let Some(port) = subn.port_guid_tbl.get_mut(&port_guid) {
        port.add_new_physp(local_port);
    }

    if ctx.node_guid != 0 {
        let parent = PortKey::new(ctx.node_guid, ctx.port_num);
        let this = PortKey::new(node_guid, local_port);
        if let Err(e) = subn.link(parent, this) {
            log::warn!(
                "[ni_rcv] Cannot link 0x{:016x}:{} to 0x{:016x}:{} ({})",
                parent.node_guid,
                parent.port_num,
                node_guid,
                local_port,
                e
            );
        }
    }

    match kind {
        NodeKind::Switch if walk_switch => {
            let ctx = MadContext::SwitchInfo(SwitchInfoContext { node_guid, set_method: false });
            if let Err(e) = d.req.get(&path, SmiAttrID::SwitchInfo, 0, ctx) {
                log::error!("[ni_rcv] ERR 0D04: Failure initiating SwitchInfo request ({})", e);
            }
        }
        NodeKind::Endpoint if port_is_new || !endport_walked => {
            let pi_ctx = MadContext::PortInfo(PortInfoContext {
                node_guid,
                port_guid,
                port_num: local_port,
                ..Default::default()
            });
            if let Err(e) = d.req.get(&path, SmiAttrID::PortInfo, local_port as u32, pi_ctx) {
                log::error!("[ni_rcv] ERR 0D05: Failure initiating PortInfo request ({})", e);
            }

            // The manager's own CA: step out onto the fabric
            if path.hop_count == 0 && ctx.node_guid == 0 {
                let next = path.extend(local_port);
                let ni_ctx = MadContext::NodeInfo(NodeInfoContext { node_guid, port_num: local_port });
                if let Err(e) = d.req.get(&next, SmiAttrID::NodeInfo, 0, ni_ctx) {
                    log::error!("[ni_rcv] ERR 0D06: Failure initiating NodeInfo request ({})", e);
                }
            }
        }
        _ => log::trace!(
            "[ni_rcv] Node 0x{:016x} port {} already walked in sweep {}",
            node_guid,
            local_port,
            sweep
        ),
    }
}
