//! End ports: CA and router ports plus switch port 0.

use crate::context::{MadContext, SmInfoContext};
use crate::discovery::Discovery;
use crate::enums::SmiAttrID;
use crate::mad::port_info;
use crate::subnet::{PortKey, Subnet};

pub(crate) fn process(d: &Discovery, subn: &mut Subnet, key: PortKey, pi: &port_info) {
    let Some(physp) = subn.physp(key) else {
        return;
    };
    let port_guid = physp.port_guid;
    let path = physp.dr_path;

    // Switch port 0 has no link of its own
    if key.port_num != 0 {
        update_minimums(subn, port_guid, pi);
    }

    if port_guid == subn.sm_port_guid {
        if !pi.is_sm() {
            log::debug!("[pi_rcv] Setting IS_SM bit in port attributes");
            if let Err(e) = d.req.set_local_sm(path.bind, true) {
                log::error!("[pi_rcv] ERR 0F0B: Failure setting IS_SM on local port ({})", e);
            }
        }
        return;
    }

    // Whatever was known about a manager here is stale until SMInfo says
    // otherwise
    if let Some(sm) = subn.sm_guid_tbl.get_mut(&port_guid) {
        sm.clear_state();
    }

    if !pi.is_sm() {
        return;
    }

    if subn.opt.ignore_other_sm {
        log::debug!("[pi_rcv] Ignoring SM on port 0x{:016x}", port_guid);
        return;
    }

    log::debug!("[pi_rcv] Detected another SM. Requesting SMInfo port 0x{:016x}", port_guid);
    let ctx = MadContext::SmInfo(SmInfoContext { port_guid, set_method: false });
    if let Err(e) = d.req.get(&path, SmiAttrID::SmInfo, 0, ctx) {
        log::error!("[pi_rcv] ERR 0F05: Failure requesting SMInfo ({})", e);
    }
}

fn update_minimums(subn: &mut Subnet, port_guid: u64, pi: &port_info) {
    match pi.mtu() {
        Some(mtu) if mtu < subn.min_ca_mtu => {
            log::debug!(
                "[pi_rcv] Setting endport minimal MTU to: {:?} defined by port: 0x{:016x}",
                mtu,
                port_guid
            );
            subn.min_ca_mtu = mtu;
        }
        Some(_) => {}
        None => log::warn!(
            "[pi_rcv] Port 0x{:016x} reports invalid MTU cap {}",
            port_guid,
            pi.mtu_cap()
        ),
    }

    let rate = pi.compute_rate();
    if rate < subn.min_ca_rate {
        log::debug!(
            "[pi_rcv] Setting endport minimal rate to: {:?} defined by port: 0x{:016x}",
            rate,
            port_guid
        );
        subn.min_ca_rate = rate;
    }
}
