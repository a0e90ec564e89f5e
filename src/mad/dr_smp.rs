use crate::dr_path::DrPath;
use crate::enums::{Methods, SmiAttrID};
use crate::mad::helpers::wire_bytes;
use crate::mad::{IB_MGMT_CLASS_DIRECT_ROUTED_SMP, IB_SMP_DATA_SIZE, ib_mad};

pub const IB_LID_PERMISSIVE: u16 = 0xffff;

#[derive(Debug, Copy, Clone)]
#[repr(C, packed)]
#[allow(non_camel_case_types)]
pub struct dr_smp_mad {
    pub m_key: u64,
    pub drslid: u16,
    pub drdlid: u16,
    pub reserved: [u8; 28],
    pub attr_layout: [u8; 64],
    pub initial_path: [u8; 64],
    pub return_path: [u8; 64],
}

wire_bytes!(dr_smp_mad);

/// Assembles a directed route SMP addressed along `path`. `payload` lands in
/// the attribute area and is truncated to its 64 bytes.
pub fn build_dr_smp(
    path: &DrPath,
    method: Methods,
    attr_id: SmiAttrID,
    attr_mod: u32,
    tid: u64,
    payload: &[u8],
) -> ib_mad {
    let mut dr_smp = dr_smp_mad {
        m_key: 0x0,
        drslid: IB_LID_PERMISSIVE,
        drdlid: IB_LID_PERMISSIVE,
        reserved: [0; 28],
        attr_layout: [0; IB_SMP_DATA_SIZE],
        initial_path: path.path,
        return_path: [0; 64],
    };
    let len = payload.len().min(IB_SMP_DATA_SIZE);
    dr_smp.attr_layout[..len].copy_from_slice(&payload[..len]);

    let mut mad = ib_mad {
        base_version: 0x1,
        mgmt_class: IB_MGMT_CLASS_DIRECT_ROUTED_SMP,
        class_version: 0x1,
        method: method as u8,
        status: 0x0,
        hop_ptr: 0,
        hop_cnt: path.hop_count,
        tid: tid.to_be(),
        attr_id: (attr_id as u16).to_be(),
        additional_status: 0x0,
        attr_mod: attr_mod.to_be(),
        data: [0; 232],
    };

    let dr_bytes = dr_smp.to_bytes();
    mad.data[..dr_bytes.len()].copy_from_slice(&dr_bytes);

    mad
}

/// Turns a request into its GetResp carrying `payload` and `status`.
pub fn build_dr_resp(request: &ib_mad, status: u16, payload: &[u8]) -> Option<ib_mad> {
    let mut dr_smp = request.dr_smp()?;
    let mut resp = *request;

    dr_smp.attr_layout = [0; IB_SMP_DATA_SIZE];
    let len = payload.len().min(IB_SMP_DATA_SIZE);
    dr_smp.attr_layout[..len].copy_from_slice(&payload[..len]);

    // Direction bit marks a returning DR SMP
    resp.status = (status | 0x8000).to_be();
    resp.method = Methods::GetResp as u8;
    let dr_bytes = dr_smp.to_bytes();
    resp.data[..dr_bytes.len()].copy_from_slice(&dr_bytes);

    Some(resp)
}
