use crate::mad::helpers::wire_bytes;
use crate::mad::{IB_LFT_BLOCK_SIZE, IB_NUM_PKEY_ELEMENTS_IN_BLOCK};

/// One P_KeyTable block, 32 network-order P_Keys.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub struct pkey_table {
    pub data: [u8; 64],
}

wire_bytes!(pkey_table);

impl Default for pkey_table {
    fn default() -> Self {
        pkey_table { data: [0; 64] }
    }
}

impl pkey_table {
    pub fn from_pkeys(pkeys: &[u16]) -> Self {
        let mut tbl = pkey_table::default();
        for (i, pkey) in pkeys.iter().take(IB_NUM_PKEY_ELEMENTS_IN_BLOCK).enumerate() {
            tbl.data[i * 2..i * 2 + 2].copy_from_slice(&pkey.to_be_bytes());
        }
        tbl
    }

    pub fn pkey(&self, index: usize) -> u16 {
        let d = self.data;
        u16::from_be_bytes([d[index * 2], d[index * 2 + 1]])
    }

    pub fn pkeys(&self) -> impl Iterator<Item = u16> + '_ {
        (0..IB_NUM_PKEY_ELEMENTS_IN_BLOCK).map(|i| self.pkey(i))
    }
}

/// One LinearForwardingTable block: egress port per LID.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub struct lft_block {
    pub data: [u8; IB_LFT_BLOCK_SIZE],
}

wire_bytes!(lft_block);
