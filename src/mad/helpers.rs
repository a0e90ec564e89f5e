/// Reads a big-endian bitfield of `width` bits starting `bit_offset` bits
/// into `data`, MSB first as laid out in the IBA attribute tables.
pub fn get_bitfield(data: &[u8], bit_offset: usize, width: usize) -> u64 {
    assert!((1..=64).contains(&width), "width must be 1-64");

    let first = bit_offset / 8;
    let lead = bit_offset % 8;
    let nbytes = (lead + width).div_ceil(8);
    assert!(first + nbytes <= data.len(), "buffer too short");

    let window = data[first..first + nbytes]
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | b as u128);
    let trail = nbytes * 8 - lead - width;
    let val = (window >> trail) & ((1u128 << width) - 1);

    log::trace!(
        "get_bitfield - offset: {}, width: {}, bytes: {:?}, val: 0x{:x}",
        bit_offset,
        width,
        &data[first..first + nbytes],
        val
    );

    val as u64
}

/// Writes `val` (truncated to `width` bits) into the bitfield described as in
/// [`get_bitfield`], leaving surrounding bits untouched.
pub fn set_bitfield(data: &mut [u8], bit_offset: usize, width: usize, val: u64) {
    assert!((1..=64).contains(&width), "width must be 1-64");

    let first = bit_offset / 8;
    let lead = bit_offset % 8;
    let nbytes = (lead + width).div_ceil(8);
    assert!(first + nbytes <= data.len(), "buffer too short");

    let window = data[first..first + nbytes]
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | b as u128);
    let trail = nbytes * 8 - lead - width;
    let mask = ((1u128 << width) - 1) << trail;
    let mut merged = (window & !mask) | (((val as u128) << trail) & mask);

    for byte in data[first..first + nbytes].iter_mut().rev() {
        *byte = (merged & 0xff) as u8;
        merged >>= 8;
    }
}

/// Byte conversion for the `repr(C, packed)` wire structs.
macro_rules! wire_bytes {
    ($ty:ty) => {
        impl $ty {
            pub fn to_bytes(&self) -> Vec<u8> {
                unsafe {
                    std::slice::from_raw_parts(
                        self as *const $ty as *const u8,
                        std::mem::size_of::<$ty>(),
                    )
                    .to_vec()
                }
            }

            pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
                if bytes.len() < std::mem::size_of::<$ty>() {
                    return None;
                }
                let mut val = std::mem::MaybeUninit::<$ty>::uninit();
                unsafe {
                    std::ptr::copy_nonoverlapping(
                        bytes.as_ptr(),
                        val.as_mut_ptr() as *mut u8,
                        std::mem::size_of::<$ty>(),
                    );
                    Some(val.assume_init())
                }
            }
        }
    };
}

/// Getter/setter pair over a `data: [u8; N]` attribute image.
macro_rules! bitfield {
    ($getter:ident, $setter:ident, $offset:expr, $width:expr, $type:ty) => {
        pub fn $getter(&self) -> $type {
            crate::mad::helpers::get_bitfield(&self.data, $offset, $width) as $type
        }

        pub fn $setter(&mut self, val: $type) {
            crate::mad::helpers::set_bitfield(&mut self.data, $offset, $width, val as u64);
        }
    };
}

pub(crate) use bitfield;
pub(crate) use wire_bytes;
