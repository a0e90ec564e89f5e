pub mod context;
pub mod discovery;
pub mod dr_path;
pub mod enums;
pub mod mad;
pub mod req;
pub mod sa;
pub mod sim;
pub mod subnet;

use std::fmt::Write;
use std::io;

pub use context::MadContext;
pub use discovery::{Discovery, Response};
pub use dr_path::{BindHandle, DrPath};
pub use subnet::{PortKey, Subnet, SubnetOptions};

pub(crate) fn lock_err<T: std::fmt::Debug>(e: T) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("Lock poisoned: {:?}", e))
}

/// Hex dump, 16 bytes per row with the row offset in front.
pub fn dump_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3 + bytes.len() / 16 * 8);
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "{:04x}:", row * 16);
        for b in chunk {
            let _ = write!(out, " {:02x}", b);
        }
        out.push('\n');
    }
    out
}
