//! Hex + ASCII memory dump shared by `mr`, `i2crd`, and `spdread`.

use std::fmt::Write;

use ember_types::error::Result;

const BYTES_PER_LINE: usize = 16;

/// Write a classic hexdump of `data` to `out`, labelling rows from `base`.
pub fn dump_bytes(out: &mut dyn Write, data: &[u8], base: u32) -> Result<()> {
    writeln!(out, "Memory dump:")?;
    for (row, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        let addr = base.wrapping_add((row * BYTES_PER_LINE) as u32);
        write!(out, "{addr:#010x}  ")?;
        for byte in chunk {
            write!(out, "{byte:02x} ")?;
        }
        for _ in chunk.len()..BYTES_PER_LINE {
            write!(out, "   ")?;
        }
        write!(out, " ")?;
        for &byte in chunk {
            let c = if (0x20..=0x7e).contains(&byte) {
                byte as char
            } else {
                '.'
            };
            write!(out, "{c}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
