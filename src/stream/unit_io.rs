//! Unit-granular transfers against a single backing store.

use std::io;

use crate::error::{RaidError, Result};
use crate::store::BackingStore;

/// `read_unit` fills `buf` from `store` starting at `offset`, looping over
/// short reads. Hitting end-of-store before `buf` is full is an error, not
/// a partial success.
///
/// # Errors
/// Returns [`RaidError::Io`] on a failed or truncated read.
pub fn read_unit(store: &mut dyn BackingStore, offset: u64, buf: &mut [u8]) -> Result<()> {
    store.seek(offset)?;
    let mut filled = 0;
    while filled < buf.len() {
        let n = store.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(RaidError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "store ended after {filled} of {} bytes at offset {offset}",
                    buf.len()
                ),
            )));
        }
        filled += n;
    }
    Ok(())
}

/// `write_unit` stores `buf` at `offset`, looping over short writes.
///
/// # Errors
/// Returns [`RaidError::Io`] on a failed or truncated write.
pub fn write_unit(store: &mut dyn BackingStore, offset: u64, buf: &[u8]) -> Result<()> {
    store.seek(offset)?;
    let mut written = 0;
    while written < buf.len() {
        let n = store.write(&buf[written..])?;
        if n == 0 {
            return Err(RaidError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "store accepted {written} of {} bytes at offset {offset}",
                    buf.len()
                ),
            )));
        }
        written += n;
    }
    Ok(())
}
