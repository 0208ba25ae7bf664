//! The RAID-5 stream: striping, parity maintenance, failure and recovery.

mod faults;
mod unit_io;


use std::io::SeekFrom;

use tracing::{debug, info};

use crate::error::{RaidError, Result};
use crate::events::{self, DiskIo, IoKind, StreamIo};
use crate::layout::{Geometry, Target};
use crate::store::BackingStore;
use crate::xor::xor_into;
use faults::FaultSet;
use unit_io::{read_unit, write_unit};

/// DiskState reports a member's health at the control surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiskState {
    Ok,
    Failed,
}

/// Raid5Stream exposes one seekable byte stream over N backing stores,
/// striping data across N−1 of them per stripe and keeping a rotating
/// parity unit on the remaining one. Any single member can fail and the
/// full logical range stays readable.
///
/// The stream owns its stores for its whole lifetime; dropping it drops
/// every store, failed or not. It is single-caller: no internal locking,
/// no concurrent use.
pub struct Raid5Stream {
    disks: Vec<Box<dyn BackingStore>>,
    geom: Geometry,
    faults: FaultSet,
    len: u64,
    pos: u64,
    // Unit-sized staging, reused across calls.
    unit_scratch: Vec<u8>,
    parity_scratch: Vec<u8>,
}

impl std::fmt::Debug for Raid5Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raid5Stream")
            .field("disks", &self.disks.len())
            .field("geom", &self.geom)
            .field("faults", &self.faults)
            .field("len", &self.len)
            .field("pos", &self.pos)
            .finish()
    }
}

impl Raid5Stream {
    /// `new` assembles a stream over `disks` with `unit_size`-byte stripe
    /// units. The initial logical length is the largest whole number of
    /// stripes the smallest member can hold.
    ///
    /// # Errors
    /// Returns [`RaidError::Argument`] on fewer than three disks, more
    /// disks than the failure registry covers, or a zero unit size.
    pub fn new(disks: Vec<Box<dyn BackingStore>>, unit_size: usize) -> Result<Self> {
        if disks.len() < 3 {
            return Err(RaidError::Argument(format!(
                "need at least 3 disks, got {}",
                disks.len()
            )));
        }
        if disks.len() > FaultSet::MAX_DISKS {
            return Err(RaidError::Argument(format!(
                "at most {} disks supported, got {}",
                FaultSet::MAX_DISKS,
                disks.len()
            )));
        }
        if unit_size == 0 {
            return Err(RaidError::Argument(
                "stripe unit size must be positive".into(),
            ));
        }

        let geom = Geometry::new(disks.len(), unit_size as u64);
        let min_len = disks.iter().map(|d| d.len()).min().unwrap_or(0);
        let len = geom.initial_logical_len(min_len);

        Ok(Self {
            disks,
            geom,
            faults: FaultSet::new(),
            len,
            pos: 0,
            unit_scratch: vec![0u8; unit_size],
            parity_scratch: vec![0u8; unit_size],
        })
    }

    /// Logical length in bytes.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current logical position.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.pos
    }

    /// `set_position` moves the cursor to an absolute offset.
    ///
    /// # Errors
    /// See [`seek`](Self::seek).
    pub fn set_position(&mut self, pos: u64) -> Result<u64> {
        self.seek(SeekFrom::Start(pos))
    }

    #[must_use]
    pub const fn unit_size(&self) -> u64 {
        self.geom.unit_size()
    }

    #[must_use]
    pub const fn disk_count(&self) -> usize {
        self.geom.disks()
    }

    /// `seek` moves the cursor and returns the new position. Seeking past
    /// the logical end is allowed; the next read returns zero bytes and
    /// the next write extends the stream.
    ///
    /// # Errors
    /// Returns [`RaidError::Seek`] if the resolved position is negative.
    pub fn seek(&mut self, from: SeekFrom) -> Result<u64> {
        let target = match from {
            SeekFrom::Start(p) => i128::from(p),
            SeekFrom::Current(d) => i128::from(self.pos) + i128::from(d),
            SeekFrom::End(d) => i128::from(self.len) + i128::from(d),
        };
        if target < 0 {
            return Err(RaidError::Seek(target));
        }
        self.pos = u64::try_from(target).map_err(|_| {
            RaidError::Argument(format!("position {target} exceeds the addressable range"))
        })?;
        Ok(self.pos)
    }

    /// `set_len` sets the logical length and grows every non-failed store
    /// to cover it in whole stripes. Physical stores are never shrunk, and
    /// the cursor does not move; after shrinking, the cursor may sit past
    /// the new end.
    ///
    /// # Errors
    /// Returns [`RaidError::Io`] if a store refuses to grow.
    pub fn set_len(&mut self, len: u64) -> Result<()> {
        let need = self.geom.required_store_len(len);
        for (i, disk) in self.disks.iter_mut().enumerate() {
            if self.faults.get(i) {
                continue;
            }
            if disk.len() < need {
                disk.set_len(need)?;
            }
        }
        self.len = len;
        Ok(())
    }

    /// `flush` pushes every non-failed store down to its medium.
    ///
    /// # Errors
    /// Returns [`RaidError::Io`] if a store fails to flush.
    pub fn flush(&mut self) -> Result<()> {
        for (i, disk) in self.disks.iter_mut().enumerate() {
            if !self.faults.get(i) {
                disk.flush()?;
            }
        }
        Ok(())
    }

    /// `read` copies up to `buf.len()` bytes from the cursor into `buf`,
    /// reconstructing units that live on a failed member from the other
    /// members. Returns the count copied, clamped at the logical end.
    ///
    /// # Errors
    /// Returns [`RaidError::Integrity`] when more than one disk is failed
    /// and there are bytes to read, [`RaidError::Io`] on store errors.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let res = self.read_slices(buf);
        events::record_stream_io(StreamIo {
            kind: IoKind::Read,
            bytes: res.as_ref().map_or(0, |&n| n as u64),
            error: res.is_err(),
        });
        res
    }

    /// `write` stores `buf` at the cursor, extending the stream first when
    /// the write reaches past the logical end. Parity is maintained per
    /// unit by read-modify-write.
    ///
    /// # Errors
    /// Returns [`RaidError::DiskFailed`] when a touched stripe's data or
    /// parity unit sits on a failed member, [`RaidError::Io`] on store
    /// errors. After an error the touched stripe may be partially written.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        let res = self.write_slices(buf);
        events::record_stream_io(StreamIo {
            kind: IoKind::Write,
            bytes: if res.is_ok() { buf.len() as u64 } else { 0 },
            error: res.is_err(),
        });
        res
    }

    /// `fail_disk` marks a member failed. Idempotent; no I/O.
    ///
    /// # Errors
    /// Returns [`RaidError::Argument`] if the index is out of range.
    pub fn fail_disk(&mut self, disk: usize) -> Result<()> {
        self.check_disk_index(disk)?;
        if !self.faults.get(disk) {
            info!("disk {disk}: marked failed");
        }
        self.faults.set(disk);
        Ok(())
    }

    /// `recover_disk` rebuilds a previously failed member from the others
    /// and marks it healthy. A no-op without I/O when the member is not
    /// failed.
    ///
    /// Every participating store, the recovering one included, must be
    /// large enough to cover the logical length; stores replaced behind a
    /// failed member are validated here before any rebuild I/O starts.
    ///
    /// # Errors
    /// Returns [`RaidError::Argument`] on an out-of-range index or an
    /// undersized store, [`RaidError::Integrity`] when another member is
    /// also failed, [`RaidError::Io`] on store errors.
    pub fn recover_disk(&mut self, disk: usize) -> Result<()> {
        self.check_disk_index(disk)?;
        if !self.faults.get(disk) {
            return Ok(());
        }
        if self.faults.count() > 1 {
            return Err(RaidError::Integrity(format!(
                "{} disks failed; rebuilding disk {disk} needs all other members",
                self.faults.count()
            )));
        }

        let need = self.geom.required_store_len(self.len);
        for (i, d) in self.disks.iter().enumerate() {
            if d.len() < need {
                return Err(RaidError::Argument(format!(
                    "disk {i} holds {} bytes, need {need} to cover the logical length",
                    d.len()
                )));
            }
        }

        self.rebuild(disk)?;
        self.faults.clear(disk);
        info!("disk {disk}: recovered");
        Ok(())
    }

    /// `is_disk_failed` returns the member's failure bit.
    ///
    /// # Errors
    /// Returns [`RaidError::Argument`] if the index is out of range.
    pub fn is_disk_failed(&self, disk: usize) -> Result<bool> {
        self.check_disk_index(disk)?;
        Ok(self.faults.get(disk))
    }

    /// `disk_states` reports every member's health. No I/O.
    #[must_use]
    pub fn disk_states(&self) -> Vec<DiskState> {
        (0..self.disks.len())
            .map(|i| {
                if self.faults.get(i) {
                    DiskState::Failed
                } else {
                    DiskState::Ok
                }
            })
            .collect()
    }

    #[must_use]
    pub fn status_string(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        for (i, d) in self.disks.iter().enumerate() {
            let state = if self.faults.get(i) { "FAILED" } else { "OK" };
            let _ = writeln!(out, "disk {i}: {state} (len={})", d.len());
        }
        out
    }

    fn read_slices(&mut self, buf: &mut [u8]) -> Result<usize> {
        let available = self.len.saturating_sub(self.pos);
        let want = available.min(buf.len() as u64) as usize;
        if want == 0 {
            return Ok(0);
        }
        if self.faults.count() > 1 {
            return Err(RaidError::Integrity(format!(
                "{} disks failed; a single-parity array cannot serve reads",
                self.faults.count()
            )));
        }

        let mut done = 0usize;
        while done < want {
            let t = self.geom.locate(self.pos);
            let chunk =
                ((want - done) as u64).min(self.geom.unit_size() - t.offset_in_unit) as usize;
            let out = &mut buf[done..done + chunk];

            if self.faults.get(t.disk) {
                self.reconstruct_into(&t, out)?;
            } else {
                read_unit(
                    self.disks[t.disk].as_mut(),
                    t.unit_offset + t.offset_in_unit,
                    out,
                )?;
            }

            self.pos += chunk as u64;
            done += chunk;
        }

        Ok(done)
    }

    /// Re-derives a slice of the failed member's unit as the XOR of every
    /// other member's unit at the same stripe. Always reads whole units,
    /// even when the caller asked for a sub-unit slice.
    fn reconstruct_into(&mut self, t: &Target, out: &mut [u8]) -> Result<()> {
        self.parity_scratch.fill(0);
        for peer in 0..self.geom.disks() {
            if peer == t.disk {
                continue;
            }
            read_unit(
                self.disks[peer].as_mut(),
                t.unit_offset,
                &mut self.unit_scratch,
            )?;
            xor_into(&mut self.parity_scratch, &self.unit_scratch);
        }

        let start = t.offset_in_unit as usize;
        out.copy_from_slice(&self.parity_scratch[start..start + out.len()]);

        events::record_disk_io(DiskIo {
            disk: t.disk,
            kind: IoKind::Reconstruct,
            bytes: self.geom.unit_size(),
            error: false,
        });
        Ok(())
    }

    fn write_slices(&mut self, buf: &[u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let end = self.pos.checked_add(buf.len() as u64).ok_or_else(|| {
            RaidError::Argument("write extends past the addressable range".into())
        })?;
        if end > self.len {
            self.set_len(end)?;
        }

        let mut done = 0usize;
        while done < buf.len() {
            let t = self.geom.locate(self.pos);
            let chunk =
                ((buf.len() - done) as u64).min(self.geom.unit_size() - t.offset_in_unit) as usize;

            if self.faults.get(t.disk) {
                return Err(RaidError::DiskFailed {
                    disk: t.disk,
                    op: "data write",
                });
            }
            if self.faults.get(t.parity_disk) {
                return Err(RaidError::DiskFailed {
                    disk: t.parity_disk,
                    op: "parity update",
                });
            }

            // Strict order: old data, old parity, new data, new parity.
            read_unit(
                self.disks[t.disk].as_mut(),
                t.unit_offset,
                &mut self.unit_scratch,
            )?;
            read_unit(
                self.disks[t.parity_disk].as_mut(),
                t.unit_offset,
                &mut self.parity_scratch,
            )?;

            // Strip the old unit's contribution, overlay the fresh bytes,
            // fold the new unit back in.
            xor_into(&mut self.parity_scratch, &self.unit_scratch);
            let start = t.offset_in_unit as usize;
            self.unit_scratch[start..start + chunk].copy_from_slice(&buf[done..done + chunk]);
            xor_into(&mut self.parity_scratch, &self.unit_scratch);

            write_unit(
                self.disks[t.disk].as_mut(),
                t.unit_offset,
                &self.unit_scratch,
            )?;
            write_unit(
                self.disks[t.parity_disk].as_mut(),
                t.unit_offset,
                &self.parity_scratch,
            )?;

            self.pos += chunk as u64;
            done += chunk;
        }

        Ok(())
    }

    fn rebuild(&mut self, disk: usize) -> Result<()> {
        let unit = self.geom.unit_size();
        let stripes = self
            .disks
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != disk)
            .map(|(_, d)| d.len())
            .min()
            .unwrap_or(0)
            / unit;
        debug!("disk {disk}: rebuild covering {stripes} stripes");

        for stripe in 0..stripes {
            let offset = self.geom.stripe_offset(stripe);
            self.parity_scratch.fill(0);
            for peer in 0..self.geom.disks() {
                if peer == disk {
                    continue;
                }
                read_unit(
                    self.disks[peer].as_mut(),
                    offset,
                    &mut self.unit_scratch,
                )?;
                xor_into(&mut self.parity_scratch, &self.unit_scratch);
            }
            write_unit(self.disks[disk].as_mut(), offset, &self.parity_scratch)?;
        }

        events::record_disk_io(DiskIo {
            disk,
            kind: IoKind::Rebuild,
            bytes: stripes * unit,
            error: false,
        });
        Ok(())
    }

    fn check_disk_index(&self, disk: usize) -> Result<()> {
        if disk >= self.disks.len() {
            return Err(RaidError::Argument(format!(
                "disk index out of range: {disk} (array has {})",
                self.disks.len()
            )));
        }
        Ok(())
    }
}
