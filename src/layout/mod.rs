//! Stripe geometry and the rotating-parity address map.


/// Geometry fixes the byte layout of an array: how many disks it spans and
/// how wide one stripe unit is. Everything else is derived.
///
/// The mapping is a pure function of these two values. It never changes for
/// the lifetime of a stream and is stable across process restarts, so two
/// instances built over the same stores see the same layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    disks: usize,
    unit_size: u64,
}

/// Target pins one logical byte to its place in the array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    /// Stripe the byte lives in.
    pub stripe: u64,
    /// Data slot within the stripe, in `[0, data_disks)`.
    pub slot: usize,
    /// Byte offset inside the unit.
    pub offset_in_unit: u64,
    /// Physical disk holding the data unit.
    pub disk: usize,
    /// Physical disk holding the stripe's parity unit.
    pub parity_disk: usize,
    /// Physical byte offset of the unit, identical on every disk.
    pub unit_offset: u64,
}

impl Geometry {
    /// `new` builds a geometry over `disks` members with `unit_size`-byte
    /// units. Callers validate both values; the stream constructor rejects
    /// anything below three disks or a zero unit.
    #[must_use]
    pub const fn new(disks: usize, unit_size: u64) -> Self {
        Self { disks, unit_size }
    }

    #[must_use]
    pub const fn disks(&self) -> usize {
        self.disks
    }

    /// `data_disks` returns the number of data units per stripe.
    #[must_use]
    pub const fn data_disks(&self) -> usize {
        self.disks - 1
    }

    #[must_use]
    pub const fn unit_size(&self) -> u64 {
        self.unit_size
    }

    /// `stripe_span` returns the logical bytes carried by one stripe.
    #[must_use]
    pub const fn stripe_span(&self) -> u64 {
        self.unit_size * self.data_disks() as u64
    }

    /// `parity_disk` returns the disk holding parity for `stripe` under the
    /// left-symmetric rotation: stripe 0 parks parity on the last disk,
    /// stripe 1 on the one before it, wrapping every `disks` stripes.
    #[must_use]
    pub const fn parity_disk(&self, stripe: u64) -> usize {
        (self.disks - 1) - (stripe % self.disks as u64) as usize
    }

    /// `data_disk` maps a data slot to its physical disk by skipping over
    /// the stripe's parity disk.
    ///
    /// # Arguments
    /// * `slot` - Data slot within the stripe, in `[0, data_disks)`.
    /// * `parity_disk` - The stripe's parity disk.
    #[must_use]
    pub const fn data_disk(slot: usize, parity_disk: usize) -> usize {
        if slot < parity_disk { slot } else { slot + 1 }
    }

    /// `stripe_offset` returns the physical byte offset of a stripe's unit
    /// on every member disk.
    ///
    /// # Panics
    /// Panics if the offset calculation overflows.
    #[must_use]
    pub fn stripe_offset(&self, stripe: u64) -> u64 {
        stripe
            .checked_mul(self.unit_size)
            .expect("stripe offset overflow")
    }

    /// `locate` resolves a logical byte position to its physical target.
    ///
    /// # Returns
    /// A [`Target`] naming the stripe, slot, data disk, parity disk, and
    /// the offsets needed to reach the byte.
    #[must_use]
    pub fn locate(&self, pos: u64) -> Target {
        let stripe = pos / self.stripe_span();
        let in_stripe = pos % self.stripe_span();
        let slot = (in_stripe / self.unit_size) as usize;
        let offset_in_unit = in_stripe % self.unit_size;
        let parity_disk = self.parity_disk(stripe);

        Target {
            stripe,
            slot,
            offset_in_unit,
            disk: Self::data_disk(slot, parity_disk),
            parity_disk,
            unit_offset: self.stripe_offset(stripe),
        }
    }

    /// `required_store_len` returns the physical bytes each member must
    /// provide to cover `logical_len` bytes: whole stripes, one unit per
    /// disk.
    #[must_use]
    pub const fn required_store_len(&self, logical_len: u64) -> u64 {
        logical_len.div_ceil(self.stripe_span()) * self.unit_size
    }

    /// `initial_logical_len` returns the logical capacity implied by the
    /// smallest member: the largest whole number of stripes that fits.
    #[must_use]
    pub const fn initial_logical_len(&self, min_store_len: u64) -> u64 {
        (min_store_len / self.unit_size) * self.stripe_span()
    }
}
