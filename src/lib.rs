//! RAID-5 virtualization over pluggable seekable byte stores.
//!
//! [`Raid5Stream`] presents one random-access byte stream backed by N ≥ 3
//! independent stores, striping data across N−1 of them per stripe with a
//! rotating parity unit on the remaining one. Any single member may fail
//! and every logical byte stays readable; a replaced member is rebuilt in
//! place from the survivors.
//!
//! ```
//! use raid5_stream::store::{BackingStore, MemStore};
//! use raid5_stream::stream::Raid5Stream;
//! use std::io::SeekFrom;
//!
//! let disks: Vec<Box<dyn BackingStore>> = (0..3)
//!     .map(|_| Box::new(MemStore::new(1024)) as Box<dyn BackingStore>)
//!     .collect();
//! let mut stream = Raid5Stream::new(disks, 128)?;
//!
//! stream.write(b"hello")?;
//! stream.seek(SeekFrom::Start(0))?;
//! let mut back = [0u8; 5];
//! stream.read(&mut back)?;
//! assert_eq!(&back, b"hello");
//! # Ok::<(), raid5_stream::error::RaidError>(())
//! ```
#![allow(clippy::cargo_common_metadata)]

pub mod error;
pub mod events;
pub mod layout;
pub mod store;
pub mod stream;
pub mod xor;

pub use error::{RaidError, Result};
pub use stream::Raid5Stream;
