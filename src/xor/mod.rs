//! In-place XOR over byte buffers, vectorized where the host allows.


/// `xor_into` folds `src` into `acc` byte-wise: `acc[i] ^= src[i]`.
///
/// XOR is commutative and associative, so folding several sources into the
/// same accumulator yields the same result in any order. No allocation.
///
/// # Panics
/// Panics if the slices differ in length.
pub fn xor_into(acc: &mut [u8], src: &[u8]) {
    assert_eq!(acc.len(), src.len(), "xor operands must have equal length");

    #[cfg(target_arch = "x86_64")]
    if is_x86_feature_detected!("avx2") {
        unsafe { simd::xor_into_avx2(acc, src) };
        return;
    }

    xor_into_words(acc, src);
}

/// Portable path: whole `u64` lanes first, then the byte tail.
fn xor_into_words(acc: &mut [u8], src: &[u8]) {
    const LANE: usize = size_of::<u64>();
    let split = acc.len() - acc.len() % LANE;
    let (acc_lanes, acc_tail) = acc.split_at_mut(split);
    let (src_lanes, src_tail) = src.split_at(split);

    for (a, s) in acc_lanes
        .chunks_exact_mut(LANE)
        .zip(src_lanes.chunks_exact(LANE))
    {
        let mut lhs = [0u8; LANE];
        lhs.copy_from_slice(a);
        let mut rhs = [0u8; LANE];
        rhs.copy_from_slice(s);
        let folded = u64::from_ne_bytes(lhs) ^ u64::from_ne_bytes(rhs);
        a.copy_from_slice(&folded.to_ne_bytes());
    }

    for (a, s) in acc_tail.iter_mut().zip(src_tail) {
        *a ^= *s;
    }
}

#[cfg(target_arch = "x86_64")]
mod simd {
    use std::arch::x86_64::{_mm256_loadu_si256, _mm256_storeu_si256, _mm256_xor_si256};

    const WIDTH: usize = 32;

    /// 256-bit XOR over the bulk of the range, word/byte fallback for the
    /// remainder.
    ///
    /// # Safety
    /// The caller must have verified AVX2 support; slices must have equal
    /// length.
    #[target_feature(enable = "avx2")]
    pub unsafe fn xor_into_avx2(acc: &mut [u8], src: &[u8]) {
        let chunks = acc.len() / WIDTH;
        for i in 0..chunks {
            let off = i * WIDTH;
            // Unaligned loads/stores; unit buffers carry no alignment contract.
            unsafe {
                let a = _mm256_loadu_si256(acc.as_ptr().add(off).cast());
                let s = _mm256_loadu_si256(src.as_ptr().add(off).cast());
                _mm256_storeu_si256(acc.as_mut_ptr().add(off).cast(), _mm256_xor_si256(a, s));
            }
        }

        let done = chunks * WIDTH;
        super::xor_into_words(&mut acc[done..], &src[done..]);
    }
}
