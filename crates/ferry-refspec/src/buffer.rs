//! Growing-buffer driver for bounded transform primitives.

use tracing::trace;

use crate::error::{RefspecError, RefspecResult};

/// How many times [`grow`] retries before giving up.
pub const MAX_TRANSFORM_ATTEMPTS: u32 = 16;

/// Largest output [`grow`] will allocate for, in bytes.
pub const MAX_TRANSFORM_LEN: usize = 64 * 1024;

const MIN_CAPACITY: usize = 16;

/// Run `fill` against a buffer that starts at `initial` bytes and doubles
/// each time `fill` reports [`RefspecError::BufferTooSmall`].
///
/// `fill` must either write its full output and return the number of bytes
/// written, or write nothing and report the size it needs. Any other error is
/// returned unchanged. Fails with [`RefspecError::CapacityExceeded`] once the
/// buffer would have to exceed [`MAX_TRANSFORM_LEN`] or after
/// [`MAX_TRANSFORM_ATTEMPTS`] attempts.
pub fn grow<F>(initial: usize, mut fill: F) -> RefspecResult<String>
where
    F: FnMut(&mut [u8]) -> RefspecResult<usize>,
{
    let mut capacity = initial.clamp(MIN_CAPACITY, MAX_TRANSFORM_LEN);

    for attempt in 1..=MAX_TRANSFORM_ATTEMPTS {
        let mut buf = vec![0u8; capacity];
        match fill(&mut buf) {
            Ok(written) => {
                buf.truncate(written);
                return String::from_utf8(buf).map_err(|e| RefspecError::Encoding(e.to_string()));
            }
            Err(RefspecError::BufferTooSmall { required }) => {
                trace!(attempt, capacity, required, "transform buffer too small");
                if capacity >= MAX_TRANSFORM_LEN {
                    break;
                }
                capacity = capacity.saturating_mul(2).min(MAX_TRANSFORM_LEN);
            }
            Err(other) => return Err(other),
        }
    }

    Err(RefspecError::CapacityExceeded {
        limit: MAX_TRANSFORM_LEN,
        attempts: MAX_TRANSFORM_ATTEMPTS,
    })
}
