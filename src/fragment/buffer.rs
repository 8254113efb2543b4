//! Fixed-capacity byte storage for a single story assembly.
//!
//! A [`FragmentBuffer`] is sized once, from the total payload length declared
//! by the first fragment, and then filled in place. Writes that would run past
//! the declared size are rejected before any byte is copied.

use super::FragmentError;

/// Pre-sized buffer that accumulates fragment payloads.
///
/// # Examples
///
/// ```
/// use storyframe::fragment::FragmentBuffer;
///
/// let mut buffer = FragmentBuffer::new(10);
/// assert_eq!(buffer.append(0, b"hello").expect("fits"), 5);
/// assert!(!buffer.is_complete());
/// assert_eq!(buffer.append(5, b"world").expect("fits"), 10);
/// assert!(buffer.is_complete());
/// assert_eq!(buffer.as_slice(), b"helloworld");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentBuffer {
    bytes: Vec<u8>,
    filled: usize,
}

impl FragmentBuffer {
    /// Allocate zeroed storage of exactly `total_size` bytes.
    #[must_use]
    pub fn new(total_size: usize) -> Self {
        Self {
            bytes: vec![0; total_size],
            filled: 0,
        }
    }

    /// Copy `data` into the buffer starting at `offset`.
    ///
    /// Returns the new filled length, which is the furthest byte written so
    /// far. Callers appending in order pass the current
    /// [`filled_size`](Self::filled_size) as `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::Oversize`] when `offset + data.len()` exceeds
    /// the declared total size. The buffer is left untouched in that case.
    pub fn append(&mut self, offset: usize, data: &[u8]) -> Result<usize, FragmentError> {
        let total = self.total_size();
        let Some(end) = offset.checked_add(data.len()) else {
            return Err(FragmentError::Oversize {
                attempted: usize::MAX,
                total,
            });
        };
        let Some(target) = self.bytes.get_mut(offset..end) else {
            return Err(FragmentError::Oversize {
                attempted: end,
                total,
            });
        };
        target.copy_from_slice(data);
        self.filled = self.filled.max(end);
        Ok(self.filled)
    }

    /// Whether every declared byte has been written.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.filled == self.bytes.len() }

    /// Declared total payload length.
    #[must_use]
    pub fn total_size(&self) -> usize { self.bytes.len() }

    /// Number of bytes written so far.
    #[must_use]
    pub const fn filled_size(&self) -> usize { self.filled }

    /// Borrow the filled prefix of the buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] { &self.bytes[..self.filled] }

    /// Consume the buffer, returning the filled bytes.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.bytes.truncate(self.filled);
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::FragmentBuffer;
    use crate::fragment::FragmentError;

    #[test]
    fn new_buffer_is_zeroed_and_empty() {
        let buffer = FragmentBuffer::new(4);
        assert_eq!(buffer.total_size(), 4);
        assert_eq!(buffer.filled_size(), 0);
        assert!(buffer.as_slice().is_empty());
        assert!(!buffer.is_complete());
    }

    #[test]
    fn zero_sized_buffer_is_complete() {
        assert!(FragmentBuffer::new(0).is_complete());
    }

    #[test]
    fn appends_in_order_until_complete() {
        let mut buffer = FragmentBuffer::new(6);
        assert_eq!(buffer.append(0, &[1, 2]).expect("fits"), 2);
        assert_eq!(buffer.append(2, &[3, 4]).expect("fits"), 4);
        assert_eq!(buffer.append(4, &[5, 6]).expect("fits"), 6);
        assert!(buffer.is_complete());
        assert_eq!(buffer.into_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[rstest]
    #[case::past_end(2, 3, 5)]
    #[case::entirely_past_end(4, 1, 5)]
    #[case::single_oversized_write(0, 5, 5)]
    fn rejects_writes_past_total_without_mutation(
        #[case] offset: usize,
        #[case] len: usize,
        #[case] attempted: usize,
    ) {
        let mut buffer = FragmentBuffer::new(4);
        buffer.append(0, &[9, 9]).expect("prefix fits");
        let before = buffer.clone();

        let err = buffer
            .append(offset, &vec![7; len])
            .expect_err("write past the declared size must fail");

        assert_eq!(err, FragmentError::Oversize { attempted, total: 4 });
        assert_eq!(buffer, before);
    }

    #[test]
    fn rejects_offset_overflow() {
        let mut buffer = FragmentBuffer::new(4);
        let err = buffer
            .append(usize::MAX, &[1])
            .expect_err("overflowing offset must fail");
        assert_eq!(
            err,
            FragmentError::Oversize {
                attempted: usize::MAX,
                total: 4
            }
        );
    }

    #[test]
    fn empty_append_keeps_filled_size() {
        let mut buffer = FragmentBuffer::new(3);
        buffer.append(0, &[1]).expect("fits");
        assert_eq!(buffer.append(1, &[]).expect("empty fits"), 1);
    }
}
