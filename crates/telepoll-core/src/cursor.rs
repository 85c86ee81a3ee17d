use crate::messaging::types::Update;

/// Acknowledgment watermark: the next `update_id` the source should return.
///
/// Only moves forward. Passing the new offset to the next fetch acknowledges every update
/// of the previous batch, whether or not a handler picked it up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor(i64);

impl Cursor {
    pub fn new(offset: i64) -> Self {
        Self(offset)
    }

    pub fn offset(self) -> i64 {
        self.0
    }

    /// Move past the highest id in `batch`. Empty batches leave the cursor untouched.
    ///
    /// Returns whether the offset changed.
    pub fn advance(&mut self, batch: &[Update]) -> bool {
        let Some(max) = batch.iter().map(|u| u.update_id.0).max() else {
            return false;
        };
        let next = max.saturating_add(1);
        if next > self.0 {
            self.0 = next;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(ids: &[i64]) -> Vec<Update> {
        ids.iter().map(|&id| Update::other(id)).collect()
    }

    #[test]
    fn advances_one_past_highest_id() {
        let mut c = Cursor::default();
        assert!(c.advance(&batch(&[5, 6])));
        assert_eq!(c.offset(), 7);
        assert!(c.advance(&batch(&[7])));
        assert_eq!(c.offset(), 8);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut c = Cursor::new(12);
        assert!(!c.advance(&[]));
        assert_eq!(c.offset(), 12);
    }

    #[test]
    fn never_moves_backwards() {
        let mut c = Cursor::new(100);
        assert!(!c.advance(&batch(&[3, 4])));
        assert_eq!(c.offset(), 100);
    }

    #[test]
    fn uses_maximum_not_last_element() {
        let mut c = Cursor::default();
        c.advance(&batch(&[10, 14, 12]));
        assert_eq!(c.offset(), 15);
    }

    #[test]
    fn matches_running_maximum_over_many_batches() {
        let batches: [&[i64]; 5] = [&[1, 2], &[], &[3], &[], &[4, 5, 9]];
        let mut c = Cursor::default();
        let mut seen_max: Option<i64> = None;
        for b in batches {
            c.advance(&batch(b));
            if let Some(m) = b.iter().max() {
                seen_max = Some(seen_max.map_or(*m, |s| s.max(*m)));
            }
            assert_eq!(c.offset(), seen_max.map_or(0, |m| m + 1));
        }
    }
}
