use foundation::time::Millis;

/// Render pass metadata.
///
/// The engine bumps the index once per render that actually draws. Events are
/// tagged with the index of the frame that produced them.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Host time stamp at which the frame was started.
    pub started: Millis,
}

impl Frame {
    pub fn new(index: u64, started: Millis) -> Self {
        Self { index, started }
    }

    pub fn next(self, started: Millis) -> Self {
        Self {
            index: self.index + 1,
            started,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Millis;

    #[test]
    fn next_advances_index_and_takes_new_stamp() {
        let f0 = Frame::new(0, Millis(10));
        let f1 = f0.next(Millis(26));
        assert_eq!(f1.index, 1);
        assert_eq!(f1.started, Millis(26));
    }

    #[test]
    fn default_frame_is_zero() {
        assert_eq!(Frame::default(), Frame::new(0, Millis::ZERO));
    }
}
