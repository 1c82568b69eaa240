/// Monotonic time stamp in milliseconds, supplied by the host with each input
/// event. The engine never reads a clock itself, which keeps gesture timing
/// deterministic under test.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    /// Milliseconds elapsed since `earlier`, zero if the clock went backwards.
    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Millis;

    #[test]
    fn since_saturates() {
        assert_eq!(Millis(700).since(Millis(200)), 500);
        assert_eq!(Millis(100).since(Millis(200)), 0);
    }
}
