/// Outcome of an `execute` call: how many rows the statement touched.
///
/// Both drivers report counts as `u64`. They are widened into `i64` with saturation, so an
/// out-of-range count pins at `i64::MAX` instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandTag {
    rows_affected: i64,
}

impl CommandTag {
    #[must_use]
    pub fn new(rows_affected: i64) -> Self {
        Self { rows_affected }
    }

    #[must_use]
    pub fn rows_affected(&self) -> i64 {
        self.rows_affected
    }
}

impl From<u64> for CommandTag {
    fn from(count: u64) -> Self {
        Self::new(i64::try_from(count).unwrap_or(i64::MAX))
    }
}
