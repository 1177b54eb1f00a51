use super::LedgerError;

/// Seat counts for the tracked train.
/// `sold` never exceeds `total`, and `total` is fixed at construction.
#[derive(Debug)]
pub struct Ledger {
    total: u32,
    sold: u32,
}

impl Ledger {
    pub fn new(total: u32) -> Self {
        Self { total, sold: 0 }
    }

    /// Return `(total, sold)`.
    pub fn availability(&self) -> (u32, u32) {
        (self.total, self.sold)
    }

    /// Take one seat if any is left.
    pub fn try_allocate(&mut self) -> bool {
        if self.sold < self.total {
            self.sold += 1;
            true
        } else {
            false
        }
    }

    /// Give one sold seat back.
    pub fn release(&mut self) -> Result<(), LedgerError> {
        if self.sold == 0 {
            return Err(LedgerError::NothingSold);
        }
        self.sold -= 1;
        Ok(())
    }
}
