use bitflags::bitflags;

bitflags! {
    /// Checkout flags (spec §4.D).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CheckoutFlags: u8 {
        const WRITABLE  = 0b00001;
        /// Create the index if it doesn't exist yet.
        const SPAWN     = 0b00010;
        /// Skip the write-ahead log.
        const PERSISTENT = 0b00100;
        const NO_WAL    = 0b01000;
        const VOLATILE  = 0b10000;
    }
}

impl CheckoutFlags {
    pub fn is_writable(self) -> bool {
        self.contains(CheckoutFlags::WRITABLE)
    }
}
