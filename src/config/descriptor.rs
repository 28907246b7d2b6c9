use bitflags::bitflags;

bitflags! {
    /// Named execution options consumed by the full multiply contract.
    ///
    /// Every option defaults to off. `TRANSPOSE_A`/`TRANSPOSE_B` are part
    /// of the declared surface but no kernel evaluates a transposed
    /// operand yet; requesting them fails rather than silently multiplying
    /// the operands as stored.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Descriptor: u32 {
        /// Evaluate the first operand transposed.
        const TRANSPOSE_A    = 0b0001;
        /// Evaluate the second operand transposed.
        const TRANSPOSE_B    = 0b0010;
        /// Treat the mask structurally: pattern membership gates writes,
        /// stored values are not consulted.
        const STRUCTURE_ONLY = 0b0100;
        /// Discard destination cells outside the mask instead of keeping
        /// them.
        const REPLACE        = 0b1000;
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Descriptor::empty()
    }
}
