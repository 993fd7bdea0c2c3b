//! Two-slot elastic pipeline register.
//!
//! Models the RTL's two-deep stage register with independent valid bits. A
//! stage accepts a new input every cycle unless both slots are occupied and
//! the downstream consumer is not ready; the payload is transformed by the
//! stage's combinational work as it advances from slot 1 to slot 2. The
//! input and output payload types differ so each stage carries an explicit
//! typed intermediate rather than aliasing fields of the input token.

/// A two-stage elastic buffer with valid/ready handshaking.
///
/// `S` is the slot-1 payload (the registered intermediate), `T` the slot-2
/// payload (the stage result presented downstream).
#[derive(Clone, Debug)]
pub struct PipeStage<S, T> {
    slot1: Option<S>,
    slot2: Option<T>,
}

impl<S, T> Default for PipeStage<S, T> {
    fn default() -> Self {
        Self {
            slot1: None,
            slot2: None,
        }
    }
}

impl<S, T> PipeStage<S, T> {
    /// An empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the stage can accept an input on the next tick.
    ///
    /// `out_ready` is the downstream consumer's ready signal; backpressure
    /// composes through it.
    pub fn in_ready(&self, out_ready: bool) -> bool {
        !(self.slot1.is_some() && self.slot2.is_some() && !out_ready)
    }

    /// Whether slot 2 presents a valid output.
    pub fn out_valid(&self) -> bool {
        self.slot2.is_some()
    }

    /// The output value while slot 2 is valid.
    pub fn output(&self) -> Option<&T> {
        self.slot2.as_ref()
    }

    /// Clears both slots.
    pub fn reset(&mut self) {
        self.slot1 = None;
        self.slot2 = None;
    }

    /// Advances the register by one clock cycle.
    ///
    /// `advance` performs the stage's combinational work as the payload moves
    /// from slot 1 into slot 2. Returns whether `input` was accepted.
    pub fn tick(
        &mut self,
        input: Option<S>,
        out_ready: bool,
        advance: impl FnOnce(&S) -> T,
    ) -> bool {
        let full = self.slot1.is_some() && self.slot2.is_some();
        let stalled = !out_ready && full;
        let hold_out = !out_ready && self.slot2.is_some();

        if !hold_out {
            self.slot2 = self.slot1.as_ref().map(advance);
        }
        let accepted = input.is_some() && !stalled;
        if !stalled {
            self.slot1 = input;
        }
        accepted
    }
}
