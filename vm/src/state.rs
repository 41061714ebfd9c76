use bitfield_struct::bitfield;

/// One-shot requests raised while decoding, packed like a status register.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Requests {
    /// Sticky: the track never runs again once this is set
    pub halt: bool,
    pub syscall: bool,
    pub play: bool,
    #[bits(5)]
    __: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackState {
    /// Offset of the next instruction, relative to the start of the program
    ///
    /// Wraps at 16 bits. Can be modified by an [crate::op::Op::Jump]
    pub cursor: u16,
    /// Idle ticks left before the next cycle
    pub counter: u16,
    pub register: u8,
    /// Result of the last comparison, drives the conditional jumps
    pub accumulator: bool,
    pub instrument: u8,
    pub note: u8,
    pub syscode: u16,
    /// Idle ticks inserted after each cycle, reloaded into [TrackState::counter]
    pub ticks_rate: u16,
    /// Whole cycles left to skip
    pub wait: u16,
    pub requests: Requests,
}

impl TrackState {
    pub fn sent_halt(&self) -> bool {
        self.requests.halt()
    }

    pub fn sent_syscall(&self) -> bool {
        self.requests.syscall()
    }

    pub fn sent_play(&self) -> bool {
        self.requests.play()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_pack_into_low_bits() {
        let requests = Requests::new().with_halt(true).with_play(true);
        assert_eq!(u8::from(requests), 0b101);
        assert!(!requests.syscall());
    }

    #[test]
    fn test_default_state_is_zeroed() {
        let state = TrackState::default();
        assert_eq!(state.cursor, 0);
        assert!(!state.accumulator);
        assert!(!state.sent_halt() && !state.sent_syscall() && !state.sent_play());
    }
}
