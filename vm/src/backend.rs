use crate::state::TrackState;

/// Receives the requests a [crate::interpret::Track] raises.
///
/// Every method defaults to doing nothing, so a host only overrides what it
/// listens to.
pub trait Backend {
    /// Called on the tick a `HALT` runs and on every tick after it
    fn halt(&mut self, _state: &TrackState) {}
    fn syscall(&mut self, _code: u16, _state: &TrackState) {}
    fn play(&mut self, _note: u8, _state: &TrackState) {}
}

pub struct NoopBackend;

impl Backend for NoopBackend {}

/// Everything a track asked for, in order. Handy for hosts that poll.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recorder {
    pub requests: Vec<Request>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    Halt,
    Syscall(u16),
    Play { note: u8, instrument: u8 },
}

impl Recorder {
    pub fn plays(&self) -> impl Iterator<Item = u8> + '_ {
        self.requests.iter().filter_map(|request| match request {
            Request::Play { note, .. } => Some(*note),
            _ => None,
        })
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Request> {
        self.requests.drain(..)
    }
}

impl Backend for Recorder {
    fn halt(&mut self, _state: &TrackState) {
        self.requests.push(Request::Halt);
    }

    fn syscall(&mut self, code: u16, _state: &TrackState) {
        self.requests.push(Request::Syscall(code));
    }

    fn play(&mut self, note: u8, state: &TrackState) {
        self.requests.push(Request::Play {
            note,
            instrument: state.instrument,
        });
    }
}
