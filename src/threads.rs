use std::{
    sync::{atomic::Ordering, Arc},
    thread::{spawn, JoinHandle},
    time::{Duration, Instant},
};

use atomic_float::AtomicF32;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, trace};
use triple_buffer::{triple_buffer, Output};
use vm::TrackState;

use crate::sequencer::{Event, Sequencer};

/// Longest the loop waits before looking at the tick rate again
const RATE_POLL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub enum Message {
    /// Replace the running programs, one per channel
    Load(Vec<Vec<u8>>),
    Pause,
    Resume,
    Stop,
}

pub struct SequencerThread {
    sequencer: Sequencer,
    rate: Arc<AtomicF32>,
    rx: Receiver<Message>,
}

pub struct SequencerComms {
    /// Latest per-channel state, published after every tick
    pub state_out: Output<Vec<TrackState>>,
    pub events: Receiver<Event>,
    /// Ticks per second, read on every loop
    pub rate: Arc<AtomicF32>,
    pub handle: JoinHandle<()>,
}

impl SequencerThread {
    pub fn new(sequencer: Sequencer, msgs: Receiver<Message>) -> Self {
        let rate = Arc::new(AtomicF32::new(sequencer.config().ticks_per_second));
        Self {
            sequencer,
            rate,
            rx: msgs,
        }
    }

    /// Time between ticks, `None` while stopped by a zero or negative rate
    fn period(&self) -> Option<Duration> {
        let ticks_per_second = self.rate.load(Ordering::Relaxed);
        (ticks_per_second > 0.0)
            .then(|| Duration::try_from_secs_f32(ticks_per_second.recip()).ok())
            .flatten()
    }

    pub fn spawn(mut self) -> SequencerComms {
        let (mut state_in, state_out) = triple_buffer(&self.sequencer.snapshot());
        let events = self.sequencer.events();
        let rate = Arc::clone(&self.rate);
        let handle = spawn(move || {
            #[cfg(feature = "tracing")]
            tracy_client::set_thread_name!("sequencer tick loop");
            let mut paused = false;
            let mut last_tick: Option<Instant> = None;
            loop {
                let due = self
                    .period()
                    .filter(|_| !paused)
                    .map(|period| last_tick.map_or_else(Instant::now, |last| last + period));
                let timeout = due.map_or(RATE_POLL, |due| {
                    due.saturating_duration_since(Instant::now()).min(RATE_POLL)
                });

                // wakes early for control messages
                match self.rx.recv_timeout(timeout) {
                    Ok(Message::Load(programs)) => {
                        self.sequencer.load(programs);
                        state_in.write(self.sequencer.snapshot());
                    }
                    Ok(Message::Pause) => paused = true,
                    Ok(Message::Resume) => {
                        paused = false;
                        last_tick = None;
                    }
                    Ok(Message::Stop) | Err(RecvTimeoutError::Disconnected) => {
                        debug!(ticks = self.sequencer.ticks(), "sequencer thread stopping");
                        return;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if due.is_some_and(|due| Instant::now() >= due) {
                            trace!("sequencer tick");
                            self.sequencer.tick();
                            state_in.write(self.sequencer.snapshot());
                            last_tick = Some(Instant::now());
                        }
                    }
                }
            }
        });

        SequencerComms {
            state_out,
            events,
            rate,
            handle,
        }
    }
}
