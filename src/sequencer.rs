use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, instrument};
use vm::{Backend, Track, TrackConfig, TrackState};

/// What a channel asked the sound engine to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Play {
        channel: usize,
        note: u8,
        instrument: u8,
    },
    Syscall {
        channel: usize,
        code: u16,
    },
    /// Sent once per channel, on the tick it halts
    Halt { channel: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SequencerConfig {
    pub track: TrackConfig,
    /// Starting rate for [crate::threads::SequencerThread]
    pub ticks_per_second: f32,
    /// Events held for the host. Once full, new events are dropped until someone drains.
    pub event_capacity: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            track: TrackConfig::default(),
            ticks_per_second: 60.0,
            event_capacity: 1024,
        }
    }
}

#[derive(Clone, Debug)]
struct Channel {
    track: Track,
    halt_reported: bool,
}

/// Runs one [Track] per channel over a shared, read-only program.
///
/// Each channel's program is laid out after the previous one and its jumps are relative to its
/// own start, so every channel can be compiled on its own.
#[derive(derive_more::Debug)]
pub struct Sequencer {
    config: SequencerConfig,
    #[debug(ignore)]
    memory: Arc<[u8]>,
    channels: Vec<Channel>,
    #[debug(ignore)]
    tx: Sender<Event>,
    #[debug(ignore)]
    rx: Receiver<Event>,
    ticks: u64,
}

/// Forwards one channel's requests as [Event]s
struct ChannelBackend<'a> {
    channel: usize,
    halt_reported: &'a mut bool,
    tx: &'a Sender<Event>,
}

impl ChannelBackend<'_> {
    fn send(&self, event: Event) {
        if let Err(err) = self.tx.try_send(event) {
            debug!(event = ?err.into_inner(), "event queue full, dropping event");
        }
    }
}

impl Backend for ChannelBackend<'_> {
    fn halt(&mut self, _state: &TrackState) {
        if !*self.halt_reported {
            *self.halt_reported = true;
            self.send(Event::Halt {
                channel: self.channel,
            });
        }
    }

    fn syscall(&mut self, code: u16, _state: &TrackState) {
        self.send(Event::Syscall {
            channel: self.channel,
            code,
        });
    }

    fn play(&mut self, note: u8, state: &TrackState) {
        self.send(Event::Play {
            channel: self.channel,
            note,
            instrument: state.instrument,
        });
    }
}

impl Sequencer {
    /// One channel per program
    pub fn new(config: SequencerConfig, programs: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let (tx, rx) = bounded(config.event_capacity);
        let mut sequencer = Self {
            config,
            memory: Arc::from(Vec::new()),
            channels: vec![],
            tx,
            rx,
            ticks: 0,
        };
        sequencer.load(programs);
        sequencer
    }

    /// Channels over memory the host already laid out, one per start offset
    pub fn with_memory(config: SequencerConfig, memory: Arc<[u8]>, bases: &[usize]) -> Self {
        let (tx, rx) = bounded(config.event_capacity);
        let mut sequencer = Self {
            config,
            memory,
            channels: vec![],
            tx,
            rx,
            ticks: 0,
        };
        sequencer.bind(bases);
        sequencer
    }

    /// Swap in new programs. Pending events stay queued.
    #[instrument(skip(self, programs))]
    pub fn load(&mut self, programs: impl IntoIterator<Item = Vec<u8>>) {
        let mut memory = vec![];
        let mut bases = vec![];
        for program in programs {
            bases.push(memory.len());
            memory.extend(program);
        }
        debug!(channels = bases.len(), len = memory.len(), "loaded programs");
        self.memory = Arc::from(memory);
        self.bind(&bases);
    }

    fn bind(&mut self, bases: &[usize]) {
        self.channels = bases
            .iter()
            .map(|base| Channel {
                track: Track::with_config(*base, self.config.track),
                halt_reported: false,
            })
            .collect();
        self.ticks = 0;
    }

    /// Advance every channel by one tick
    #[instrument(level = "trace", skip(self), fields(tick = self.ticks))]
    pub fn tick(&mut self) {
        for (channel, Channel { track, halt_reported }) in self.channels.iter_mut().enumerate() {
            let mut backend = ChannelBackend {
                channel,
                halt_reported,
                tx: &self.tx,
            };
            track.update(&*self.memory, &mut backend);
        }
        self.ticks += 1;
    }

    /// Back to the start of every program
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.track.reset();
            channel.halt_reported = false;
        }
        self.ticks = 0;
    }

    pub fn snapshot(&self) -> Vec<TrackState> {
        self.channels
            .iter()
            .map(|channel| channel.track.state().clone())
            .collect()
    }

    /// True once every channel has halted
    pub fn is_finished(&self) -> bool {
        self.channels.iter().all(|channel| channel.track.is_halted())
    }

    /// Another handle on the event queue
    pub fn events(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    /// Everything queued so far
    pub fn drain_events(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    pub fn track(&self, channel: usize) -> Option<&Track> {
        self.channels.get(channel).map(|channel| &channel.track)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lang::{compile, Assembler};

    #[test]
    fn test_channels_report_their_own_events() {
        let lead = compile("instrument 2\nplay 60\nsyscall 9\nhalt").unwrap();
        let mut bass = Assembler::new();
        bass.ticks(1);
        let again = bass.here();
        bass.note(36).jump(again);

        let mut sequencer = Sequencer::new(SequencerConfig::default(), [lead, bass.into_bytecode()]);
        assert_eq!(sequencer.channels(), 2);
        assert_eq!(sequencer.track(1).map(Track::base), Some(8));

        for _ in 0..4 {
            sequencer.tick();
        }
        assert_eq!(
            sequencer.drain_events(),
            vec![
                Event::Play {
                    channel: 0,
                    note: 60,
                    instrument: 2
                },
                Event::Syscall {
                    channel: 0,
                    code: 9
                },
                Event::Halt { channel: 0 },
                Event::Play {
                    channel: 1,
                    note: 36,
                    instrument: 0
                },
            ]
        );
        assert!(!sequencer.is_finished());
        assert_eq!(sequencer.ticks(), 4);
    }

    #[test]
    fn test_undrained_events_are_capped() {
        let mut looping = Assembler::new();
        looping.note(1).jump(0);
        let config = SequencerConfig {
            event_capacity: 4,
            ..Default::default()
        };
        let mut sequencer = Sequencer::new(config, [looping.into_bytecode()]);
        drop(sequencer.events());
        for _ in 0..1000 {
            sequencer.tick();
        }
        assert_eq!(sequencer.events().len(), 4);

        assert_eq!(sequencer.drain_events().len(), 4);
        sequencer.tick();
        assert_eq!(
            sequencer.drain_events(),
            vec![Event::Play {
                channel: 0,
                note: 1,
                instrument: 0
            }]
        );
    }

    #[test]
    fn test_halt_is_reported_once() {
        let mut sequencer = Sequencer::new(SequencerConfig::default(), [vec![0xED]]);
        for _ in 0..5 {
            sequencer.tick();
        }
        assert_eq!(sequencer.drain_events(), vec![Event::Halt { channel: 0 }]);
        assert!(sequencer.is_finished());

        sequencer.reset();
        assert!(!sequencer.is_finished());
        sequencer.tick();
        assert_eq!(sequencer.drain_events(), vec![Event::Halt { channel: 0 }]);
    }

    #[test]
    fn test_shared_memory() {
        let mut memory = vec![0u8; 4];
        memory.extend(compile("play 1\nhalt").unwrap());
        let memory: Arc<[u8]> = Arc::from(memory);
        let mut sequencer =
            Sequencer::with_memory(SequencerConfig::default(), memory.clone(), &[4, 4]);
        sequencer.tick();
        let events = sequencer.events().try_iter().collect::<Vec<_>>();
        assert_eq!(events.len(), 2);
        assert_eq!(sequencer.snapshot()[1].note, 1);
        assert_eq!(sequencer.memory(), &*memory);
    }
}
