//! Sound cues for simulation events
//!
//! Procedurally generated beeps - no external files needed. The simulation
//! only emits [`GameEvent`]s; an [`AudioSink`] decides what to do with them.

use crate::sim::GameEvent;

/// Sample rate used by [`SoundEffect::render`]
pub const SAMPLE_RATE: u32 = 22_050;
/// Peak amplitude as a fraction of full scale
pub const DEFAULT_VOLUME: f32 = 0.12;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Coin picked up, van stolen, purchase made
    Coin,
    /// Caught or crashed
    Crash,
    /// Runner phase starting
    Engine,
}

impl SoundEffect {
    /// Cue played for a simulation event
    pub fn for_event(event: GameEvent) -> Self {
        match event {
            GameEvent::Coin | GameEvent::Theft | GameEvent::Purchase => SoundEffect::Coin,
            GameEvent::Capture | GameEvent::Crash => SoundEffect::Crash,
            GameEvent::Engine => SoundEffect::Engine,
        }
    }

    /// Sine frequency (Hz)
    pub fn frequency(&self) -> f32 {
        match self {
            SoundEffect::Coin => 1200.0,
            SoundEffect::Crash => 120.0,
            SoundEffect::Engine => 160.0,
        }
    }

    pub fn duration_ms(&self) -> u32 {
        match self {
            SoundEffect::Coin => 90,
            SoundEffect::Crash => 350,
            SoundEffect::Engine => 300,
        }
    }

    /// Mono 16-bit PCM for this cue
    pub fn render(&self, sample_rate: u32, volume: f32) -> Vec<i16> {
        let n = (sample_rate as u64 * self.duration_ms() as u64 / 1000) as usize;
        let amp = i16::MAX as f32 * volume.clamp(0.0, 1.0);
        let step = std::f32::consts::TAU * self.frequency() / sample_rate as f32;
        (0..n).map(|i| (amp * (step * i as f32).sin()) as i16).collect()
    }
}

/// Where sound cues go
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    /// Play the cue for every event, in order
    fn play_events(&mut self, events: &[GameEvent]) {
        for &event in events {
            self.play(SoundEffect::for_event(event));
        }
    }
}

/// Sink that only logs what it would play
#[derive(Debug, Default)]
pub struct LogAudio {
    muted: bool,
    /// Cues played so far
    pub played: Vec<SoundEffect>,
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        if self.muted {
            return;
        }
        log::debug!(
            "Sound {:?}: {} Hz for {} ms",
            effect,
            effect.frequency(),
            effect.duration_ms()
        );
        self.played.push(effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_map_to_cues() {
        let mut sink = LogAudio::new();
        sink.play_events(&[GameEvent::Theft, GameEvent::Engine, GameEvent::Coin, GameEvent::Crash]);
        assert_eq!(
            sink.played,
            vec![SoundEffect::Coin, SoundEffect::Engine, SoundEffect::Coin, SoundEffect::Crash]
        );
    }

    #[test]
    fn test_muted_plays_nothing() {
        let mut sink = LogAudio::new();
        sink.set_muted(true);
        sink.play_events(&[GameEvent::Capture]);
        assert!(sink.played.is_empty());
    }

    #[test]
    fn test_render_length_and_peak() {
        let samples = SoundEffect::Coin.render(SAMPLE_RATE, DEFAULT_VOLUME);
        assert_eq!(samples.len(), 1984);
        assert_eq!(samples[0], 0);
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak <= (i16::MAX as f32 * DEFAULT_VOLUME) as u16);
        assert!(peak > 3000);
    }
}
