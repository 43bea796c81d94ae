//! Procedural sound: cue recipes, music sequencing and the channel mixer.
//!
//! Nothing here touches an audio device. Cues and notes are described as
//! oscillator voices with parameter automation, and can be rendered to mono
//! PCM. The mixer turns lifecycle changes into [`AudioCommand`]s for the host.
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::numbers::{f32_to_usize, usize_to_f32};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample at `phase` in `[0, 1)`.
    #[must_use]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Self::Sine => (phase * TAU).sin(),
            Self::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Sawtooth => 2.0 * phase - 1.0,
            Self::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ramp {
    /// Jump to the value at the event time.
    Set,
    /// Linear ramp from the previous event, ending at the event time.
    Linear,
    /// Exponential ramp from the previous event, ending at the event time.
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamEvent {
    pub time: f32,
    pub value: f32,
    pub ramp: Ramp,
}

/// A scheduled parameter curve. Events must be added in time order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Automation {
    pub initial: f32,
    pub events: Vec<ParamEvent>,
}

impl Automation {
    #[must_use]
    pub const fn starting_at(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(self, time: f32, value: f32) -> Self {
        self.push(time, value, Ramp::Set)
    }

    #[must_use]
    pub fn linear(self, time: f32, value: f32) -> Self {
        self.push(time, value, Ramp::Linear)
    }

    #[must_use]
    pub fn exponential(self, time: f32, value: f32) -> Self {
        self.push(time, value, Ramp::Exponential)
    }

    fn push(mut self, time: f32, value: f32, ramp: Ramp) -> Self {
        self.events.push(ParamEvent { time, value, ramp });
        self
    }

    /// Value at `time` seconds after the voice was scheduled.
    #[must_use]
    pub fn value_at(&self, time: f32) -> f32 {
        let mut prev_time = 0.0;
        let mut prev_value = self.initial;
        for event in &self.events {
            if time < event.time {
                let span = event.time - prev_time;
                if span <= 0.0 {
                    return prev_value;
                }
                let fraction = ((time - prev_time) / span).clamp(0.0, 1.0);
                return match event.ramp {
                    Ramp::Set => prev_value,
                    Ramp::Linear => prev_value + (event.value - prev_value) * fraction,
                    Ramp::Exponential => {
                        // Undefined through zero or a sign change; hold instead.
                        if prev_value == 0.0 || prev_value.signum() != event.value.signum() {
                            prev_value
                        } else {
                            prev_value * (event.value / prev_value).powf(fraction)
                        }
                    }
                };
            }
            prev_time = event.time;
            prev_value = event.value;
        }
        prev_value
    }
}

/// One oscillator with frequency and gain automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub waveform: Waveform,
    pub start: f32,
    pub stop: f32,
    pub frequency: Automation,
    pub gain: Automation,
}

impl Voice {
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.stop - self.start
    }
}

fn sweep(
    waveform: Waveform,
    (from_hz, to_hz): (f32, f32),
    ramp: Ramp,
    gain: f32,
    seconds: f32,
) -> Voice {
    let frequency = Automation::starting_at(from_hz).set(0.0, from_hz);
    let frequency = match ramp {
        Ramp::Set => frequency,
        Ramp::Linear => frequency.linear(seconds, to_hz),
        Ramp::Exponential => frequency.exponential(seconds, to_hz),
    };
    Voice {
        waveform,
        start: 0.0,
        stop: seconds,
        frequency,
        gain: Automation::starting_at(gain)
            .set(0.0, gain)
            .linear(seconds, 0.0),
    }
}

fn chime(waveform: Waveform, hz: f32, offset: f32, gain: f32, seconds: f32) -> Voice {
    Voice {
        waveform,
        start: offset,
        stop: offset + seconds,
        frequency: Automation::starting_at(hz).set(offset, hz),
        gain: Automation::starting_at(0.0)
            .set(offset, gain)
            .linear(offset + seconds, 0.0),
    }
}

const VICTORY_NOTES: [f32; 5] = [523.0, 659.0, 783.0, 1_046.0, 1_318.0];
const WIN_NOTES: [f32; 4] = [659.0, 880.0, 1_046.0, 1_318.0];
const SPIN_TICKS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Type,
    Select,
    Confirm,
    Trade,
    Collision,
    Hurt,
    GameOver,
    Onboard,
    Victory,
    Spin,
    Win,
    Coin,
    Shoot,
}

impl SoundCue {
    pub const ALL: [Self; 13] = [
        Self::Type,
        Self::Select,
        Self::Confirm,
        Self::Trade,
        Self::Collision,
        Self::Hurt,
        Self::GameOver,
        Self::Onboard,
        Self::Victory,
        Self::Spin,
        Self::Win,
        Self::Coin,
        Self::Shoot,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Select => "select",
            Self::Confirm => "confirm",
            Self::Trade => "trade",
            Self::Collision => "collision",
            Self::Hurt => "hurt",
            Self::GameOver => "game_over",
            Self::Onboard => "onboard",
            Self::Victory => "victory",
            Self::Spin => "spin",
            Self::Win => "win",
            Self::Coin => "coin",
            Self::Shoot => "shoot",
        }
    }

    /// The oscillator recipe for this cue.
    #[must_use]
    pub fn voices(self) -> Vec<Voice> {
        use Waveform::{Sawtooth, Sine, Square, Triangle};
        match self {
            Self::Type => vec![sweep(Sine, (150.0, 150.0), Ramp::Set, 0.02, 0.05)],
            Self::Select => vec![sweep(Square, (440.0, 880.0), Ramp::Exponential, 0.05, 0.1)],
            Self::Confirm => vec![sweep(Triangle, (523.0, 1_046.0), Ramp::Exponential, 0.1, 0.2)],
            Self::Trade => vec![Voice {
                waveform: Sawtooth,
                start: 0.0,
                stop: 0.2,
                frequency: Automation::starting_at(440.0)
                    .set(0.0, 440.0)
                    .set(0.05, 554.0)
                    .set(0.1, 659.0),
                gain: Automation::starting_at(0.05)
                    .set(0.0, 0.05)
                    .linear(0.2, 0.0),
            }],
            Self::Collision => vec![sweep(Square, (100.0, 40.0), Ramp::Linear, 0.1, 0.3)],
            Self::Hurt => vec![sweep(Sawtooth, (80.0, 20.0), Ramp::Linear, 0.2, 0.5)],
            Self::GameOver => vec![sweep(Sawtooth, (120.0, 30.0), Ramp::Linear, 0.3, 1.5)],
            Self::Onboard => vec![sweep(Triangle, (440.0, 880.0), Ramp::Exponential, 0.2, 0.3)],
            Self::Victory => VICTORY_NOTES
                .iter()
                .enumerate()
                .map(|(i, &hz)| chime(Sine, hz, usize_to_f32(i) * 0.1, 0.1, 0.6))
                .collect(),
            Self::Spin => (0..SPIN_TICKS)
                .map(|i| {
                    let hz = if i % 2 == 0 { 660.0 } else { 550.0 };
                    chime(Triangle, hz, usize_to_f32(i) * 0.07, 0.05, 0.05)
                })
                .collect(),
            Self::Win => WIN_NOTES
                .iter()
                .enumerate()
                .map(|(i, &hz)| chime(Triangle, hz, usize_to_f32(i) * 0.08, 0.08, 0.3))
                .collect(),
            Self::Coin => vec![Voice {
                waveform: Square,
                start: 0.0,
                stop: 0.25,
                frequency: Automation::starting_at(988.0)
                    .set(0.0, 988.0)
                    .set(0.06, 1_319.0),
                gain: Automation::starting_at(0.08)
                    .set(0.0, 0.08)
                    .linear(0.25, 0.0),
            }],
            Self::Shoot => vec![sweep(Square, (880.0, 220.0), Ramp::Exponential, 0.06, 0.1)],
        }
    }

    /// Seconds until the last voice stops.
    #[must_use]
    pub fn duration(self) -> f32 {
        self.voices()
            .iter()
            .map(|voice| voice.stop)
            .fold(0.0, f32::max)
    }
}

/// Mix `voices` into mono PCM.
#[must_use]
pub fn render_voices(voices: &[Voice], sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate_f32(sample_rate);
    let end = voices.iter().map(|voice| voice.stop).fold(0.0, f32::max);
    let mut out = vec![0.0; f32_to_usize((end * rate).ceil())];
    for voice in voices {
        let first = f32_to_usize((voice.start * rate).floor());
        let last = f32_to_usize((voice.stop * rate).ceil()).min(out.len());
        let mut phase = 0.0_f32;
        for (index, sample) in out.iter_mut().enumerate().take(last).skip(first) {
            let t = usize_to_f32(index) / rate;
            *sample += voice.waveform.sample(phase) * voice.gain.value_at(t);
            phase = (phase + voice.frequency.value_at(t) / rate).fract();
        }
    }
    out
}

#[must_use]
pub fn render_cue(cue: SoundCue, sample_rate: u32) -> Vec<f32> {
    render_voices(&cue.voices(), sample_rate)
}

fn sample_rate_f32(sample_rate: u32) -> f32 {
    num_traits::cast(sample_rate).unwrap_or(0.0)
}

// Music

pub const INTRO_NOTES: [f32; 4] = [220.0, 261.63, 293.66, 329.63];
pub const INTRO_INTERVAL_MS: f32 = 3_000.0;
pub const BGM_NOTES: [f32; 5] = [146.83, 164.81, 196.0, 220.0, 246.94];
pub const BGM_INTERVAL_MS: f32 = 600.0;
/// Every eighth background note drops an octave.
const BGM_BAR: u64 = 8;
/// A long stall never floods the host with a backlog of notes.
const MAX_NOTES_PER_TICK: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicTrack {
    Intro,
    Bgm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MusicNote {
    pub track: MusicTrack,
    pub frequency: f32,
    /// Position of the note in its track since the track started.
    pub step: u64,
}

impl MusicNote {
    #[must_use]
    pub fn voice(&self) -> Voice {
        let (peak, attack, release, stop) = match self.track {
            MusicTrack::Intro => (0.05, 0.5, 2.5, 3.0),
            MusicTrack::Bgm => (0.1, 0.1, 0.8, 1.0),
        };
        Voice {
            waveform: Waveform::Sine,
            start: 0.0,
            stop,
            frequency: Automation::starting_at(self.frequency),
            gain: Automation::starting_at(0.0)
                .set(0.0, 0.0)
                .linear(attack, peak)
                .exponential(release, 0.001),
        }
    }
}

#[must_use]
pub fn render_note(note: &MusicNote, sample_rate: u32) -> Vec<f32> {
    render_voices(&[note.voice()], sample_rate)
}

/// Four slow notes on loop under the title screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntroSequencer {
    step: u64,
    timer_ms: f32,
    started: bool,
}

impl IntroSequencer {
    pub fn tick(&mut self, elapsed_ms: f32) -> Vec<MusicNote> {
        let mut notes = Vec::new();
        if !self.started {
            self.started = true;
            notes.push(self.next_note());
        }
        self.timer_ms += elapsed_ms.max(0.0);
        while self.timer_ms >= INTRO_INTERVAL_MS && notes.len() < MAX_NOTES_PER_TICK {
            self.timer_ms -= INTRO_INTERVAL_MS;
            notes.push(self.next_note());
        }
        self.timer_ms = self.timer_ms.min(INTRO_INTERVAL_MS);
        notes
    }

    fn next_note(&mut self) -> MusicNote {
        let index = usize::try_from(self.step % 4).unwrap_or(0);
        let note = MusicNote {
            track: MusicTrack::Intro,
            frequency: INTRO_NOTES[index] * 0.5,
            step: self.step,
        };
        self.step += 1;
        note
    }
}

/// Random walk over a pentatonic set while the road is live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BgmSequencer {
    step: u64,
    timer_ms: f32,
    started: bool,
}

impl BgmSequencer {
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        elapsed_ms: f32,
        rng: &mut R,
        theme: Theme,
    ) -> Vec<MusicNote> {
        let mut notes = Vec::new();
        if !self.started {
            self.started = true;
            notes.push(self.next_note(rng, theme));
        }
        self.timer_ms += elapsed_ms.max(0.0);
        while self.timer_ms >= BGM_INTERVAL_MS && notes.len() < MAX_NOTES_PER_TICK {
            self.timer_ms -= BGM_INTERVAL_MS;
            notes.push(self.next_note(rng, theme));
        }
        self.timer_ms = self.timer_ms.min(BGM_INTERVAL_MS);
        notes
    }

    fn next_note<R: Rng + ?Sized>(&mut self, rng: &mut R, theme: Theme) -> MusicNote {
        let base = BGM_NOTES[rng.gen_range(0..BGM_NOTES.len())];
        let octave = if self.step % BGM_BAR == 0 { 0.5 } else { 1.0 };
        let note = MusicNote {
            track: MusicTrack::Bgm,
            frequency: theme.transpose(base * octave),
            step: self.step,
        };
        self.step += 1;
        note
    }
}

// Ambient wind

pub const WIND_CUTOFF_HZ: f32 = 300.0;
pub const WIND_LOOP_SECONDS: f32 = 2.0;

/// Second-order low-pass (RBJ cookbook), direct form I.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPass {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl LowPass {
    #[must_use]
    pub fn new(cutoff_hz: f32, sample_rate: u32, q: f32) -> Self {
        let omega = TAU * cutoff_hz / sample_rate_f32(sample_rate);
        let alpha = omega.sin() / (2.0 * q);
        let cos = omega.cos();
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 - cos) / 2.0 / a0,
            b1: (1.0 - cos) / a0,
            b2: (1.0 - cos) / 2.0 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// A loopable buffer of low-passed white noise.
#[must_use]
pub fn render_wind<R: Rng + ?Sized>(rng: &mut R, sample_rate: u32) -> Vec<f32> {
    let len = f32_to_usize((WIND_LOOP_SECONDS * sample_rate_f32(sample_rate)).ceil());
    let mut filter = LowPass::new(WIND_CUTOFF_HZ, sample_rate, std::f32::consts::FRAC_1_SQRT_2);
    (0..len)
        .map(|_| filter.process(rng.gen_range(-1.0_f32..1.0)))
        .collect()
}

// Mixer

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioChannel {
    Intro,
    Bgm,
    Ambient,
}

pub const FADE_OUT_SECONDS: f32 = 1.0;
pub const VOLUME_TIME_CONSTANT: f32 = 0.1;

impl AudioChannel {
    pub const ALL: [Self; 3] = [Self::Intro, Self::Bgm, Self::Ambient];

    /// Gain at full user volume.
    #[must_use]
    pub const fn base_gain(self) -> f32 {
        match self {
            Self::Intro => 0.03,
            Self::Bgm => 0.015,
            Self::Ambient => 0.04,
        }
    }

    #[must_use]
    pub const fn fade_in_seconds(self) -> f32 {
        match self {
            Self::Intro | Self::Ambient => 2.0,
            Self::Bgm => 3.0,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Intro => 0,
            Self::Bgm => 1,
            Self::Ambient => 2,
        }
    }
}

/// Instructions for the host's audio backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum AudioCommand {
    /// Render with [`render_cue`] and play once.
    PlayCue(SoundCue),
    /// Render with [`render_note`] and play on the track's channel.
    PlayNote(MusicNote),
    /// Fade a channel in from silence. The ambient channel loops [`render_wind`].
    StartChannel {
        channel: AudioChannel,
        gain: f32,
        fade_seconds: f32,
    },
    /// Fade a channel out and release it.
    StopChannel {
        channel: AudioChannel,
        fade_seconds: f32,
    },
    /// Approach `gain` exponentially with the given time constant.
    SetGain {
        channel: AudioChannel,
        gain: f32,
        time_constant: f32,
    },
}

/// Tracks which channels are live and what they should be playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMixer {
    music_volume: f32,
    ambient_volume: f32,
    active: [bool; 3],
    intro: IntroSequencer,
    bgm: BgmSequencer,
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

impl AudioMixer {
    #[must_use]
    pub fn new(music_volume: f32, ambient_volume: f32) -> Self {
        Self {
            music_volume: unit(music_volume),
            ambient_volume: unit(ambient_volume),
            active: [false; 3],
            intro: IntroSequencer::default(),
            bgm: BgmSequencer::default(),
        }
    }

    #[must_use]
    pub const fn music_volume(&self) -> f32 {
        self.music_volume
    }

    #[must_use]
    pub const fn ambient_volume(&self) -> f32 {
        self.ambient_volume
    }

    #[must_use]
    pub const fn is_active(&self, channel: AudioChannel) -> bool {
        self.active[channel.index()]
    }

    #[must_use]
    pub fn any_active(&self) -> bool {
        self.active.iter().any(|live| *live)
    }

    /// Target gain for a channel at the current user volumes.
    #[must_use]
    pub const fn channel_gain(&self, channel: AudioChannel) -> f32 {
        let volume = match channel {
            AudioChannel::Intro | AudioChannel::Bgm => self.music_volume,
            AudioChannel::Ambient => self.ambient_volume,
        };
        channel.base_gain() * volume
    }

    fn start(&mut self, channel: AudioChannel) -> Option<AudioCommand> {
        if self.is_active(channel) {
            return None;
        }
        self.active[channel.index()] = true;
        match channel {
            AudioChannel::Intro => self.intro = IntroSequencer::default(),
            AudioChannel::Bgm => self.bgm = BgmSequencer::default(),
            AudioChannel::Ambient => {}
        }
        Some(AudioCommand::StartChannel {
            channel,
            gain: self.channel_gain(channel),
            fade_seconds: channel.fade_in_seconds(),
        })
    }

    pub fn start_intro(&mut self) -> Vec<AudioCommand> {
        self.start(AudioChannel::Intro).into_iter().collect()
    }

    /// Swap the title music for the road soundscape.
    pub fn start_run(&mut self) -> Vec<AudioCommand> {
        let mut commands = self.stop_all();
        commands.extend(self.start(AudioChannel::Ambient));
        commands.extend(self.start(AudioChannel::Bgm));
        commands
    }

    pub fn stop_all(&mut self) -> Vec<AudioCommand> {
        let mut commands = Vec::new();
        for channel in AudioChannel::ALL {
            if self.is_active(channel) {
                self.active[channel.index()] = false;
                commands.push(AudioCommand::StopChannel {
                    channel,
                    fade_seconds: FADE_OUT_SECONDS,
                });
            }
        }
        commands
    }

    /// Change user volumes, retargeting every live channel.
    pub fn set_volumes(&mut self, music: f32, ambient: f32) -> Vec<AudioCommand> {
        self.music_volume = unit(music);
        self.ambient_volume = unit(ambient);
        AudioChannel::ALL
            .into_iter()
            .filter(|channel| self.is_active(*channel))
            .map(|channel| AudioCommand::SetGain {
                channel,
                gain: self.channel_gain(channel),
                time_constant: VOLUME_TIME_CONSTANT,
            })
            .collect()
    }

    /// Advance the sequencers of live music channels.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        elapsed_ms: f32,
        rng: &mut R,
        theme: Theme,
    ) -> Vec<AudioCommand> {
        let mut commands = Vec::new();
        if self.is_active(AudioChannel::Intro) {
            commands.extend(self.intro.tick(elapsed_ms).into_iter().map(AudioCommand::PlayNote));
        }
        if self.is_active(AudioChannel::Bgm) {
            commands.extend(
                self.bgm
                    .tick(elapsed_ms, rng, theme)
                    .into_iter()
                    .map(AudioCommand::PlayNote),
            );
        }
        if !commands.is_empty() {
            debug!("mixer queued {} notes", commands.len());
        }
        commands
    }
}

fn unit(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
