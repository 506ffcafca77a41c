// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Loads presets onto the pad grid and plays pads.
//!
//! A load clears the grid, decodes every sample of the preset through the decode pool,
//! lays the decoded samples out in arrival order starting at logical pad 0 and builds the
//! trigger table. Triggering a pad shows its waveform, works out the trim window and
//! plays it, stopping whatever was playing before.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info, span, warn, Level};

use crate::audio::Device;
use crate::events::{EventBus, Message};
use crate::layout::GridLayout;
use crate::playback::{PlaybackEngine, PlaybackHandle};
use crate::samples::{DecodeEvent, DecodePool, DecodedSample, Preset, ProgressFn};
use crate::trim::{TrimStore, TrimWindow, MIN_WINDOW_SECONDS};
use crate::trimbar::{Side, Trimbar};
use crate::view::{PadView, WaveformInfo};

/// Plays one pad. Cheap to clone and safe to call from any thread.
pub type PadTrigger = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub enum PadKind {
    Loaded {
        name: String,
        url: String,
        trigger: PadTrigger,
    },
    Empty,
}

/// One cell of the pad grid.
#[derive(Clone)]
pub struct PadSlot {
    pad_index: usize,
    display_index: usize,
    kind: PadKind,
}

impl PadSlot {
    pub fn loaded(
        pad_index: usize,
        display_index: usize,
        name: &str,
        url: &str,
        trigger: PadTrigger,
    ) -> PadSlot {
        PadSlot {
            pad_index,
            display_index,
            kind: PadKind::Loaded {
                name: name.to_string(),
                url: url.to_string(),
                trigger,
            },
        }
    }

    pub fn empty(pad_index: usize, display_index: usize) -> PadSlot {
        PadSlot {
            pad_index,
            display_index,
            kind: PadKind::Empty,
        }
    }

    /// Logical index, counted from the bottom left.
    pub fn pad_index(&self) -> usize {
        self.pad_index
    }

    /// Position in top-down rendering order.
    pub fn display_index(&self) -> usize {
        self.display_index
    }

    pub fn kind(&self) -> &PadKind {
        &self.kind
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, PadKind::Empty)
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            PadKind::Loaded { name, .. } => Some(name),
            PadKind::Empty => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            PadKind::Loaded { url, .. } => Some(url),
            PadKind::Empty => None,
        }
    }

    /// Plays the pad. Returns false for an empty pad.
    pub fn trigger(&self) -> bool {
        match &self.kind {
            PadKind::Loaded { trigger, .. } => {
                trigger();
                true
            }
            PadKind::Empty => false,
        }
    }
}

impl fmt::Debug for PadSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PadSlot")
            .field("pad_index", &self.pad_index)
            .field("display_index", &self.display_index)
            .field("name", &self.name())
            .finish()
    }
}

/// The outcome of a successful load.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadReport {
    preset: String,
    loaded: usize,
    failed: usize,
}

impl LoadReport {
    pub fn new(preset: &str, loaded: usize, failed: usize) -> LoadReport {
        LoadReport {
            preset: preset.to_string(),
            loaded,
            failed,
        }
    }

    pub fn preset(&self) -> &str {
        &self.preset
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "{} ({} sounds, {} failed)",
                self.preset, self.loaded, self.failed
            )
        } else {
            write!(f, "{} ({} sounds)", self.preset, self.loaded)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("No preset at index {0}")]
    NoSuchPreset(usize),

    #[error("Preset {0} has no samples")]
    EmptyPreset(String),

    #[error("None of the samples in preset {0} could be loaded")]
    NothingDecoded(String),

    #[error("Loading preset {0} was superseded by a newer load")]
    Superseded(String),
}

/// Everything a loader is built from.
pub struct LoaderParts {
    pub presets: Vec<Preset>,
    pub pool: DecodePool,
    pub device: Arc<dyn Device>,
    pub view: Arc<dyn PadView>,
    pub bus: EventBus,
    pub layout: GridLayout,
    pub trimbar: Trimbar,
}

/// The sample shown in the waveform editor.
#[derive(Clone)]
struct Displayed {
    url: String,
    duration: f64,
}

struct Playing {
    pad_index: usize,
    url: String,
    handle: PlaybackHandle,
}

struct Inner {
    presets: RwLock<Vec<Preset>>,
    current_preset: RwLock<Option<usize>>,
    pool: DecodePool,
    engine: PlaybackEngine,
    view: Arc<dyn PadView>,
    bus: EventBus,
    layout: GridLayout,
    trims: RwLock<TrimStore>,
    trimbar: Mutex<Trimbar>,
    displayed: Mutex<Option<Displayed>>,
    /// Pad triggers keyed by display index.
    triggers: RwLock<Vec<Option<PadTrigger>>>,
    /// Rendered pads in display order.
    pads: RwLock<Vec<PadSlot>>,
    playing: Mutex<Option<Playing>>,
    status: RwLock<String>,
    error: RwLock<Option<String>>,
    /// Bumped by every load so an older load can tell it has been overtaken.
    generation: AtomicU64,
}

/// Orchestrates preset loads, the pad grid and pad playback. Clones share state.
#[derive(Clone)]
pub struct PresetLoader {
    inner: Arc<Inner>,
}

impl PresetLoader {
    pub fn new(parts: LoaderParts) -> PresetLoader {
        let pad_count = parts.layout.pad_count();
        PresetLoader {
            inner: Arc::new(Inner {
                presets: RwLock::new(parts.presets),
                current_preset: RwLock::new(None),
                pool: parts.pool,
                engine: PlaybackEngine::new(parts.device),
                view: parts.view,
                bus: parts.bus,
                layout: parts.layout,
                trims: RwLock::new(TrimStore::new()),
                trimbar: Mutex::new(parts.trimbar),
                displayed: Mutex::new(None),
                triggers: RwLock::new(vec![None; pad_count]),
                pads: RwLock::new(Vec::new()),
                playing: Mutex::new(None),
                status: RwLock::new(String::new()),
                error: RwLock::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn presets(&self) -> Vec<Preset> {
        self.inner.presets.read().clone()
    }

    pub fn set_presets(&self, presets: Vec<Preset>) {
        *self.inner.presets.write() = presets;
        *self.inner.current_preset.write() = None;
    }

    /// Index of the last successfully loaded preset.
    pub fn current_preset(&self) -> Option<usize> {
        *self.inner.current_preset.read()
    }

    pub fn layout(&self) -> GridLayout {
        self.inner.layout
    }

    /// Loads the preset at `index` onto the pad grid.
    ///
    /// Samples that fail to fetch or decode are skipped; the load only fails when none
    /// of them decode, in which case the grid is left cleared. If another load starts
    /// while this one is decoding, this one gives up without touching the grid.
    pub async fn load_preset_by_index(&self, index: usize) -> Result<LoadReport, LoadError> {
        let inner = &self.inner;
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let preset = match inner.presets.read().get(index).cloned() {
            Some(preset) => preset,
            None => return Err(inner.fail(LoadError::NoSuchPreset(index))),
        };

        inner.clear_pads();
        inner.set_status(format!("Loading preset {}", preset.name()));
        info!(
            preset = preset.name(),
            samples = preset.files().len(),
            concurrency = inner.pool.concurrency(),
            "Loading preset"
        );

        if preset.files().is_empty() {
            return Err(inner.fail(LoadError::EmptyPreset(preset.name().to_string())));
        }

        let results = inner
            .pool
            .decode_all(preset.files(), self.progress(generation))
            .await;

        if inner.generation.load(Ordering::SeqCst) != generation {
            info!(preset = preset.name(), "Preset load superseded");
            return Err(LoadError::Superseded(preset.name().to_string()));
        }

        let failed = results.iter().filter(|result| result.is_none()).count();
        let decoded: Vec<DecodedSample> = results.into_iter().flatten().collect();
        if decoded.is_empty() {
            if !inner.clear_pads_if_current(generation) {
                return Err(LoadError::Superseded(preset.name().to_string()));
            }
            return Err(inner.fail(LoadError::NothingDecoded(preset.name().to_string())));
        }

        let pad_count = inner.layout.pad_count();
        if decoded.len() > pad_count {
            warn!(
                preset = preset.name(),
                decoded = decoded.len(),
                pads = pad_count,
                "More samples than pads, extra samples are not mapped"
            );
        }

        let mut slots = Vec::with_capacity(pad_count);
        let mut triggers: Vec<Option<PadTrigger>> = vec![None; pad_count];
        for pad_index in 0..pad_count {
            let Some(display_index) = inner.layout.logical_to_display(pad_index) else {
                continue;
            };
            match decoded.get(pad_index) {
                Some(sample) => {
                    let trigger = self.trigger_for(sample.clone(), pad_index);
                    triggers[display_index] = Some(trigger.clone());
                    slots.push(PadSlot::loaded(
                        pad_index,
                        display_index,
                        sample.name(),
                        sample.url(),
                        trigger,
                    ));
                }
                None => slots.push(PadSlot::empty(pad_index, display_index)),
            }
        }
        slots.sort_by_key(|slot| slot.display_index());

        {
            // A newer load clears the grid under this same lock, so checking again here
            // means it either sees this grid or this load sees its generation.
            let mut pads = inner.pads.write();
            if inner.generation.load(Ordering::SeqCst) != generation {
                info!(preset = preset.name(), "Preset load superseded");
                return Err(LoadError::Superseded(preset.name().to_string()));
            }
            inner.view.render_pads(preset.name(), &slots);
            *pads = slots;
            *inner.triggers.write() = triggers;
            *inner.current_preset.write() = Some(index);
        }

        inner.resume_output();

        let report = LoadReport::new(preset.name(), decoded.len().min(pad_count), failed);
        inner.set_status(format!("Loaded preset {}", report));
        inner.bus.publish(Message::PresetLoaded(report.clone()));
        info!(
            preset = report.preset(),
            loaded = report.loaded(),
            failed = report.failed(),
            "Preset loaded"
        );
        Ok(report)
    }

    /// Progress reporting for one load. Reports from a superseded load are dropped.
    fn progress(&self, generation: u64) -> ProgressFn {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move |event: &DecodeEvent| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            inner.bus.publish(Message::Progress {
                done: event.done(),
                total: event.total(),
            });
            match event {
                DecodeEvent::Decoded { done, total, .. } => {
                    inner.set_status(format!("{}/{} decoded", done, total))
                }
                DecodeEvent::Failed { url, error, .. } => {
                    inner.set_status(format!("Failed to load {}: {}", url, error))
                }
            }
        })
    }

    fn trigger_for(&self, sample: DecodedSample, pad_index: usize) -> PadTrigger {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.play_sample(&sample, pad_index);
            }
        })
    }

    /// Plays the pad at a display position. Returns false if there's nothing there.
    pub fn trigger_display(&self, display_index: usize) -> bool {
        let trigger = self
            .inner
            .triggers
            .read()
            .get(display_index)
            .cloned()
            .flatten();
        match trigger {
            Some(trigger) => {
                trigger();
                true
            }
            None => {
                debug!(display_index, "No pad to trigger");
                false
            }
        }
    }

    /// Plays the pad at a logical position.
    pub fn trigger_pad(&self, pad_index: usize) -> bool {
        match self.inner.layout.logical_to_display(pad_index) {
            Some(display_index) => self.trigger_display(display_index),
            None => false,
        }
    }

    /// Stops whatever is playing.
    pub fn stop(&self) {
        self.inner.stop_current();
    }

    /// Pointer movement over the waveform editor. Returns true if it needs a redraw.
    pub fn pointer_move(&self, x: f64) -> bool {
        self.inner.trimbar.lock().pointer_move(x)
    }

    pub fn pointer_down(&self) -> Option<Side> {
        self.inner.trimbar.lock().pointer_down()
    }

    /// Ends a marker drag. The resulting window is stored for the displayed sample.
    pub fn pointer_up(&self) -> Option<TrimWindow> {
        let displayed = self.inner.displayed.lock().clone();
        let duration = displayed.as_ref().map_or(0.0, |displayed| displayed.duration);
        let window = self.inner.trimbar.lock().pointer_up(duration)?;
        Some(self.inner.store_released(displayed, window))
    }

    /// Moves a marker directly, as if it had been dragged there and released.
    pub fn drag_marker(&self, side: Side, x: f64) -> Option<TrimWindow> {
        let displayed = self.inner.displayed.lock().clone();
        let duration = displayed.as_ref().map_or(0.0, |displayed| displayed.duration);
        let window = self.inner.trimbar.lock().drag_marker(side, x, duration)?;
        Some(self.inner.store_released(displayed, window))
    }

    /// A snapshot of the trim markers.
    pub fn trimbar(&self) -> Trimbar {
        self.inner.trimbar.lock().clone()
    }

    pub fn status(&self) -> String {
        self.inner.status.read().clone()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.error.read().clone()
    }

    pub fn trim_window(&self, url: &str) -> Option<TrimWindow> {
        self.inner.trims.read().get(url).copied()
    }

    pub fn displayed_url(&self) -> Option<String> {
        self.inner
            .displayed
            .lock()
            .as_ref()
            .map(|displayed| displayed.url.clone())
    }

    /// Duration in seconds of the sample in the waveform editor.
    pub fn displayed_duration(&self) -> Option<f64> {
        self.inner
            .displayed
            .lock()
            .as_ref()
            .map(|displayed| displayed.duration)
    }

    /// The pad currently playing. Finished playback is cleared here.
    pub fn playing_pad(&self) -> Option<usize> {
        self.inner
            .live_playing()
            .as_ref()
            .map(|playing| playing.pad_index)
    }

    /// Playhead position in seconds of the playing sample.
    pub fn playhead(&self) -> Option<f64> {
        let now = self.inner.engine.device().current_time();
        self.inner
            .live_playing()
            .as_ref()
            .and_then(|playing| playing.handle.position(now))
    }

    /// The rendered pads in display order.
    pub fn pads(&self) -> Vec<PadSlot> {
        self.inner.pads.read().clone()
    }

    /// Serialises every stored trim window.
    pub fn export_trims(&self) -> Result<String, serde_json::Error> {
        self.inner.trims.read().to_json()
    }

    /// Merges previously exported trim windows into the store. Returns how many
    /// windows were imported.
    pub fn import_trims(&self, json: &str) -> Result<usize, serde_json::Error> {
        let imported = TrimStore::from_json(json)?;
        let count = imported.len();
        self.inner.trims.write().extend(imported);
        info!(count, "Imported trim windows");
        Ok(count)
    }
}

impl Inner {
    fn set_status(&self, status: String) {
        debug!(status, "Status");
        *self.status.write() = status.clone();
        self.bus.publish(Message::Status(status));
    }

    /// Records a load failure for the user and hands the error back.
    fn fail(&self, err: LoadError) -> LoadError {
        error!(err = %err, "Preset load failed");
        let message = err.to_string();
        *self.error.write() = Some(message.clone());
        self.bus.publish(Message::Error(message));
        err
    }

    /// The playing slot, with finished playback already cleared.
    fn live_playing(&self) -> MutexGuard<'_, Option<Playing>> {
        let mut playing = self.playing.lock();
        if playing
            .as_ref()
            .is_some_and(|playing| playing.handle.is_finished())
        {
            *playing = None;
        }
        playing
    }

    fn clear_pads(&self) {
        let mut pads = self.pads.write();
        self.clear_locked(&mut pads);
    }

    /// Clears the grid unless a newer load has started. Returns false if one has.
    fn clear_pads_if_current(&self, generation: u64) -> bool {
        let mut pads = self.pads.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        self.clear_locked(&mut pads);
        true
    }

    fn clear_locked(&self, pads: &mut Vec<PadSlot>) {
        self.view.clear_pads();
        pads.clear();
        self.triggers.write().iter_mut().for_each(|trigger| *trigger = None);
        *self.error.write() = None;
    }

    fn resume_output(&self) {
        let device = self.engine.device();
        if device.is_suspended() {
            match device.resume() {
                Ok(()) => debug!(device = %device, "Resumed audio output"),
                Err(e) => warn!(device = %device, err = %e, "Unable to resume audio output"),
            }
        }
    }

    fn stop_current(&self) {
        if let Some(playing) = self.playing.lock().take() {
            debug!(pad = playing.pad_index, url = playing.url, "Stopping pad");
            playing.handle.stop();
        }
    }

    fn store_released(&self, displayed: Option<Displayed>, window: TrimWindow) -> TrimWindow {
        match displayed {
            Some(displayed) => {
                let window = window.clamped(displayed.duration, MIN_WINDOW_SECONDS);
                self.trims.write().set(&displayed.url, window);
                info!(
                    url = displayed.url,
                    start = window.start,
                    end = window.end,
                    "Trim window updated"
                );
                window
            }
            None => window,
        }
    }

    fn play_sample(&self, sample: &DecodedSample, pad_index: usize) {
        let span = span!(Level::INFO, "trigger pad", pad = pad_index);
        let _enter = span.enter();

        let url = sample.url();
        let duration = sample.buffer().duration();
        let stored = self.trims.read().get(url).copied();

        if let Some(window) = &stored {
            self.trimbar.lock().set_window(window, duration);
        }
        *self.displayed.lock() = Some(Displayed {
            url: url.to_string(),
            duration,
        });
        self.view.show_waveform(&WaveformInfo {
            buffer: sample.buffer().clone(),
            url: url.to_string(),
            name: sample.name().to_string(),
            pad_index,
            window: stored,
        });

        self.resume_output();

        // A sample without a window takes whatever the markers currently show.
        let window = match stored {
            Some(window) => window.clamped(duration, MIN_WINDOW_SECONDS),
            None => {
                let window = self
                    .trimbar
                    .lock()
                    .window(duration)
                    .clamped(duration, MIN_WINDOW_SECONDS);
                self.trims.write().set(url, window);
                window
            }
        };

        // Held from the stop until the new handle is recorded so concurrent triggers
        // can't both start a segment.
        let mut playing = self.playing.lock();
        if let Some(previous) = playing.take() {
            debug!(pad = previous.pad_index, url = previous.url, "Stopping pad");
            previous.handle.stop();
        }

        match self.engine.play(
            sample.buffer(),
            window.start,
            window.end,
            sample.playback_rate(),
        ) {
            Ok(Some(handle)) => {
                info!(
                    sample = sample.name(),
                    start = window.start,
                    end = window.end,
                    rate = handle.playback_rate(),
                    "Playing pad"
                );
                *playing = Some(Playing {
                    pad_index,
                    url: url.to_string(),
                    handle,
                });
                self.bus.publish(Message::Playing { pad_index, window });
            }
            Ok(None) => debug!(sample = sample.name(), "Empty window, nothing played"),
            Err(e) => {
                let message = format!("Unable to play {}: {}", sample.name(), e);
                error!(err = message, "Playback failed");
                *self.error.write() = Some(message.clone());
                self.bus.publish(Message::Error(message));
            }
        }
    }
}
