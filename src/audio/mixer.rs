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
use crossbeam_channel::Receiver;

use super::source::OneShot;

/// Mixes the active one-shots into output blocks. Owned by the output callback; new
/// segments arrive over a channel.
pub struct Mixer {
    sources: Vec<OneShot>,
    source_rx: Receiver<OneShot>,
    num_channels: u16,
    sample_rate: u32,
}

impl Mixer {
    pub fn new(source_rx: Receiver<OneShot>, num_channels: u16, sample_rate: u32) -> Mixer {
        Mixer {
            sources: Vec::new(),
            source_rx,
            num_channels,
            sample_rate,
        }
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Number of segments still playing.
    pub fn active(&self) -> usize {
        self.sources.len()
    }

    /// Fills `output` with the next block of interleaved audio.
    pub fn process(&mut self, output: &mut [f32]) {
        while let Ok(source) = self.source_rx.try_recv() {
            self.sources.push(source);
        }

        output.fill(0.0);
        let num_channels = self.num_channels as usize;
        let sample_rate = self.sample_rate;
        self.sources
            .retain_mut(|source| source.render(output, num_channels, sample_rate));

        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::playsync::CancelHandle;
    use crate::samples::PcmBuffer;

    #[test]
    fn test_mix_and_retire() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut mixer = Mixer::new(rx, 1, 4);
        let buffer = PcmBuffer::new(vec![0.25; 4], 1, 4);

        let first = CancelHandle::new();
        tx.send(OneShot::new(&buffer, 0.0, 1.0, 1.0, first.clone()))
            .unwrap();
        tx.send(OneShot::new(&buffer, 0.0, 0.5, 1.0, CancelHandle::new()))
            .unwrap();

        let mut output = vec![1.0; 2];
        mixer.process(&mut output);
        assert_eq!(vec![0.5, 0.5], output);
        assert_eq!(1, mixer.active());

        first.cancel();
        mixer.process(&mut output);
        assert_eq!(vec![0.0, 0.0], output);
        assert_eq!(0, mixer.active());
    }
}
