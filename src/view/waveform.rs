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
use crate::samples::PcmBuffer;

/// Min/max peaks of the first channel, one pair per column. An empty buffer gives
/// silent columns.
pub fn peaks(buffer: &PcmBuffer, columns: usize) -> Vec<(f32, f32)> {
    let frames = buffer.frames();
    let channels = buffer.channel_count() as usize;
    let data = buffer.data();

    (0..columns)
        .map(|column| {
            let from = column * frames / columns;
            let to = ((column + 1) * frames / columns).max(from + 1).min(frames);
            (from..to)
                .map(|frame| data[frame * channels])
                .fold(None, |acc: Option<(f32, f32)>, sample| match acc {
                    Some((min, max)) => Some((min.min(sample), max.max(sample))),
                    None => Some((sample, sample)),
                })
                .unwrap_or((0.0, 0.0))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_peaks() {
        let buffer = PcmBuffer::new(vec![0.1, -0.5, 0.9, 0.2, -0.3, 0.0], 1, 6);
        assert_eq!(
            vec![(-0.5, 0.1), (0.2, 0.9), (-0.3, 0.0)],
            peaks(&buffer, 3)
        );
    }

    #[test]
    fn test_peaks_uses_first_channel() {
        let buffer = PcmBuffer::new(vec![0.5, -1.0, -0.5, 1.0], 2, 2);
        assert_eq!(vec![(0.5, 0.5), (-0.5, -0.5)], peaks(&buffer, 2));
    }

    #[test]
    fn test_more_columns_than_frames() {
        let buffer = PcmBuffer::new(vec![0.5, -0.5], 1, 2);
        let peaks = peaks(&buffer, 4);
        assert_eq!(4, peaks.len());
        assert_eq!((0.5, 0.5), peaks[0]);
        assert_eq!((-0.5, -0.5), peaks[3]);
    }
}
