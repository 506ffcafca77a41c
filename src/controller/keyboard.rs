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
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;
use crate::trimbar::Side;

/// Keys for the pad grid, top row first. Each key maps to the display position it
/// sits at on a QWERTY keyboard.
const KEY_ROWS: [&str; 4] = ["1234", "qwer", "asdf", "zxcv"];

const NEXT: &str = "next";
const PREV: &str = "prev";
const STOP: &str = "stop";
const LOAD: &str = "load";
const PAD: &str = "pad";
const DRAG: &str = "drag";
const EXPORT: &str = "export";

/// A controller that plays pads from lines typed on the keyboard.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Reads one command and forwards it. Returns false once the reader is exhausted.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Pad key ({}) or command ({}, {}, {}, {} <n>, {} <n>, {} left|right <x>, {}): ",
            KEY_ROWS.join(" "),
            NEXT,
            PREV,
            STOP,
            LOAD,
            PAD,
            DRAG,
            EXPORT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        match parse_command(&input) {
            Some(event) => events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::other(e.to_string()))?,
            None => {
                if !input.trim().is_empty() {
                    warn!(input = input.trim(), "Unrecognized input");
                }
            }
        }
        Ok(true)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}

/// Parses a line of keyboard input into an event.
fn parse_command(input: &str) -> Option<Event> {
    let input = input.trim().to_lowercase();
    let mut words = input.split_whitespace();
    let command = words.next()?;
    let argument = words.next();

    let event = match (command, argument) {
        (NEXT, None) => Event::NextPreset,
        (PREV, None) => Event::PrevPreset,
        (STOP, None) => Event::Stop,
        (EXPORT, None) => Event::ExportTrims,
        (LOAD, Some(index)) => Event::Load(index.parse().ok()?),
        (PAD, Some(index)) => Event::TriggerPad(index.parse().ok()?),
        (DRAG, Some(side)) => {
            let side = match side {
                "left" => Side::Left,
                "right" => Side::Right,
                _ => return None,
            };
            let x: f64 = words.next()?.parse().ok()?;
            if !x.is_finite() {
                return None;
            }
            return match words.next() {
                None => Some(Event::Drag { side, x }),
                Some(_) => None,
            };
        }
        (key, None) => Event::Trigger(display_index(key)?),
        _ => return None,
    };

    match words.next() {
        None => Some(event),
        Some(_) => None,
    }
}

/// The display position of a pad key.
fn display_index(key: &str) -> Option<usize> {
    let mut chars = key.chars();
    let key = chars.next()?;
    if chars.next().is_some() {
        return None;
    }

    KEY_ROWS.iter().enumerate().find_map(|(row, keys)| {
        keys.chars()
            .position(|candidate| candidate == key)
            .map(|col| row * keys.len() + col)
    })
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}

            info!("Keyboard input closed.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, BufWriter};

    use tokio::sync::mpsc;

    use crate::controller::{keyboard::*, Event};

    use super::Driver;

    fn get_event(event: &str) -> Result<Option<Event>, io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader = BufReader::new(event.as_bytes());
        let writer = BufWriter::new(Vec::new());
        Driver::monitor_io(&sender, reader, writer)?;

        // Force the sender to close.
        drop(sender);
        Ok(receiver.blocking_recv())
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        assert_eq!(Some(Event::NextPreset), get_event(NEXT)?);
        assert_eq!(Some(Event::PrevPreset), get_event("PREV\n")?);
        assert_eq!(Some(Event::Stop), get_event(STOP)?);
        assert_eq!(Some(Event::ExportTrims), get_event(EXPORT)?);
        assert_eq!(Some(Event::Load(3)), get_event("load 3\n")?);
        assert_eq!(Some(Event::TriggerPad(15)), get_event("pad 15")?);
        assert_eq!(
            Some(Event::Drag {
                side: Side::Right,
                x: 612.5
            }),
            get_event("drag right 612.5")?
        );
        assert_eq!(None, get_event("unrecognized")?);
        assert_eq!(None, get_event("load")?);
        assert_eq!(None, get_event("load x")?);
        assert_eq!(None, get_event("drag up 10")?);
        assert_eq!(None, get_event("next 2")?);
        assert_eq!(None, get_event("")?);
        Ok(())
    }

    #[test]
    fn test_pad_keys() -> Result<(), io::Error> {
        assert_eq!(Some(Event::Trigger(0)), get_event("1")?);
        assert_eq!(Some(Event::Trigger(3)), get_event("4")?);
        assert_eq!(Some(Event::Trigger(5)), get_event("w")?);
        assert_eq!(Some(Event::Trigger(10)), get_event("D")?);
        assert_eq!(Some(Event::Trigger(12)), get_event("z")?);
        assert_eq!(Some(Event::Trigger(15)), get_event("v")?);
        assert_eq!(None, get_event("5")?);
        assert_eq!(None, get_event("zx")?);
        Ok(())
    }

    #[test]
    fn test_end_of_input() -> Result<(), io::Error> {
        let (sender, _receiver) = mpsc::channel::<Event>(1);
        let reader = BufReader::new("".as_bytes());
        assert!(!Driver::monitor_io(&sender, reader, BufWriter::new(Vec::new()))?);

        let reader = BufReader::new("\n".as_bytes());
        assert!(Driver::monitor_io(&sender, reader, BufWriter::new(Vec::new()))?);
        Ok(())
    }
}
