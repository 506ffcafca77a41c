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
use std::{io, sync::Arc};

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::error;

use super::Event;

/// A controller that merges the events of several other drivers.
pub struct Driver {
    sub_drivers: Vec<Arc<dyn super::Driver>>,
}

impl Driver {
    pub fn new(sub_drivers: Vec<Arc<dyn super::Driver>>) -> Driver {
        Driver { sub_drivers }
    }

    pub fn len(&self) -> usize {
        self.sub_drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_drivers.is_empty()
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let join_handles = self
            .sub_drivers
            .iter()
            .map(|driver| driver.monitor_events(events_tx.clone()))
            .collect::<Vec<_>>();

        tokio::spawn(async move {
            let mut failed = 0;
            for handle in join_handles {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(err = %e, "Driver failed");
                        failed += 1;
                    }
                    Err(e) => {
                        error!(err = %e, "Driver task failed");
                        failed += 1;
                    }
                }
            }
            if failed == 0 {
                Ok(())
            } else {
                Err(io::Error::other(format!("{} driver(s) failed", failed)))
            }
        })
    }
}
