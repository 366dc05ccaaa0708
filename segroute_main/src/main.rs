// SegRoute: Synthesizing ECMP and Label-Push Groups for Segment Routing
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use segroute::example_networks;
use segroute::handler::GroupHandler;
use segroute::objective::{NextObjective, ObjectiveSink};
use segroute::store::NextObjectiveStore;
use segroute::{DeviceId, NextId};

use clap::{Parser, Subcommand};
use log::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

mod fabric;
use fabric::Fabric;

fn main() -> Result<(), Box<dyn Error>> {
    // run clap
    let args = CommandLineArguments::parse();

    // initialize the env logger
    pretty_env_logger::init();

    match args.cmd {
        MainCommand::Run { fabric_file, device, verify } => {
            info!("Loading fabric from {}", fabric_file);
            let fabric = Fabric::load(&fabric_file)?;
            run(fabric, device, verify)?;
        }
        MainCommand::Example { name, device, verify } => {
            let (config, links) = example_networks::by_name(&name).ok_or_else(|| {
                format!(
                    "Unknown example fabric {}! Choose one of: {}",
                    name,
                    example_networks::NAMES.join(", ")
                )
            })?;
            run(Fabric::new(config, links), device, verify)?;
        }
    }
    Ok(())
}

/// Build the handlers of all devices (or only the selected one), create their groups, replay the
/// events, and print the resulting groups.
fn run(fabric: Fabric, device: Option<DeviceId>, verify: bool) -> Result<(), Box<dyn Error>> {
    let Fabric { config, links, events } = fabric;
    let config = Arc::new(config);
    let sink = Arc::new(LoggingSink::default());
    let store = NextObjectiveStore::in_memory();

    let devices = match device {
        Some(d) => vec![d],
        None => config.devices(),
    };

    let mut handlers = BTreeMap::new();
    for d in devices {
        let handler = GroupHandler::new(d, config.clone(), &links, sink.clone(), store.clone())?;
        let hashed = handler.create_groups();
        let flooding = handler.create_groups_from_subnet_config();
        info!("{}: created {} hashed and {} flooding groups", d, hashed, flooding);
        handlers.insert(d, handler);
    }

    for (d, event) in events {
        match handlers.get(&d) {
            Some(handler) => {
                info!("{}: replaying {:?}", d, event);
                handler.handle_event(event, true);
            }
            None if device.is_some() => {
                debug!("{}: skipping event {:?} of an unselected device", d, event)
            }
            None => return Err(segroute::Error::NoHandler(d).into()),
        }
    }

    if verify {
        for handler in handlers.values() {
            handler.verify_groups(true);
        }
    }

    for (d, handler) in handlers.iter() {
        println!("{} (sid {})", d, handler.node_sid());
        for (ns, id) in store.neighbor_sets_of(*d) {
            println!("    {:>5}  {}", id, ns);
        }
        for (prefix, id) in store.subnets_of(*d) {
            println!("    {:>5}  flood {}", id, prefix);
        }
    }
    info!("Submitted {} objectives in total", sink.submitted.load(Ordering::SeqCst));

    Ok(())
}

/// Sink accepting every objective, and logging it.
#[derive(Default)]
struct LoggingSink {
    next_id: AtomicU32,
    submitted: AtomicUsize,
}

impl ObjectiveSink for LoggingSink {
    fn allocate_next_id(&self) -> NextId {
        NextId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn next(&self, device: DeviceId, mut objective: NextObjective) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        info!(
            "{}: {:?} {:?} NextObj {} with {} buckets",
            device,
            objective.op,
            objective.kind,
            objective.id,
            objective.treatments.len()
        );
        for t in objective.treatments.iter() {
            debug!("    {}", t);
        }
        objective.complete(Ok(()));
    }
}

/// Synthesize the ECMP, flooding and port groups of a segment routing fabric, replay topology
/// events on them, and print the resulting groups of every device.
#[derive(Parser, Debug)]
#[command(name = "SegRoute (Binary)", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Action to perform
    #[command(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Build the groups of a fabric described in a JSON file
    #[command(name = "run")]
    Run {
        /// JSON file describing devices, links and events
        fabric_file: String,
        /// Only build the groups of this device (e.g., `of:0000000000000201`)
        #[arg(short = 'd', long)]
        device: Option<DeviceId>,
        /// Verify all hashed groups after replaying the events
        #[arg(short = 'v', long)]
        verify: bool,
    },
    /// Build the groups of a built-in example fabric
    #[command(name = "example")]
    Example {
        /// Name of the example fabric
        name: String,
        /// Only build the groups of this device
        #[arg(short = 'd', long)]
        device: Option<DeviceId>,
        /// Verify all hashed groups
        #[arg(short = 'v', long)]
        verify: bool,
    },
}
