// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! Anchor recording and alias replay.
//!
//! The event source hands the loader a single stream in which aliases
//! have been substituted by the events they name. Anchored nodes are
//! recorded as they stream past: event payloads land once in a flat
//! data buffer, and a separate playback-order array of indices into
//! that buffer describes each anchor's span. Replaying an alias walks
//! the order array, so replaying the same anchor many times never
//! duplicates event data, and a replay that happens inside another
//! recording appends indices only.

use crate::config::{Config, ConfigFlags};
use crate::error::{new, ErrorImpl, Result};
use crate::libyml::error::Mark;
use crate::libyml::parser::{Event, Parser};

/// A completed anchor: a span of the playback order.
#[derive(Debug)]
struct AnchorRecord {
    name: String,
    start: usize,
    end: usize,
}

/// An anchor whose matching end event has not arrived yet.
#[derive(Debug)]
struct ProgressRecord {
    name: String,
    start: usize,
    /// Collection nesting depth relative to the recording's start.
    level: u32,
}

/// An active replay cursor over the playback order.
#[derive(Debug)]
struct Replay {
    pos: usize,
    end: usize,
}

/// The loader's event supply: the live parser, with anchors recorded
/// and aliases transparently replayed.
#[derive(Debug)]
pub(crate) struct EventSource<'c, 'input> {
    parser: Parser<'input>,
    config: &'c Config,
    /// Flat buffer of recorded events.
    data: Vec<(Event, Mark)>,
    /// Playback order; indices into `data`. Longer than `data` when
    /// aliases replay shared spans.
    order: Vec<usize>,
    complete: Vec<AnchorRecord>,
    progress: Vec<ProgressRecord>,
    replay: Option<Replay>,
}

impl<'c, 'input> EventSource<'c, 'input> {
    pub(crate) fn new(config: &'c Config, parser: Parser<'input>) -> Self {
        EventSource {
            parser,
            config,
            data: Vec::new(),
            order: Vec::new(),
            complete: Vec::new(),
            progress: Vec::new(),
            replay: None,
        }
    }

    /// Pulls the next event, from the replayer while one is active and
    /// from the live parser otherwise.
    pub(crate) fn next(&mut self) -> Result<(Event, Mark)> {
        loop {
            if let Some(replayed) = self.replay_next() {
                return Ok(replayed);
            }

            let (mut event, mark) = self.parser.next_event()?;

            if let Event::Alias(name) = &event {
                if self.config.flags.contains(ConfigFlags::NO_ALIAS) {
                    return Err(new(ErrorImpl::Alias(mark.location())));
                }
                // Later definitions shadow earlier ones with the same
                // name, so resolve backwards over completed anchors.
                let record = self
                    .complete
                    .iter()
                    .rev()
                    .find(|record| record.name == *name)
                    .ok_or_else(|| new(ErrorImpl::InvalidAlias(mark.location())))?;
                self.replay = Some(Replay {
                    pos: record.start,
                    end: record.end,
                });
                continue;
            }

            let anchor = event.take_anchor();
            if !self.progress.is_empty() || anchor.is_some() {
                self.data.push((event.clone(), mark));
                self.order.push(self.data.len() - 1);
            }
            if let Some(name) = anchor {
                match &event {
                    Event::Scalar(_) => {
                        // A scalar anchors exactly one event.
                        let end = self.order.len();
                        self.complete.push(AnchorRecord {
                            name,
                            start: end - 1,
                            end,
                        });
                    }
                    Event::MappingStart(_) | Event::SequenceStart(_) => {
                        self.progress.push(ProgressRecord {
                            name,
                            start: self.order.len() - 1,
                            level: 0,
                        });
                    }
                    _ => {}
                }
            }
            self.track_nesting(&event);
            return Ok((event, mark));
        }
    }

    fn replay_next(&mut self) -> Option<(Event, Mark)> {
        let replay = self.replay.as_mut()?;
        if replay.pos >= replay.end {
            self.replay = None;
            return None;
        }
        let data_index = self.order[replay.pos];
        replay.pos += 1;
        let (event, mark) = self.data[data_index].clone();
        if !self.progress.is_empty() {
            // Replayed inside an open recording: reference the shared
            // payload instead of copying it.
            self.order.push(data_index);
            self.track_nesting(&event);
        }
        Some((event, mark))
    }

    /// Advances the nesting level of every open recording and completes
    /// those whose collection just closed.
    fn track_nesting(&mut self, event: &Event) {
        match event {
            Event::MappingStart(_) | Event::SequenceStart(_) => {
                for record in &mut self.progress {
                    record.level += 1;
                }
            }
            Event::MappingEnd | Event::SequenceEnd => {
                for record in &mut self.progress {
                    record.level -= 1;
                }
                while self.progress.last().is_some_and(|record| record.level == 0) {
                    if let Some(finished) = self.progress.pop() {
                        self.complete.push(AnchorRecord {
                            name: finished.name,
                            start: finished.start,
                            end: self.order.len(),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}
