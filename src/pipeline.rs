//! The streaming pipeline: one producer per triples map, a bounded channel
//! of quad batches, and a single writer that owns the dedup set.
//!
//! Producers never coordinate with each other; the channel is the only
//! shared state. Workers run in waves sized to the configured thread count
//! minus the writer's thread, and the channel closes once the last wave has
//! joined. A plan with exactly one triples map skips all of it and runs on
//! the caller's thread.

use std::io::{BufWriter, Write};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info};

use crate::dedup::{HashWidth, QuadSet};
use crate::errors::MappingError;
use crate::estimate::{estimate_distinct_quads, select_width};
use crate::generate::Generator;
use crate::plan::{NamedInputs, Plan, Quad, TriplesMap};
use crate::readers::CsvCursor;
use crate::template::SkipTokens;

const BATCH_SIZE: usize = 100;
const CHANNEL_CAPACITY: usize = 1000;


/// Everything the operator controls about a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dedup: bool,
    pub threading: bool,
    /// Zero means hardware concurrency.
    pub thread_count: usize,
    pub adaptive: bool,
    /// A fixed width bypasses estimation entirely.
    pub fixed_width: Option<HashWidth>,
    pub sampling_probability: f64,
    pub skips: SkipTokens,
    pub inputs: NamedInputs,
}

impl Default for RunOptions {
    fn default() -> RunOptions {
        RunOptions {
            dedup: false,
            threading: false,
            thread_count: 0,
            adaptive: false,
            fixed_width: None,
            sampling_probability: 0.05,
            skips: SkipTokens::new(),
            inputs: NamedInputs::new(),
        }
    }
}


#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub written: u64,
    pub duplicates: u64,
    pub width: HashWidth,
}


/// Materialize the plan into `out` as N-Quads.
pub fn materialize<W: Write + Send>(
    plan: &Plan,
    options: &RunOptions,
    out: W,
) -> Result<RunSummary, MappingError> {
    let width = resolve_width(plan, options)?;
    let mut writer = QuadWriter::new(out, options.dedup, width);

    // single-map plans run the whole pipeline on the caller's thread
    if !options.threading || plan.triples_maps.len() == 1 {
        for triples_map in &plan.triples_maps {
            run_triples_map(triples_map, options, |batch| {
                writer.write_batch(batch).map_err(MappingError::from)
            })?;
        }
        return writer.finish(width);
    }

    let thread_count = match options.thread_count {
        0 => num_cpus::get(),
        n => n,
    };
    let worker_slots = thread_count.saturating_sub(1).max(1);
    debug!(thread_count, worker_slots, "starting threaded run");

    let (sender, receiver) = bounded::<Vec<Quad>>(CHANNEL_CAPACITY);

    thread::scope(|scope| {
        let writer_handle = scope.spawn(move || -> Result<QuadWriter<W>, MappingError> {
            consume(&mut writer, &receiver)?;
            Ok(writer)
        });

        let produced = run_waves(plan, options, worker_slots, scope, &sender);

        // the last sender dropping is the channel's done signal
        drop(sender);

        let writer = writer_handle.join().map_err(|_| MappingError::WorkerFailed)??;
        produced?;
        writer.finish(width)
    })
}

fn run_waves<'scope>(
    plan: &'scope Plan,
    options: &'scope RunOptions,
    worker_slots: usize,
    scope: &'scope thread::Scope<'scope, '_>,
    sender: &Sender<Vec<Quad>>,
) -> Result<(), MappingError> {
    for wave in plan.triples_maps.chunks(worker_slots) {
        let handles: Vec<_> = wave
            .iter()
            .map(|triples_map| {
                let sender = sender.clone();
                scope.spawn(move || {
                    run_triples_map(triples_map, options, |batch| {
                        sender
                            .send(batch.to_vec())
                            .map_err(|_| MappingError::WriterGone)
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().map_err(|_| MappingError::WorkerFailed)??;
        }
    }
    Ok(())
}

/// Produce every quad of one triples map, handing them downstream in
/// fixed-size batches.
fn run_triples_map(
    triples_map: &TriplesMap,
    options: &RunOptions,
    mut push: impl FnMut(&[Quad]) -> Result<(), MappingError>,
) -> Result<(), MappingError> {
    let generator = Generator::new(triples_map, &options.inputs, &options.skips)?;
    let mut cursor = CsvCursor::open(&triples_map.logical_source.source, &options.inputs)?;
    let header: Vec<String> = cursor.header().to_vec();

    let mut batch: Vec<Quad> = Vec::with_capacity(BATCH_SIZE);
    let mut rows = 0u64;

    while let Some(row) = cursor.next_row()? {
        rows += 1;
        for quad in generator.quads_for_row(&header, &row)? {
            batch.push(quad);
            if batch.len() == BATCH_SIZE {
                push(&batch)?;
                batch.clear();
            }
        }
    }

    if !batch.is_empty() {
        push(&batch)?;
    }

    debug!(triples_map = %triples_map.node, rows, "triples map finished");
    Ok(())
}

fn consume<W: Write>(writer: &mut QuadWriter<W>, receiver: &Receiver<Vec<Quad>>) -> Result<(), MappingError> {
    for batch in receiver.iter() {
        writer.write_batch(&batch)?;
    }
    Ok(())
}

fn resolve_width(plan: &Plan, options: &RunOptions) -> Result<HashWidth, MappingError> {
    if let Some(width) = options.fixed_width {
        return Ok(width);
    }
    if !options.adaptive {
        // no estimate requested: the widest set is always safe
        return Ok(HashWidth::W128);
    }

    let estimate = estimate_distinct_quads(plan, &options.inputs, &options.skips, options.sampling_probability)?;
    let width = select_width(estimate);
    info!(estimate, bits = width.bits(), "selected dedup hash width");
    Ok(width)
}


/// The single consumer: deduplicates, buffers a batch worth of lines, and
/// flushes per batch.
struct QuadWriter<W: Write> {
    out: BufWriter<W>,
    set: Option<QuadSet>,
    buffer: String,
    written: u64,
    duplicates: u64,
}

impl<W: Write> QuadWriter<W> {
    fn new(out: W, dedup: bool, width: HashWidth) -> QuadWriter<W> {
        QuadWriter {
            out: BufWriter::new(out),
            set: dedup.then(|| QuadSet::new(width)),
            buffer: String::new(),
            written: 0,
            duplicates: 0,
        }
    }

    fn write_batch(&mut self, batch: &[Quad]) -> Result<(), std::io::Error> {
        self.buffer.clear();
        for quad in batch {
            if let Some(set) = &mut self.set {
                if !set.insert(quad) {
                    self.duplicates += 1;
                    continue;
                }
            }
            self.buffer.push_str(&quad.to_line());
            self.written += 1;
        }
        self.out.write_all(self.buffer.as_bytes())
    }

    fn finish(mut self, width: HashWidth) -> Result<RunSummary, MappingError> {
        self.out.flush()?;
        Ok(RunSummary {
            written: self.written,
            duplicates: self.duplicates,
            width,
        })
    }
}
