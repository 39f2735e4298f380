//! Distinct-quad cardinality estimation, used to pick the dedup hash width
//! before the pipeline starts.
//!
//! Child rows are Bernoulli-sampled at the configured probability; every quad
//! a sampled row produces is fingerprinted with a 64-bit content hash and the
//! per-predicate-object-map distinct counts are scaled back up by `1/p`.
//! Joins run against their fully built parent index with only the child side
//! sampled. Once the running sum clears the 64-bit threshold the answer is
//! known and the scan stops.

use rand::Rng;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

use crate::dedup::{fingerprint, HashWidth};
use crate::errors::MappingError;
use crate::generate::Generator;
use crate::plan::{NamedInputs, Plan, Quad, TermSource};
use crate::readers::CsvCursor;
use crate::template::SkipTokens;

// Birthday-problem thresholds for ~0.05% expected collisions.
const MAX_QUADS_32: u64 = 2_073;
const MAX_QUADS_64: u64 = 135_835_773;


/// Estimate the number of distinct quads the plan will produce.
pub fn estimate_distinct_quads(
    plan: &Plan,
    inputs: &NamedInputs,
    skips: &SkipTokens,
    probability: f64,
) -> Result<u64, MappingError> {
    let mut rng = rand::thread_rng();
    let mut total: u64 = 0;

    for triples_map in &plan.triples_maps {
        let generator = Generator::new(triples_map, inputs, skips)?;
        let mut cursor = CsvCursor::open(&triples_map.logical_source.source, inputs)?;
        let header: Vec<String> = cursor.header().to_vec();

        let mut per_pom: Vec<std::collections::HashSet<u64>> =
            (0..triples_map.predicates.len()).map(|_| Default::default()).collect();
        let mut subjects = std::collections::HashSet::new();

        while let Some(row) = cursor.next_row()? {
            if rng.gen::<f64>() >= probability {
                continue;
            }

            let Some(graph) = generator.subject_graph(&header, &row)? else {
                continue;
            };
            let Some(subject) = generator.subject(&header, &row)? else {
                continue;
            };
            subjects.insert(xxh3_64(subject.as_bytes()));

            for k in 0..triples_map.predicates.len() {
                let Some(predicate) = generator.predicate(k, &header, &row)? else {
                    continue;
                };
                for object in generator.objects(k, &header, &row)? {
                    let quad = Quad {
                        subject: subject.clone(),
                        predicate: predicate.clone(),
                        object,
                        graph: graph.clone(),
                    };
                    per_pom[k].insert(xxh3_64(&fingerprint(&quad)));
                }
            }
        }

        for (k, distinct) in per_pom.iter().enumerate() {
            let scaled = (distinct.len() as f64 / probability) as u64;
            debug!(triples_map = %triples_map.node, pom = k, distinct = distinct.len(), scaled, "sampled");
            total = total.saturating_add(scaled);
        }

        // class expansion: one rdf:type quad per class per distinct subject,
        // or per class alone when the subject is constant
        if !triples_map.subject.classes.is_empty() {
            let classes = triples_map.subject.classes.len() as u64;
            let contribution = match &triples_map.subject.source {
                TermSource::Constant(_) => classes,
                _ => ((subjects.len() as f64 / probability) as u64).saturating_mul(classes),
            };
            total = total.saturating_add(contribution);
        }

        if total > MAX_QUADS_64 {
            info!(estimate = total, "estimate cleared the 64-bit threshold, stopping early");
            return Ok(total);
        }
    }

    info!(estimate = total, "estimated distinct quads");
    Ok(total)
}

/// The narrowest width whose expected collision count stays acceptable for
/// the estimate.
pub fn select_width(estimate: u64) -> HashWidth {
    if estimate <= MAX_QUADS_32 {
        HashWidth::W32
    } else if estimate <= MAX_QUADS_64 {
        HashWidth::W64
    } else {
        HashWidth::W128
    }
}
