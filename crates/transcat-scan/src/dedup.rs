//! Collapse raw occurrences into unique sources.

use std::collections::HashSet;
use transcat_core::source::{FoundSource, FunctionTable, Occurrence};

/// Map occurrences to their kinds and keep the first of each `(value, kind)`.
///
/// The same value reached through two functions of one kind counts once;
/// reached through functions of different kinds it counts once per kind.
pub fn dedup(
    occurrences: impl IntoIterator<Item = Occurrence>,
    functions: &FunctionTable,
) -> Vec<FoundSource> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for occurrence in occurrences {
        let Some(kind) = functions.kind_of(&occurrence.function) else {
            continue;
        };
        let source = FoundSource {
            value: occurrence.value,
            kind,
        };
        if seen.insert(source.clone()) {
            found.push(source);
        }
    }
    found
}
