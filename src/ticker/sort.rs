use crate::ticker::numeric::parse_sort_value;
use crate::ticker::types::{SortDirection, SortSpec, TickerEntry};

/// Orders entries by the field `spec.key` names.
///
/// The descending order is computed with a stable sort; ascending is that
/// exact sequence reversed, so tied entries come out in reverse input order
/// rather than being re-sorted stably.
pub fn sort_entries(entries: &[TickerEntry], spec: SortSpec) -> Vec<TickerEntry> {
    let mut keyed: Vec<(f64, &TickerEntry)> = entries
        .iter()
        .map(|entry| (parse_sort_value(spec.key.field(entry)), entry))
        .collect();
    keyed.sort_by(|lhs, rhs| rhs.0.total_cmp(&lhs.0));

    let ordered = keyed.into_iter().map(|(_, entry)| entry.clone());
    match spec.direction {
        SortDirection::Descending => ordered.collect(),
        SortDirection::Ascending => ordered.rev().collect(),
    }
}
