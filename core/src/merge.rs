//! Object merge engine: verb-specific reconciliation of fetched records
//! into the locally held collection.

use crate::verb::Verb;
use serde_json::Value;

/// Merge a server response into the local collection.
///
/// Record equality is defined over `primary_keys`: two records match when
/// every listed field compares equal (a field missing from both sides
/// counts as equal). The rules per verb:
///
/// - `GET`: the new objects verbatim, this is what the server has for
///   this query.
/// - `POST`: old plus new, the server created records so append them.
/// - `PUT` with `is_batch`: the new objects verbatim (whole-collection
///   replace).
/// - `PUT` on an item, and `PATCH`: upsert. Old records matching a new
///   one are dropped, survivors keep their relative order, new records
///   are appended at the end.
/// - `DELETE`: old records matching a new one are removed.
#[must_use]
pub fn merge_objects(
    verb: Verb,
    old: &[Value],
    new: &[Value],
    primary_keys: &[String],
    is_batch: bool,
) -> Vec<Value> {
    match verb {
        Verb::Get => new.to_vec(),
        Verb::Post => old.iter().chain(new).cloned().collect(),
        Verb::Put if is_batch => new.to_vec(),
        Verb::Put | Verb::Patch => {
            let mut merged: Vec<Value> = old
                .iter()
                .filter(|record| !matches_any(record, new, primary_keys))
                .cloned()
                .collect();
            merged.extend(new.iter().cloned());
            merged
        }
        Verb::Delete => old
            .iter()
            .filter(|record| !matches_any(record, new, primary_keys))
            .cloned()
            .collect(),
    }
}

/// Primary-key equality of two records.
fn pk_equal(a: &Value, b: &Value, primary_keys: &[String]) -> bool {
    primary_keys.iter().all(|key| a.get(key) == b.get(key))
}

fn matches_any(record: &Value, others: &[Value], primary_keys: &[String]) -> bool {
    others.iter().any(|other| pk_equal(record, other, primary_keys))
}
