use std::collections::HashMap;

/// Aligns `records`, fetched in no particular order, to the order of `ids`. Each slot holds the
/// record with that id, or `None` if none was fetched. Repeated ids each get a copy.
pub fn normalize_results<T, F>(ids: &[String], records: Vec<T>, id_of: F) -> Vec<Option<T>>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    let mut by_id: HashMap<String, T> = HashMap::with_capacity(records.len());
    for record in records {
        by_id.insert(id_of(&record).to_owned(), record);
    }
    ids.iter().map(|id| by_id.get(id).cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_to_requested_order_with_gaps() {
        let ids = ["b", "x", "a", "b"].map(str::to_owned);
        let records = vec![("a", 1), ("b", 2)];
        let normalized = normalize_results(&ids, records, |r| r.0);
        assert_eq!(normalized, vec![Some(("b", 2)), None, Some(("a", 1)), Some(("b", 2))]);
    }

    #[test]
    fn empty_request_is_empty() {
        let normalized = normalize_results::<(&str, i32), _>(&[], vec![("a", 1)], |r| r.0);
        assert!(normalized.is_empty());
    }
}
