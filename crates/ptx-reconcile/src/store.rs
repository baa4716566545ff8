//! Known-state store: last recorded version of every submission code.
//!
//! Plain owned data. The store has no interior locking; callers hand it to one
//! cycle at a time by `&mut`. Entries are never evicted or removed.

use std::collections::BTreeMap;

use crate::Submission;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KnownSubmissions {
    entries: BTreeMap<String, Submission>,
}

impl KnownSubmissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&Submission> {
        self.entries.get(code)
    }

    /// Insert or overwrite unconditionally.
    pub fn put(&mut self, code: impl Into<String>, submission: Submission) {
        self.entries.insert(code.into(), submission);
    }

    /// Bulk-load the baseline without producing events. Returns the entry count afterwards.
    pub fn seed<I>(&mut self, submissions: I) -> usize
    where
        I: IntoIterator<Item = Submission>,
    {
        for submission in submissions {
            self.entries.insert(submission.code.clone(), submission);
        }
        self.entries.len()
    }

    /// Entries ordered by code.
    pub fn snapshot(&self) -> Vec<(String, Submission)> {
        self.entries
            .iter()
            .map(|(code, s)| (code.clone(), s.clone()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Submission)> {
        self.entries.iter().map(|(code, s)| (code.as_str(), s))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeLabel;

    fn sub(code: &str, title: &str) -> Submission {
        Submission::new(code, title, TypeLabel::new("Talk", ""))
    }

    #[test]
    fn put_overwrites() {
        let mut store = KnownSubmissions::new();
        store.put("A", sub("A", "one"));
        store.put("A", sub("A", "two"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("A").unwrap().title, "two");
    }

    #[test]
    fn seed_loads_all_entries() {
        let mut store = KnownSubmissions::new();
        let n = store.seed(vec![sub("B", "b"), sub("A", "a")]);
        assert_eq!(n, 2);
        assert!(store.contains("A"));
        assert!(store.contains("B"));
    }

    #[test]
    fn snapshot_is_ordered_by_code() {
        let mut store = KnownSubmissions::new();
        store.seed(vec![sub("C", "c"), sub("A", "a"), sub("B", "b")]);
        let codes: Vec<String> = store.snapshot().into_iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }

    #[test]
    fn get_missing_is_none() {
        assert!(KnownSubmissions::new().get("nope").is_none());
    }
}
