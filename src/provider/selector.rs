//! Pure provider filtering and ordering.

use super::Provider;
use crate::core::Priority;

/// Filters to providers with priority at or above `minimum`, sorted
/// descending by priority. The sort is stable, so providers of equal
/// priority keep their relative input order.
pub fn select_by_minimum_priority(providers: &[Provider], minimum: Priority) -> Vec<&Provider> {
    let mut selected: Vec<&Provider> =
        providers.iter().filter(|p| p.priority >= minimum).collect();
    selected.sort_by_key(|p| std::cmp::Reverse(p.priority));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_fixtures::provider;
    use std::path::Path;

    fn fixture(ids: &[(&str, Priority)]) -> Vec<Provider> {
        ids.iter().map(|(id, p)| provider(id, *p, Path::new("/tmp/home"))).collect()
    }

    #[test]
    fn test_filters_below_minimum() {
        let providers = fixture(&[
            ("a", Priority::Low),
            ("b", Priority::Medium),
            ("c", Priority::High),
        ]);
        let selected = select_by_minimum_priority(&providers, Priority::Medium);
        let ids: Vec<&str> = selected.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_sort_is_stable_within_tier() {
        let providers = fixture(&[
            ("first-medium", Priority::Medium),
            ("high", Priority::High),
            ("second-medium", Priority::Medium),
        ]);
        let selected = select_by_minimum_priority(&providers, Priority::Low);
        let ids: Vec<&str> = selected.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "first-medium", "second-medium"]);
    }

    #[test]
    fn test_low_minimum_keeps_everything() {
        let providers = fixture(&[("a", Priority::Low), ("b", Priority::High)]);
        assert_eq!(select_by_minimum_priority(&providers, Priority::Low).len(), 2);
    }
}
