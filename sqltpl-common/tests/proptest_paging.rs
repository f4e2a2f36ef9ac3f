//! Property tests for page resolution.

use proptest::prelude::*;
use sqltpl_common::{effective_page, row_offset, total_pages};

proptest! {
    #[test]
    fn page_number_stays_in_range(
        requested in any::<i64>(),
        page_size in 1u64..10_000,
        total_count in 0u64..1_000_000,
    ) {
        let page = effective_page(requested, page_size, total_count);
        let last = total_pages(total_count, page_size);
        prop_assert!(page >= 1);
        prop_assert!(page <= last.max(1));
    }

    #[test]
    fn non_positive_requests_equal_first_page(
        requested in i64::MIN..=0,
        page_size in 1u64..10_000,
        total_count in 0u64..1_000_000,
    ) {
        prop_assert_eq!(
            effective_page(requested, page_size, total_count),
            effective_page(1, page_size, total_count)
        );
    }

    #[test]
    fn resolved_page_starts_inside_the_result(
        requested in any::<i64>(),
        page_size in 1u64..10_000,
        total_count in 1u64..1_000_000,
    ) {
        let page = effective_page(requested, page_size, total_count);
        prop_assert!(row_offset(page, page_size) < total_count);
    }
}
