//! Page windows and page counts.
//!
//! A single status pages through its jobs ten at a time. The latest view is
//! a preview across every status: each status contributes at most one page,
//! and the view itself is always exactly one page.

use crate::board::models::{PageRange, Pagination};
use crate::status::{JobCounts, StatusFilter};

pub const PAGE_SIZE: u64 = 10;

/// Number of jobs the filter can show.
pub fn pagination_total(filter: StatusFilter, counts: &JobCounts) -> u64 {
    match filter {
        StatusFilter::Only(status) => counts.get(status),
        StatusFilter::Latest => filter
            .statuses()
            .iter()
            .map(|status| counts.get(*status).min(PAGE_SIZE))
            .sum(),
    }
}

/// Window to request from the backend and page count for `filter`.
///
/// `current_page` is 1-based; 0 is treated as 1.
pub fn compute_pagination(filter: StatusFilter, counts: &JobCounts, current_page: u64) -> Pagination {
    let total = pagination_total(filter, counts);

    let (page_count, start) = match filter {
        StatusFilter::Latest => (1, 0),
        StatusFilter::Only(_) => (
            total.div_ceil(PAGE_SIZE),
            current_page.max(1).saturating_sub(1).saturating_mul(PAGE_SIZE),
        ),
    };

    let start = usize::try_from(start).unwrap_or(usize::MAX);
    Pagination {
        page_count,
        range: PageRange {
            start,
            end: start.saturating_add(PAGE_SIZE as usize - 1),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::JobStatus;

    fn counts(values: [u64; 6]) -> JobCounts {
        JobStatus::ALL
            .into_iter()
            .zip(values)
            .fold(JobCounts::default(), |acc, (status, n)| acc.with(status, n))
    }

    #[test]
    fn single_status_pages_by_ten() {
        let counts = JobCounts::default().with(JobStatus::Failed, 25);
        let pagination = compute_pagination(JobStatus::Failed.into(), &counts, 2);

        assert_eq!(pagination.page_count, 3);
        assert_eq!(pagination.range, PageRange { start: 10, end: 19 });
    }

    #[test]
    fn page_count_rounds_up() {
        for (count, pages) in [(1, 1), (10, 1), (11, 2), (99, 10), (100, 10), (101, 11)] {
            let counts = JobCounts::default().with(JobStatus::Done, count);
            let pagination = compute_pagination(JobStatus::Done.into(), &counts, 1);
            assert_eq!(pagination.page_count, pages, "count {}", count);
        }
    }

    #[test]
    fn empty_status_has_no_pages_but_a_first_window() {
        let pagination =
            compute_pagination(JobStatus::Killed.into(), &JobCounts::default(), 1);

        assert_eq!(pagination.page_count, 0);
        assert_eq!(pagination.range, PageRange { start: 0, end: 9 });
    }

    #[test]
    fn latest_caps_each_status_at_one_page() {
        let counts = counts([1, 50, 0, 3, 0, 2]);

        assert_eq!(pagination_total(StatusFilter::Latest, &counts), 16);

        let pagination = compute_pagination(StatusFilter::Latest, &counts, 4);
        assert_eq!(pagination.page_count, 1);
        assert_eq!(pagination.range, PageRange { start: 0, end: 9 });
    }

    #[test]
    fn page_zero_is_the_first_page() {
        let counts = JobCounts::default().with(JobStatus::Pending, 5);
        let pagination = compute_pagination(JobStatus::Pending.into(), &counts, 0);
        assert_eq!(pagination.range.start, 0);
    }
}
