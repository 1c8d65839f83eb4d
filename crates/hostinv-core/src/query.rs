//! Query execution over host record sequences

use tracing::trace;

use crate::error::FilterError;
use crate::expr::Filter;
use crate::record::HostRecord;

/// Lazily filter `records`, keeping source order
///
/// Without a filter every record passes through unchanged. The iterator
/// stops after the first evaluation error so that no further records are
/// produced once the result set is known to be incomplete.
pub fn select<I>(records: I, filter: Option<&Filter>) -> Select<'_, I::IntoIter>
where
    I: IntoIterator<Item = HostRecord>,
{
    Select {
        records: records.into_iter(),
        filter,
        failed: false,
    }
}

/// Collect the records matching `filter`
///
/// # Errors
/// Returns the first [`FilterError`] raised by evaluation; no partial
/// result is returned.
pub fn apply<I>(records: I, filter: Option<&Filter>) -> Result<Vec<HostRecord>, FilterError>
where
    I: IntoIterator<Item = HostRecord>,
{
    select(records, filter).collect()
}

/// Iterator returned by [`select`]
#[derive(Debug)]
pub struct Select<'f, I> {
    records: I,
    filter: Option<&'f Filter>,
    failed: bool,
}

impl<I> Iterator for Select<'_, I>
where
    I: Iterator<Item = HostRecord>,
{
    type Item = Result<HostRecord, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let Some(filter) = self.filter else {
            return self.records.next().map(Ok);
        };

        for record in self.records.by_ref() {
            match filter.matches(&record) {
                Ok(true) => return Some(Ok(record)),
                Ok(false) => trace!(host = %record.name, "filtered out"),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
