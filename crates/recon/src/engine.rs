use crate::model::{DeviceRecord, ReconSummary, Reconciliation, ReferenceIdSet, UnmatchedRecord};

/// Outcome of comparing a single record against the reference set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Matched,
    SkippedWithoutId,
    Unmatched,
}

/// Classify one record. Records without a usable `DeviceId` are never unmatched.
pub fn classify(record: &DeviceRecord, reference_ids: &ReferenceIdSet) -> Verdict {
    match record.device_key() {
        None => Verdict::SkippedWithoutId,
        Some(key) if reference_ids.contains(&key) => Verdict::Matched,
        Some(_) => Verdict::Unmatched,
    }
}

/// Records whose id is absent from `reference_ids`, projected and in input order.
pub fn find_unmatched<I>(records: I, reference_ids: &ReferenceIdSet) -> Reconciliation
where
    I: IntoIterator<Item = DeviceRecord>,
{
    let mut acc = Accumulator::default();
    for record in records {
        acc.push(record, reference_ids);
    }
    acc.finish()
}

/// Like [`find_unmatched`], but over a fallible stream. Stops at the first error.
pub fn try_find_unmatched<I, E>(records: I, reference_ids: &ReferenceIdSet) -> Result<Reconciliation, E>
where
    I: IntoIterator<Item = Result<DeviceRecord, E>>,
{
    let mut acc = Accumulator::default();
    for record in records {
        acc.push(record?, reference_ids);
    }
    Ok(acc.finish())
}

#[derive(Default)]
struct Accumulator {
    unmatched: Vec<UnmatchedRecord>,
    summary: ReconSummary,
}

impl Accumulator {
    fn push(&mut self, record: DeviceRecord, reference_ids: &ReferenceIdSet) {
        self.summary.total_records += 1;
        match classify(&record, reference_ids) {
            Verdict::Matched => self.summary.matched += 1,
            Verdict::SkippedWithoutId => self.summary.skipped_without_id += 1,
            Verdict::Unmatched => {
                self.summary.unmatched += 1;
                self.unmatched.push(record.into());
            }
        }
    }

    fn finish(self) -> Reconciliation {
        log::info!(
            "reconciled {} records: {} matched, {} without id, {} unmatched",
            self.summary.total_records,
            self.summary.matched,
            self.summary.skipped_without_id,
            self.summary.unmatched,
        );
        Reconciliation {
            unmatched: self.unmatched,
            summary: self.summary,
        }
    }
}
