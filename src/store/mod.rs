// Phase 7: 永続化先（レコードの受け渡し口）

pub mod sqlite;

use crate::record::PatientRecord;

/// Destination for assembled records.
///
/// Implementations must write all four groups of a record or none of them,
/// and report a duplicate subject (`GaitError::DuplicateSubject`) separately
/// from a lock conflict (`GaitError::StoreConflict`).
pub trait RecordSink {
    fn insert_record(&mut self, record: &PatientRecord) -> crate::error::Result<()>;
}

/// In-memory sink used for dry runs: records are collected instead of stored.
impl RecordSink for Vec<PatientRecord> {
    fn insert_record(&mut self, record: &PatientRecord) -> crate::error::Result<()> {
        if self.iter().any(|r| r.subject_id == record.subject_id) {
            return Err(crate::error::GaitError::duplicate_subject(&record.subject_id));
        }
        self.push(record.clone());
        Ok(())
    }
}
