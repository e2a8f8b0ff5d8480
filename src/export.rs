use std::io::Write;

use crate::data::model::MovieRecord;

/// Write records as CSV. The header comes from the first record's column
/// order; nulls become empty cells. Nothing is written for an empty list.
pub fn write_csv<W: Write>(records: &[MovieRecord], out: W) -> Result<(), csv::Error> {
    let Some(first) = records.first() else {
        log::warn!("No records to export");
        return Ok(());
    };

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(first.fields.iter().map(|(name, _)| name.as_str()))?;
    for record in records {
        writer.write_record(record.fields.iter().map(|(_, value)| value.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
