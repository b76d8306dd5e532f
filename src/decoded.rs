use crate::annotation::{DilutionReading, RawClassification};
use crate::identity::{PlateIdentity, Study};
use crate::session::SessionMeta;

/// A classification with its parsed identity and decoded reading.
#[derive(Debug, Clone)]
pub struct DecodedClassification {
    pub raw: RawClassification,
    pub filename: Option<String>,
    pub identity: Option<PlateIdentity>,
    pub reading: DilutionReading,
    pub session: SessionMeta,
}

impl DecodedClassification {
    pub fn dilution_code(&self) -> i32 {
        self.reading.code()
    }

    pub fn study(&self) -> Study {
        Study::of(self.identity.as_ref())
    }
}
