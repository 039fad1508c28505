use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SubmittedVariant;
use crate::summary::{join_fields, Accessionable};
use crate::types::{EntityKind, TaxonId, VariantType};
use crate::VarAccResult;

/// A de-duplicated, position and type level variant cluster ("rs").
///
/// Two clusters are the same variant when assembly, taxonomy, contig, start and type
/// match. `validated` and `created_date` are carried along but do not take part in
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteredVariant {
    #[serde(rename = "asm")]
    pub assembly_accession: String,
    #[serde(rename = "tax")]
    pub taxonomy: TaxonId,
    pub contig: String,
    pub start: u64,
    #[serde(rename = "type")]
    pub variant_type: VariantType,
    #[serde(default)]
    pub validated: bool,
    #[serde(rename = "createdDate", default = "Utc::now")]
    pub created_date: DateTime<Utc>,
}

impl ClusteredVariant {
    pub fn new(
        assembly_accession: impl Into<String>,
        taxonomy: u32,
        contig: impl Into<String>,
        start: u64,
        variant_type: VariantType,
    ) -> Self {
        Self {
            assembly_accession: assembly_accession.into(),
            taxonomy: TaxonId(taxonomy),
            contig: contig.into(),
            start,
            variant_type,
            validated: false,
            created_date: Utc::now(),
        }
    }

    pub fn with_validated(mut self, validated: bool) -> Self {
        self.validated = validated;
        self
    }

    pub fn with_created_date(mut self, created_date: DateTime<Utc>) -> Self {
        self.created_date = created_date;
        self
    }

    /// The cluster a submitted variant belongs to, typed from its alleles
    pub fn from_submitted(submitted: &SubmittedVariant) -> VarAccResult<Self> {
        let variant_type =
            VariantType::classify(&submitted.reference_allele, &submitted.alternate_allele)?;
        Ok(Self {
            assembly_accession: submitted.assembly_accession.clone(),
            taxonomy: submitted.taxonomy,
            contig: submitted.contig.clone(),
            start: submitted.start,
            variant_type,
            validated: submitted.validated,
            created_date: submitted.created_date,
        })
    }
}

impl PartialEq for ClusteredVariant {
    fn eq(&self, other: &Self) -> bool {
        self.assembly_accession == other.assembly_accession
            && self.taxonomy == other.taxonomy
            && self.contig == other.contig
            && self.start == other.start
            && self.variant_type == other.variant_type
    }
}

impl Eq for ClusteredVariant {}

impl Accessionable for ClusteredVariant {
    const KIND: EntityKind = EntityKind::ClusteredVariant;

    fn summary(&self) -> String {
        join_fields(&[
            &self.assembly_accession,
            &self.taxonomy,
            &self.contig,
            &self.start,
            &self.variant_type,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn variant() -> ClusteredVariant {
        ClusteredVariant::new("GCA_000001405.15", 9606, "1", 100, VariantType::Snv)
    }

    #[test]
    fn test_summary_format() {
        assert_eq!(variant().summary(), "GCA_000001405.15_9606_1_100_SNV");
    }

    #[test]
    fn test_identity_ignores_validated_and_date() {
        let a = variant();
        let b = variant()
            .with_validated(true)
            .with_created_date(Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_type_changes_identity() {
        let mut other = variant();
        other.variant_type = VariantType::Ins;
        assert_ne!(variant(), other);
        assert_ne!(variant().content_hash(), other.content_hash());
    }

    #[test]
    fn test_from_submitted_derives_type() {
        let submitted = SubmittedVariant::new("GCA_1", 3880, "PRJEB1", "chr2", 50, "A", "");
        let clustered = ClusteredVariant::from_submitted(&submitted).unwrap();
        assert_eq!(clustered.variant_type, VariantType::Del);
        assert_eq!(clustered.contig, "chr2");
        assert_eq!(clustered.start, 50);
    }
}
