use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::summary::{join_fields, Accessionable};
use crate::types::{Accession, EntityKind, TaxonId};

/// A contributor's original variant record ("ss").
///
/// `clustered_variant_accession` is the back-reference to the owning cluster. It is
/// filled in by clustering and is not part of the identity hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedVariant {
    #[serde(rename = "asm")]
    pub assembly_accession: String,
    #[serde(rename = "tax")]
    pub taxonomy: TaxonId,
    #[serde(rename = "study")]
    pub project_accession: String,
    pub contig: String,
    pub start: u64,
    #[serde(rename = "ref")]
    pub reference_allele: String,
    #[serde(rename = "alt")]
    pub alternate_allele: String,
    #[serde(rename = "rs", default, skip_serializing_if = "Option::is_none")]
    pub clustered_variant_accession: Option<Accession>,
    #[serde(default)]
    pub validated: bool,
    #[serde(rename = "createdDate", default = "Utc::now")]
    pub created_date: DateTime<Utc>,
}

impl SubmittedVariant {
    pub fn new(
        assembly_accession: impl Into<String>,
        taxonomy: u32,
        project_accession: impl Into<String>,
        contig: impl Into<String>,
        start: u64,
        reference_allele: impl Into<String>,
        alternate_allele: impl Into<String>,
    ) -> Self {
        Self {
            assembly_accession: assembly_accession.into(),
            taxonomy: TaxonId(taxonomy),
            project_accession: project_accession.into(),
            contig: contig.into(),
            start,
            reference_allele: reference_allele.into(),
            alternate_allele: alternate_allele.into(),
            clustered_variant_accession: None,
            validated: false,
            created_date: Utc::now(),
        }
    }

    pub fn with_clustered_variant(mut self, accession: Accession) -> Self {
        self.clustered_variant_accession = Some(accession);
        self
    }

    pub fn with_validated(mut self, validated: bool) -> Self {
        self.validated = validated;
        self
    }

    pub fn with_created_date(mut self, created_date: DateTime<Utc>) -> Self {
        self.created_date = created_date;
        self
    }
}

impl PartialEq for SubmittedVariant {
    fn eq(&self, other: &Self) -> bool {
        self.assembly_accession == other.assembly_accession
            && self.taxonomy == other.taxonomy
            && self.contig == other.contig
            && self.start == other.start
            && self.reference_allele == other.reference_allele
            && self.alternate_allele == other.alternate_allele
            && self.project_accession == other.project_accession
    }
}

impl Eq for SubmittedVariant {}

impl Accessionable for SubmittedVariant {
    const KIND: EntityKind = EntityKind::SubmittedVariant;

    fn summary(&self) -> String {
        join_fields(&[
            &self.assembly_accession,
            &self.taxonomy,
            &self.contig,
            &self.start,
            &self.reference_allele,
            &self.alternate_allele,
            &self.project_accession,
        ])
    }
}
