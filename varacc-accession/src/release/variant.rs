/// Denormalized variant records produced for release
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use varacc_core::{Accession, Accessionable, ClusteredVariant, VariantType};

/// Sequence-ontology class of the variant
pub const VARIANT_CLASS_KEY: &str = "VC";
/// Validated flag of the clustered variant
pub const CLUSTERED_VARIANT_VALIDATED_KEY: &str = "RS_VALIDATED";
/// Identifier of the active variant a merged one now points to
pub const MERGED_INTO_KEY: &str = "A";

/// Allele placeholders used when no submitted variant supplies real alleles
pub const PLACEHOLDER_REFERENCE: &str = "ref";
pub const PLACEHOLDER_ALTERNATE: &str = "alt";

/// Annotations contributed by one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSourceEntry {
    #[serde(rename = "studyId", default, skip_serializing_if = "Option::is_none")]
    pub study_id: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl VariantSourceEntry {
    /// Annotation for one merge operation
    pub fn merged(
        study_id: Option<String>,
        variant_type: VariantType,
        validated: bool,
        merge_into: Accession,
    ) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            VARIANT_CLASS_KEY.to_string(),
            variant_type.sequence_ontology_accession().to_string(),
        );
        attributes.insert(
            CLUSTERED_VARIANT_VALIDATED_KEY.to_string(),
            validated.to_string(),
        );
        attributes.insert(
            MERGED_INTO_KEY.to_string(),
            ClusteredVariant::KIND.external_id(merge_into),
        );
        Self {
            study_id,
            attributes,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub contig: String,
    pub start: u64,
    pub end: u64,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "alt")]
    pub alternate: String,
    #[serde(rename = "mainId")]
    pub main_id: String,
    #[serde(rename = "sourceEntries")]
    pub source_entries: Vec<VariantSourceEntry>,
}

impl Variant {
    pub fn new(
        contig: impl Into<String>,
        start: u64,
        end: u64,
        reference: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Self {
        Self {
            contig: contig.into(),
            start,
            end,
            reference: reference.into(),
            alternate: alternate.into(),
            main_id: String::new(),
            source_entries: Vec::new(),
        }
    }

    pub fn with_main_id(mut self, main_id: impl Into<String>) -> Self {
        self.main_id = main_id.into();
        self
    }

    /// Records with the same key are the same output variant
    pub fn key(&self) -> String {
        variant_key(&self.contig, self.start, &self.reference, &self.alternate)
    }

    pub fn renormalize(&mut self, start: u64, end: u64, reference: String, alternate: String) {
        self.start = start;
        self.end = end;
        self.reference = reference;
        self.alternate = alternate;
    }
}

pub fn variant_key(contig: &str, start: u64, reference: &str, alternate: &str) -> String {
    format!("{}_{}_{}_{}", contig, start, reference, alternate).to_uppercase()
}

/// Last position covered by the alleles; placeholder alleles cover only `start`
pub fn end_position(start: u64, reference: &str, alternate: &str) -> u64 {
    if reference == PLACEHOLDER_REFERENCE && alternate == PLACEHOLDER_ALTERNATE {
        return start;
    }
    let length = reference.len().max(alternate.len()).max(1) as u64;
    start + length - 1
}
