/// Variant classes and allele-based classification
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::{VarAccError, VarAccResult};

static TANDEM_REPEAT: OnceLock<Option<Regex>> = OnceLock::new();

fn is_tandem_repeat(allele: &str) -> bool {
    TANDEM_REPEAT
        .get_or_init(|| Regex::new(r"^\([ACGTN]+\)\d+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(allele))
}

/// Variant class derived from comparing reference and alternate alleles.
///
/// The upper-case names are part of the clustered-variant summary and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariantType {
    Snv,
    Mnv,
    Ins,
    Del,
    Indel,
    TandemRepeat,
    SequenceAlteration,
    NoSequenceAlteration,
}

impl VariantType {
    pub const ALL: [VariantType; 8] = [
        VariantType::Snv,
        VariantType::Mnv,
        VariantType::Ins,
        VariantType::Del,
        VariantType::Indel,
        VariantType::TandemRepeat,
        VariantType::SequenceAlteration,
        VariantType::NoSequenceAlteration,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            VariantType::Snv => "SNV",
            VariantType::Mnv => "MNV",
            VariantType::Ins => "INS",
            VariantType::Del => "DEL",
            VariantType::Indel => "INDEL",
            VariantType::TandemRepeat => "TANDEM_REPEAT",
            VariantType::SequenceAlteration => "SEQUENCE_ALTERATION",
            VariantType::NoSequenceAlteration => "NO_SEQUENCE_ALTERATION",
        }
    }

    /// Sequence Ontology term used for the `VC` annotation on release
    pub const fn sequence_ontology_accession(self) -> &'static str {
        match self {
            VariantType::Snv => "SO:0001483",
            VariantType::Mnv => "SO:0002007",
            VariantType::Ins => "SO:0000667",
            VariantType::Del => "SO:0000159",
            VariantType::Indel => "SO:1000032",
            VariantType::TandemRepeat => "SO:0000705",
            VariantType::SequenceAlteration => "SO:0001059",
            VariantType::NoSequenceAlteration => "SO:0002073",
        }
    }

    /// Classify a pair of alleles.
    ///
    /// `-` is read as an empty allele. Alleles are compared case-insensitively.
    pub fn classify(reference: &str, alternate: &str) -> VarAccResult<Self> {
        let reference = normalize_allele(reference);
        let alternate = normalize_allele(alternate);

        if reference == alternate {
            return Ok(VariantType::NoSequenceAlteration);
        }

        if is_tandem_repeat(&reference) || is_tandem_repeat(&alternate) {
            return Ok(VariantType::TandemRepeat);
        }
        if is_named(&reference) || is_named(&alternate) {
            return Ok(VariantType::SequenceAlteration);
        }

        for allele in [&reference, &alternate] {
            if let Some(bad) = allele.chars().find(|c| !matches!(c, 'A' | 'C' | 'G' | 'T' | 'N')) {
                return Err(VarAccError::InvalidInput(format!(
                    "Cannot classify alleles '{}'/'{}': unexpected character '{}'",
                    reference, alternate, bad
                )));
            }
        }

        let kind = match (reference.len(), alternate.len()) {
            (0, _) => VariantType::Ins,
            (_, 0) => VariantType::Del,
            (1, 1) => VariantType::Snv,
            (r, a) if r == a => VariantType::Mnv,
            _ => VariantType::Indel,
        };
        Ok(kind)
    }
}

fn normalize_allele(allele: &str) -> String {
    let trimmed = allele.trim();
    if trimmed == "-" {
        String::new()
    } else {
        trimmed.to_uppercase()
    }
}

fn is_named(allele: &str) -> bool {
    allele.contains(['(', ')', '[', ']', '<', '>'])
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantType {
    type Err = VarAccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VariantType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| VarAccError::InvalidInput(format!("Unknown variant type: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("A", "T", VariantType::Snv)]
    #[case("a", "g", VariantType::Snv)]
    #[case("AC", "GT", VariantType::Mnv)]
    #[case("", "T", VariantType::Ins)]
    #[case("-", "TTA", VariantType::Ins)]
    #[case("ACG", "", VariantType::Del)]
    #[case("AC", "T", VariantType::Indel)]
    #[case("A", "A", VariantType::NoSequenceAlteration)]
    #[case("(CA)12", "(CA)14", VariantType::TandemRepeat)]
    #[case("A", "(LARGEDELETION)", VariantType::SequenceAlteration)]
    #[case("A", "<DEL>", VariantType::SequenceAlteration)]
    fn test_classify(#[case] reference: &str, #[case] alternate: &str, #[case] expected: VariantType) {
        assert_eq!(VariantType::classify(reference, alternate).unwrap(), expected);
    }

    #[test]
    fn test_classify_rejects_unknown_bases() {
        let err = VariantType::classify("A", "X").unwrap_err();
        assert!(matches!(err, VarAccError::InvalidInput(_)));
    }

    #[test]
    fn test_name_roundtrip() {
        for kind in VariantType::ALL {
            assert_eq!(kind.as_str().parse::<VariantType>().unwrap(), kind);
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.as_str())
            );
        }
    }

    #[test]
    fn test_sequence_ontology_terms() {
        assert_eq!(VariantType::Snv.sequence_ontology_accession(), "SO:0001483");
        assert_eq!(VariantType::Del.sequence_ontology_accession(), "SO:0000159");
        assert_eq!(VariantType::Ins.sequence_ontology_accession(), "SO:0000667");
    }
}
