//! Well-known primitive datatypes
//!
//! Attributes reference datatypes by IRI. Generators look them up here to
//! pick a target-format primitive.

/// Base of the OFN primitive datatype vocabulary
pub const OFN_BASE: &str = "https://ofn.gov.cz/zdroj/základní-datové-typy/2020-07-01/";

/// A primitive datatype every generator understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownDatatype {
    Boolean,
    Date,
    Time,
    DateTime,
    Integer,
    Decimal,
    Url,
    String,
    /// Language-tagged text
    Text,
}

impl KnownDatatype {
    pub const ALL: [KnownDatatype; 9] = [
        Self::Boolean,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::Integer,
        Self::Decimal,
        Self::Url,
        Self::String,
        Self::Text,
    ];

    fn local_name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Date => "datum",
            Self::Time => "čas",
            Self::DateTime => "datum-a-čas",
            Self::Integer => "celé-číslo",
            Self::Decimal => "desetinné-číslo",
            Self::Url => "url",
            Self::String => "řetězec",
            Self::Text => "text",
        }
    }

    pub fn iri(&self) -> String {
        format!("{}{}", OFN_BASE, self.local_name())
    }

    pub fn from_iri(iri: &str) -> Option<Self> {
        let local = iri.strip_prefix(OFN_BASE)?;
        Self::ALL.into_iter().find(|datatype| datatype.local_name() == local)
    }

    /// English label used in documentation
    pub fn label(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "Date and time",
            Self::Integer => "Integer",
            Self::Decimal => "Decimal number",
            Self::Url => "URL",
            Self::String => "String",
            Self::Text => "Text",
        }
    }
}

/// True for IRIs in the OFN datatype vocabulary, known or not
pub fn is_datatype_iri(iri: &str) -> bool {
    iri.starts_with(OFN_BASE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iri_lookup() {
        for datatype in KnownDatatype::ALL {
            assert_eq!(KnownDatatype::from_iri(&datatype.iri()), Some(datatype));
        }
        assert_eq!(KnownDatatype::from_iri("http://example.com/string"), None);
        assert!(is_datatype_iri(&KnownDatatype::Text.iri()));
    }
}
