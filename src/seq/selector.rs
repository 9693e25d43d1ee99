//! Composable feature selectors.
//!
//! Commands let users pick features with expressions of the form
//! `key[/qualifier[=regexp]]...`: a feature key, optionally followed by
//! qualifier constraints. An empty key matches every feature, so
//! `/product=kinase` selects by qualifier alone. Selectors compose with
//! [`Selector::and`], [`Selector::or`] and [`Selector::not`].

use regex::Regex;

use crate::error::{GtsError, Result};
use crate::seq::feature::{Feature, SOURCE_KEY};

/// A predicate over features.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Matches every feature
    Any,
    /// Matches features with the given key
    Key(String),
    /// Matches features carrying the named qualifier, optionally requiring
    /// one of its values to match the pattern
    Qualifier {
        /// Qualifier name that must be present
        name: String,
        /// Pattern at least one value must match, if given
        pattern: Option<Regex>,
    },
    /// Matches when every inner selector matches
    And(Vec<Selector>),
    /// Matches when any inner selector matches
    Or(Vec<Selector>),
    /// Matches when the inner selector does not
    Not(Box<Selector>),
}

impl Selector {
    /// Selector for the `source` key.
    pub fn source() -> Selector {
        Selector::Key(SOURCE_KEY.to_string())
    }

    /// Both `self` and `other` must match.
    pub fn and(self, other: Selector) -> Selector {
        Selector::And(vec![self, other])
    }

    /// Either `self` or `other` must match.
    pub fn or(self, other: Selector) -> Selector {
        Selector::Or(vec![self, other])
    }

    /// Invert the selector.
    pub fn not(self) -> Selector {
        Selector::Not(Box::new(self))
    }

    /// Test the selector against a feature.
    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            Selector::Any => true,
            Selector::Key(key) => feature.key == *key,
            Selector::Qualifier { name, pattern } => {
                let values = feature.qualifiers.values(name);
                match pattern {
                    None => !values.is_empty(),
                    Some(re) => values.iter().any(|value| re.is_match(value)),
                }
            }
            Selector::And(inner) => inner.iter().all(|sel| sel.matches(feature)),
            Selector::Or(inner) => inner.iter().any(|sel| sel.matches(feature)),
            Selector::Not(inner) => !inner.matches(feature),
        }
    }

    /// Parse a `key[/qualifier[=regexp]]...` expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use gts::seq::Selector;
    ///
    /// let sel = Selector::parse("CDS/product=polymerase")?;
    /// let any_gene = Selector::parse("/gene")?;
    /// # Ok::<(), gts::GtsError>(())
    /// ```
    pub fn parse(expr: &str) -> Result<Selector> {
        if expr.is_empty() {
            return Err(GtsError::InvalidSelector {
                expr: expr.to_string(),
                msg: "expression is empty".to_string(),
            });
        }

        let mut parts = expr.split('/');
        let key = parts.next().unwrap_or_default();
        let mut selectors = Vec::new();
        if !key.is_empty() {
            selectors.push(Selector::Key(key.to_string()));
        }

        for part in parts {
            let (name, pattern) = match part.split_once('=') {
                Some((name, pattern)) => {
                    let re = Regex::new(pattern).map_err(|err| GtsError::InvalidSelector {
                        expr: expr.to_string(),
                        msg: err.to_string(),
                    })?;
                    (name, Some(re))
                }
                None => (part, None),
            };
            if name.is_empty() {
                return Err(GtsError::InvalidSelector {
                    expr: expr.to_string(),
                    msg: "qualifier name is empty".to_string(),
                });
            }
            selectors.push(Selector::Qualifier {
                name: name.to_string(),
                pattern,
            });
        }

        Ok(match selectors.len() {
            0 => Selector::Any,
            1 => selectors.pop().unwrap(),
            _ => Selector::And(selectors),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::qualifiers::Qualifiers;

    fn cds() -> Feature {
        let mut qualifiers = Qualifiers::new();
        qualifiers.add("gene", "polA");
        qualifiers.add("product", "DNA polymerase I");
        Feature::new("CDS", "1..30".parse().unwrap(), qualifiers)
    }

    #[test]
    fn test_key_selector() {
        assert!(Selector::parse("CDS").unwrap().matches(&cds()));
        assert!(!Selector::parse("gene").unwrap().matches(&cds()));
    }

    #[test]
    fn test_qualifier_presence_and_pattern() {
        assert!(Selector::parse("/gene").unwrap().matches(&cds()));
        assert!(!Selector::parse("/pseudo").unwrap().matches(&cds()));
        assert!(Selector::parse("CDS/product=polymerase")
            .unwrap()
            .matches(&cds()));
        assert!(!Selector::parse("CDS/product=kinase")
            .unwrap()
            .matches(&cds()));
    }

    #[test]
    fn test_combinators() {
        let sel = Selector::source().or(Selector::parse("CDS").unwrap());
        assert!(sel.matches(&cds()));
        assert!(!sel.clone().not().matches(&cds()));
        assert!(sel
            .and(Selector::parse("/gene=polA").unwrap())
            .matches(&cds()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("CDS//x").is_err());
        assert!(Selector::parse("CDS/gene=[").is_err());
    }
}
