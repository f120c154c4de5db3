//! Sanctions screening.
//!
//! The screener never refreshes its own data: it holds an immutable
//! snapshot supplied by the external list loader. Matching sits
//! behind the NameMatcher trait so a stricter matcher can replace
//! exact equality without touching the engine.

use crate::{
    clock::Clock,
    types::{AmlFlag, Customer, SanctionScreening, Transaction},
};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Immutable snapshot of the three sanctions sets. Entries are
/// normalized (trimmed, uppercased) once at construction so lookups
/// never re-normalize the lists.
#[derive(Debug, Clone, Default)]
pub struct SanctionLists {
    individuals: HashSet<String>,
    entities: HashSet<String>,
    countries: HashSet<String>,
}

#[derive(Debug, Deserialize)]
struct SanctionListsFile {
    individuals: Vec<String>,
    entities: Vec<String>,
    countries: Vec<String>,
}

impl SanctionLists {
    pub fn new<I, E, C>(individuals: I, entities: E, countries: C) -> Self
    where
        I: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
        C: IntoIterator<Item = String>,
    {
        Self {
            individuals: individuals.into_iter().map(|n| normalize(&n)).collect(),
            entities: entities.into_iter().map(|n| normalize(&n)).collect(),
            countries: countries.into_iter().map(|c| normalize(&c)).collect(),
        }
    }

    /// Load a snapshot produced by the external list loader.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: SanctionListsFile = serde_json::from_str(&content)?;
        Ok(Self::new(file.individuals, file.entities, file.countries))
    }

    pub fn individuals(&self) -> &HashSet<String> {
        &self.individuals
    }

    pub fn entities(&self) -> &HashSet<String> {
        &self.entities
    }

    pub fn is_high_risk_country(&self, code: &str) -> bool {
        self.countries.contains(&normalize(code))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Capability interface for list matching. The shipped implementation
/// is case-normalized exact equality; fuzzy/phonetic matchers slot in
/// here without changing screening semantics elsewhere.
pub trait NameMatcher: Send + Sync {
    fn matches(&self, candidate: &str, list: &HashSet<String>) -> bool;
}

pub struct ExactNameMatcher;

impl NameMatcher for ExactNameMatcher {
    fn matches(&self, candidate: &str, list: &HashSet<String>) -> bool {
        list.contains(&normalize(candidate))
    }
}

pub struct SanctionScreener {
    lists: Arc<SanctionLists>,
    matcher: Arc<dyn NameMatcher>,
}

impl SanctionScreener {
    pub fn new(lists: Arc<SanctionLists>) -> Self {
        Self {
            lists,
            matcher: Arc::new(ExactNameMatcher),
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn NameMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Screen one transaction. Read-only: raises SanctionHit for the
    /// customer name or counterparty name, HighRiskCountry for the
    /// customer's nationality.
    pub fn screen(
        &self,
        transaction: &Transaction,
        customer: &Customer,
        clock: &dyn Clock,
    ) -> SanctionScreening {
        let mut flags = BTreeSet::new();

        if self
            .matcher
            .matches(&customer.screening_name(), self.lists.individuals())
        {
            flags.insert(AmlFlag::SanctionHit);
        }

        if let Some(counterparty) = &transaction.counterparty {
            if self.matcher.matches(&counterparty.name, self.lists.individuals())
                || self.matcher.matches(&counterparty.name, self.lists.entities())
            {
                flags.insert(AmlFlag::SanctionHit);
            }
        }

        if self
            .lists
            .is_high_risk_country(&customer.personal_info.nationality)
        {
            flags.insert(AmlFlag::HighRiskCountry);
        }

        SanctionScreening {
            hit: !flags.is_empty(),
            flags,
            screened_at: clock.now(),
        }
    }
}
