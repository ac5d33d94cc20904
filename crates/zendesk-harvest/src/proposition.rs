//! The user's cumulative filter.
//!
//! A [`Proposition`] is an ordered list of [`Atom`]s folded strictly left to
//! right: `A AND B OR C` means `(A AND B) OR C`, with no precedence, unlike
//! evaluation inside a single compiled expression.

use std::fmt;

use tracing::debug;
use zendesk_api_rs::models::Record;

/// Description rendered for an empty proposition.
pub const NO_FILTERS: &str = "(no filters)";

/// Description of the always-true atom.
pub const ALL_TICKETS: &str = "(all tickets)";

/// How an atom combines with everything before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    /// Combines the running result with the next atom's result.
    pub fn apply(self, lhs: bool, rhs: bool) -> bool {
        match self {
            Combinator::And => lhs && rhs,
            Combinator::Or => lhs || rhs,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => f.write_str("AND"),
            Combinator::Or => f.write_str("OR"),
        }
    }
}

impl std::str::FromStr for Combinator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Combinator::And),
            "OR" => Ok(Combinator::Or),
            _ => Err("Invalid logic. Choose AND or OR.".to_string()),
        }
    }
}

/// A per-record decision function.
pub trait RecordPredicate {
    fn matches(&self, record: &Record) -> bool;
}

impl<F> RecordPredicate for F
where
    F: Fn(&Record) -> bool,
{
    fn matches(&self, record: &Record) -> bool {
        self(record)
    }
}

/// One compiled field predicate with its description.
pub struct Atom {
    combinator: Option<Combinator>,
    description: String,
    predicate: Box<dyn RecordPredicate>,
}

impl Atom {
    /// Creates an atom without a combinator.
    pub fn new(description: impl Into<String>, predicate: impl RecordPredicate + 'static) -> Self {
        Self {
            combinator: None,
            description: description.into(),
            predicate: Box::new(predicate),
        }
    }

    /// An atom matching every record.
    pub fn always() -> Self {
        Self::new(ALL_TICKETS, |_: &Record| true)
    }

    /// The combinator joining this atom to the ones before it.
    ///
    /// `None` only for the first atom of a proposition.
    pub fn combinator(&self) -> Option<Combinator> {
        self.combinator
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluates this atom's predicate alone.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicate.matches(record)
    }

    fn with_combinator(mut self, combinator: Option<Combinator>) -> Self {
        self.combinator = combinator;
        self
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("combinator", &self.combinator)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// How a new atom folds into a non-empty proposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Discard the new atom.
    Keep,
    /// Replace the whole proposition with the new atom.
    Overwrite,
    /// Append the new atom with the given combinator.
    Add(Combinator),
}

/// What a merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The proposition was empty; the atom became its anchor.
    Anchored,
    Kept,
    Overwritten,
    Appended(Combinator),
}

/// Ordered atoms evaluated left to right.
///
/// An empty proposition matches every record.
#[derive(Debug, Default)]
pub struct Proposition {
    atoms: Vec<Atom>,
}

impl Proposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Folds a new atom in, asking `choose` how only when there is something
    /// to merge with.
    ///
    /// On an empty proposition the atom becomes the anchor and `choose` is
    /// never called. Errors from `choose` leave the proposition untouched.
    pub fn add_atom_with_merge<F, E>(&mut self, atom: Atom, choose: F) -> Result<MergeOutcome, E>
    where
        F: FnOnce(&Proposition) -> Result<MergeMode, E>,
    {
        if self.is_empty() {
            return Ok(self.merge(atom, MergeMode::Overwrite));
        }
        let mode = choose(self)?;
        Ok(self.merge(atom, mode))
    }

    /// Applies a merge decision directly.
    pub fn merge(&mut self, atom: Atom, mode: MergeMode) -> MergeOutcome {
        let was_empty = self.is_empty();
        let outcome = match mode {
            _ if was_empty => {
                self.atoms.push(atom.with_combinator(None));
                MergeOutcome::Anchored
            }
            MergeMode::Keep => MergeOutcome::Kept,
            MergeMode::Overwrite => {
                self.atoms.clear();
                self.atoms.push(atom.with_combinator(None));
                MergeOutcome::Overwritten
            }
            MergeMode::Add(combinator) => {
                self.atoms.push(atom.with_combinator(Some(combinator)));
                MergeOutcome::Appended(combinator)
            }
        };
        debug!(?outcome, proposition = %self, "merged filter");
        outcome
    }

    /// Removes every atom.
    pub fn clear(&mut self) {
        self.atoms.clear();
    }

    /// Evaluates the proposition against one record.
    pub fn matches(&self, record: &Record) -> bool {
        let Some((first, rest)) = self.atoms.split_first() else {
            return true;
        };
        rest.iter().fold(first.matches(record), |acc, atom| {
            // Only the anchor lacks a combinator; treat a stray one as OR.
            atom.combinator
                .unwrap_or(Combinator::Or)
                .apply(acc, atom.matches(record))
        })
    }

    /// Returns the records that match, in their original order.
    pub fn apply_filters(&self, records: Vec<Record>) -> Vec<Record> {
        if self.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((first, rest)) = self.atoms.split_first() else {
            return f.write_str(NO_FILTERS);
        };
        f.write_str(&first.description)?;
        for atom in rest {
            let combinator = atom.combinator.unwrap_or(Combinator::Or);
            write!(f, " {} {}", combinator, atom.description)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;

    fn constant(description: &str, value: bool) -> Atom {
        Atom::new(description, move |_: &Record| value)
    }

    fn record(id: u64) -> Record {
        Record::from_value(json!({"id": id})).unwrap()
    }

    fn add(p: &mut Proposition, atom: Atom, mode: MergeMode) -> MergeOutcome {
        p.add_atom_with_merge(atom, |_| Ok::<_, Infallible>(mode))
            .unwrap()
    }

    #[test]
    fn test_empty_proposition_matches_everything() {
        let p = Proposition::new();
        assert!(p.matches(&record(1)));
        assert_eq!(p.to_string(), "(no filters)");
        assert_eq!(p.apply_filters(vec![record(1), record(2)]).len(), 2);
    }

    #[test]
    fn test_identity_atom_matches_everything() {
        let mut p = Proposition::new();
        add(&mut p, Atom::always(), MergeMode::Keep);
        assert!(p.matches(&record(1)));
        assert_eq!(p.to_string(), "(all tickets)");
    }

    #[test]
    fn test_first_atom_anchors_without_asking() {
        let mut p = Proposition::new();
        let outcome = p
            .add_atom_with_merge(constant("(a)", true), |_| -> Result<MergeMode, String> {
                panic!("chooser must not be called on an empty proposition")
            })
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Anchored);
        assert_eq!(p.atoms()[0].combinator(), None);
    }

    #[test]
    fn test_left_to_right_fold() {
        let mut p = Proposition::new();
        add(&mut p, constant("(a)", true), MergeMode::Keep);
        add(&mut p, constant("(b)", false), MergeMode::Add(Combinator::And));
        add(&mut p, constant("(c)", true), MergeMode::Add(Combinator::Or));
        // (true AND false) OR true
        assert!(p.matches(&record(1)));
        assert_eq!(p.to_string(), "(a) AND (b) OR (c)");
    }

    #[test]
    fn test_fold_differs_from_precedence() {
        // Fold: (true OR false) AND false = false.
        // Precedence would read true OR (false AND false) = true.
        let mut p = Proposition::new();
        add(&mut p, constant("(a)", true), MergeMode::Keep);
        add(&mut p, constant("(b)", false), MergeMode::Add(Combinator::Or));
        add(&mut p, constant("(c)", false), MergeMode::Add(Combinator::And));
        assert!(!p.matches(&record(1)));
    }

    #[test]
    fn test_keep_leaves_proposition_unchanged() {
        let mut p = Proposition::new();
        add(&mut p, constant("(a)", true), MergeMode::Keep);
        let outcome = add(&mut p, constant("(b)", false), MergeMode::Keep);
        assert_eq!(outcome, MergeOutcome::Kept);
        assert_eq!(p.to_string(), "(a)");
    }

    #[test]
    fn test_overwrite_resets_to_single_anchor() {
        let mut p = Proposition::new();
        add(&mut p, constant("(a)", true), MergeMode::Keep);
        add(&mut p, constant("(b)", true), MergeMode::Add(Combinator::And));
        let outcome = add(&mut p, constant("(c)", false), MergeMode::Overwrite);
        assert_eq!(outcome, MergeOutcome::Overwritten);
        assert_eq!(p.len(), 1);
        assert_eq!(p.atoms()[0].combinator(), None);
        assert_eq!(p.to_string(), "(c)");
    }

    #[test]
    fn test_chooser_error_leaves_proposition_untouched() {
        let mut p = Proposition::new();
        add(&mut p, constant("(a)", true), MergeMode::Keep);
        let result = p.add_atom_with_merge(constant("(b)", true), |_| Err("cancelled"));
        assert_eq!(result, Err("cancelled"));
        assert_eq!(p.to_string(), "(a)");
    }

    #[test]
    fn test_chooser_sees_current_proposition() {
        let mut p = Proposition::new();
        add(&mut p, constant("(a)", true), MergeMode::Keep);
        p.add_atom_with_merge(constant("(b)", true), |current| {
            assert_eq!(current.len(), 1);
            Ok::<_, Infallible>(MergeMode::Add(Combinator::Or))
        })
        .unwrap();
        assert_eq!(p.to_string(), "(a) OR (b)");
    }

    #[test]
    fn test_apply_filters_preserves_order() {
        let mut p = Proposition::new();
        add(
            &mut p,
            Atom::new("(odd)", |r: &Record| {
                r.get("id").and_then(|v| v.as_u64()).is_some_and(|id| id % 2 == 1)
            }),
            MergeMode::Keep,
        );
        let kept = p.apply_filters((1..=6).map(record).collect());
        let ids: Vec<String> = kept.iter().map(|r| r.text("id")).collect();
        assert_eq!(ids, vec!["1", "3", "5"]);
    }

    #[test]
    fn test_combinator_parsing() {
        assert_eq!("and".parse::<Combinator>(), Ok(Combinator::And));
        assert_eq!(" Or ".parse::<Combinator>(), Ok(Combinator::Or));
        assert!("xor".parse::<Combinator>().is_err());
    }
}
