//! Interactive filter menu.
//!
//! The operator picks a field, enters an expression (or a start and end for
//! range fields) and decides how it merges with the filters already set.
//! Invalid entries print the field's message and re-prompt; a blank entry
//! returns to the menu. "Proceed with Retrieval" freezes the proposition.

use std::io::{self, IsTerminal};

use dialoguer::{Input, Select};
use zendesk_harvest_rs::filter::{CatalogEntry, RangeField, RangeKind};
use zendesk_harvest_rs::{Atom, Combinator, FieldCatalog, MergeMode, MergeOutcome, Proposition};

use super::{prompt_error, Result};
use crate::output::format_proposition;

const MERGE_PROMPT: &str = "There is an existing filter. Choose: (a) add, (o) overwrite, (k) keep";
const COMBINE_PROMPT: &str = "Combine with existing filters using (AND/OR)";
const INVALID_CHOICE: &str = "Invalid choice. Enter a, o, or k.";

/// Line-oriented operator I/O.
pub trait Prompt {
    /// Reads one line of text. Blank input is allowed.
    fn input(&mut self, prompt: &str) -> Result<String>;

    /// Picks one of `items`, returning its index.
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<usize>;

    /// Shows a line of feedback.
    fn say(&mut self, line: &str);
}

/// [`Prompt`] backed by the terminal.
pub struct TerminalPrompt;

impl TerminalPrompt {
    /// Returns a terminal prompt when stdin is interactive.
    pub fn detect() -> Option<Self> {
        io::stdin().is_terminal().then_some(TerminalPrompt)
    }
}

impl Prompt for TerminalPrompt {
    fn input(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    fn select(&mut self, prompt: &str, items: &[String]) -> Result<usize> {
        Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()
            .map_err(prompt_error)
    }

    fn say(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// What the operator chose to do after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Proceed,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Filter(usize),
    MatchAll,
    Clear,
    ShowProposition,
    Proceed,
    Exit,
}

/// An answer to the add/overwrite/keep question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeChoice {
    Add,
    Overwrite,
    Keep,
}

/// Parses `a`, `o` or `k` (any case, surrounding space ignored).
pub fn parse_merge_choice(input: &str) -> Option<MergeChoice> {
    match input.trim().to_lowercase().as_str() {
        "a" => Some(MergeChoice::Add),
        "o" => Some(MergeChoice::Overwrite),
        "k" => Some(MergeChoice::Keep),
        _ => None,
    }
}

fn menu_items(catalog: &FieldCatalog) -> Vec<(String, MenuAction)> {
    let mut items: Vec<(String, MenuAction)> = catalog
        .entries()
        .enumerate()
        .map(|(i, entry)| {
            let label = match entry {
                CatalogEntry::Range(range) => {
                    format!("{} (format {})", entry.label(), range.kind().format().0)
                }
                CatalogEntry::Expression(_) => entry.label().to_string(),
            };
            (label, MenuAction::Filter(i))
        })
        .collect();
    items.push(("Match All Tickets".to_string(), MenuAction::MatchAll));
    items.push(("Clear Filters".to_string(), MenuAction::Clear));
    items.push((
        "Show Current Filter Proposition".to_string(),
        MenuAction::ShowProposition,
    ));
    items.push(("Proceed with Retrieval".to_string(), MenuAction::Proceed));
    items.push(("Exit".to_string(), MenuAction::Exit));
    items
}

/// Runs the menu until the operator proceeds or exits.
pub fn run_menu(
    prompt: &mut dyn Prompt,
    catalog: &FieldCatalog,
    proposition: &mut Proposition,
    use_colors: bool,
) -> Result<MenuOutcome> {
    let items = menu_items(catalog);
    let labels: Vec<String> = items.iter().map(|(label, _)| label.clone()).collect();

    loop {
        let choice = prompt.select("Main Menu", &labels)?;
        let Some((_, action)) = items.get(choice) else {
            prompt.say("Invalid choice, please try again.");
            continue;
        };

        match *action {
            MenuAction::Filter(i) => {
                let Some(entry) = catalog.entries().nth(i) else {
                    continue;
                };
                if let Some(atom) = prompt_atom(prompt, entry)? {
                    merge_and_report(prompt, proposition, atom, use_colors)?;
                }
            }
            MenuAction::MatchAll => {
                merge_and_report(prompt, proposition, Atom::always(), use_colors)?;
            }
            MenuAction::Clear => {
                proposition.clear();
                prompt.say("Filters cleared.");
                prompt.say(&format_proposition(proposition, use_colors));
            }
            MenuAction::ShowProposition => {
                prompt.say(&format_proposition(proposition, use_colors));
            }
            MenuAction::Proceed => return Ok(MenuOutcome::Proceed),
            MenuAction::Exit => return Ok(MenuOutcome::Exit),
        }
    }
}

fn merge_and_report(
    prompt: &mut dyn Prompt,
    proposition: &mut Proposition,
    atom: Atom,
    use_colors: bool,
) -> Result<()> {
    let outcome = merge_atom(prompt, proposition, atom)?;
    prompt.say(match outcome {
        MergeOutcome::Kept => "Filter kept.",
        _ => "Filter set/updated.",
    });
    prompt.say(&format_proposition(proposition, use_colors));
    Ok(())
}

/// Prompts until the entry compiles. `None` when the operator enters nothing.
fn prompt_atom(prompt: &mut dyn Prompt, entry: CatalogEntry<'_>) -> Result<Option<Atom>> {
    match entry {
        CatalogEntry::Expression(field) => loop {
            let input = prompt.input(field.prompt())?;
            if input.trim().is_empty() {
                return Ok(None);
            }
            match field.compile(&input) {
                Ok(atom) => return Ok(Some(atom)),
                Err(e) => prompt.say(&e.to_string()),
            }
        },
        CatalogEntry::Range(range) => prompt_range(prompt, range),
    }
}

fn prompt_range(prompt: &mut dyn Prompt, range: &RangeField) -> Result<Option<Atom>> {
    let (format, _) = range.kind().format();
    let noun = match range.kind() {
        RangeKind::Date { .. } => "date",
        RangeKind::Time { .. } => "time",
        RangeKind::CustomDatetime { .. } => "datetime",
    };

    loop {
        let start = prompt.input(&format!("Start {} ({})", noun, format))?;
        if start.trim().is_empty() {
            return Ok(None);
        }
        let end = prompt.input(&format!("End {} ({})", noun, format))?;
        match range.compile(&start, &end) {
            Ok(atom) => return Ok(Some(atom)),
            Err(e) => prompt.say(&e.to_string()),
        }
    }
}

/// Merges `atom`, asking how only when filters already exist.
fn merge_atom(
    prompt: &mut dyn Prompt,
    proposition: &mut Proposition,
    atom: Atom,
) -> Result<MergeOutcome> {
    proposition.add_atom_with_merge(atom, |_| ask_merge_mode(prompt))
}

fn ask_merge_mode(prompt: &mut dyn Prompt) -> Result<MergeMode> {
    loop {
        match parse_merge_choice(&prompt.input(MERGE_PROMPT)?) {
            Some(MergeChoice::Add) => return ask_combinator(prompt).map(MergeMode::Add),
            Some(MergeChoice::Overwrite) => return Ok(MergeMode::Overwrite),
            Some(MergeChoice::Keep) => return Ok(MergeMode::Keep),
            None => prompt.say(INVALID_CHOICE),
        }
    }
}

fn ask_combinator(prompt: &mut dyn Prompt) -> Result<Combinator> {
    loop {
        match prompt.input(COMBINE_PROMPT)?.parse::<Combinator>() {
            Ok(combinator) => return Ok(combinator),
            Err(e) => prompt.say(&e.to_string()),
        }
    }
}
