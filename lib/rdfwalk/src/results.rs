//! Plain text rendering of SPARQL solutions.

use oxigraph::model::{NamedNodeRef, Term};
use oxigraph::sparql::{QuerySolution, Variable};
use std::io::{self, Write};

/// An ordered set of IRI prefixes used to abbreviate IRIs when printing.
#[derive(Debug, Clone, Default)]
pub struct Prefixes {
    entries: Vec<(String, String)>,
}

impl Prefixes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prefix. Later prefixes take precedence when several namespaces match.
    #[must_use]
    pub fn with_prefix(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.entries.push((name.into(), namespace.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, namespace)| (name.as_str(), namespace.as_str()))
    }

    /// Writes the IRI as `prefix:local` if a prefix namespace matches and the remaining part is a simple local name.
    pub fn abbreviate(&self, iri: NamedNodeRef<'_>) -> Option<String> {
        self.entries.iter().rev().find_map(|(name, namespace)| {
            let local = iri.as_str().strip_prefix(namespace.as_str())?;
            is_simple_local_name(local).then(|| format!("{name}:{local}"))
        })
    }

    /// Renders a term the way it is displayed in result tables.
    pub fn render(&self, term: &Term) -> String {
        match term {
            Term::NamedNode(node) => self
                .abbreviate(node.as_ref())
                .unwrap_or_else(|| node.to_string()),
            _ => term.to_string(),
        }
    }
}

/// The fully read solutions of a SELECT query.
#[derive(Debug, Default)]
pub struct Solutions {
    pub variables: Vec<Variable>,
    pub solutions: Vec<QuerySolution>,
}

impl Solutions {
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuerySolution> {
        self.solutions.iter()
    }

    /// Orders the columns by the first appearance of each variable in the query text.
    ///
    /// Engines are free to list the variables of a `SELECT *` in any order.
    /// Variables not found in the text keep their relative order after the others.
    #[must_use]
    pub fn in_query_order(mut self, query: &str) -> Self {
        let names = variable_names_in_order(query);
        self.variables.sort_by_key(|variable| {
            names
                .iter()
                .position(|name| *name == variable.as_str())
                .unwrap_or(usize::MAX)
        });
        self
    }

    /// Writes the solutions with [`write_table`].
    pub fn write_table<W: Write>(&self, writer: W, prefixes: &Prefixes) -> io::Result<W> {
        write_table(writer, &self.variables, &self.solutions, prefixes)
    }
}

impl<'a> IntoIterator for &'a Solutions {
    type Item = &'a QuerySolution;
    type IntoIter = std::slice::Iter<'a, QuerySolution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.iter()
    }
}

/// The names of the `?var` and `$var` tokens of a SPARQL text, without duplicates.
///
/// IRIs, string literals and comments are skipped.
fn variable_names_in_order(query: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut chars = query.char_indices().peekable();
    while let Some((position, c)) = chars.next() {
        match c {
            '?' | '$' => {
                let start = position + 1;
                let mut end = start;
                while let Some((i, c)) = chars.next_if(|(_, c)| c.is_alphanumeric() || *c == '_') {
                    end = i + c.len_utf8();
                }
                let name = &query[start..end];
                if !name.is_empty() && !names.contains(&name) {
                    names.push(name);
                }
            }
            '"' | '\'' => {
                while let Some((_, next)) = chars.next() {
                    if next == '\\' {
                        chars.next();
                    } else if next == c {
                        break;
                    }
                }
            }
            '<' => {
                // An IRI has no whitespace, otherwise this is a comparison operator.
                let rest = &query[position + 1..];
                if let Some(end) = rest.find(|c: char| c == '>' || c.is_whitespace()) {
                    if rest[end..].starts_with('>') {
                        let iri_end = position + 1 + end;
                        while chars.next_if(|(i, _)| *i <= iri_end).is_some() {}
                    }
                }
            }
            '#' => while chars.next_if(|(_, c)| *c != '\n').is_some() {},
            _ => (),
        }
    }
    names
}

fn is_simple_local_name(local: &str) -> bool {
    !local.ends_with('.')
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Writes solutions as a text table:
///
/// ```text
/// ------------------------
/// | a         | b        |
/// ========================
/// | tr:London | tr:Paris |
/// ------------------------
/// ```
///
/// Unbound values are left empty.
pub fn write_table<W: Write>(
    mut writer: W,
    variables: &[Variable],
    solutions: &[QuerySolution],
    prefixes: &Prefixes,
) -> io::Result<W> {
    let rows = solutions
        .iter()
        .map(|solution| {
            variables
                .iter()
                .map(|variable| {
                    solution
                        .get(variable)
                        .map(|term| prefixes.render(term))
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let mut widths = variables
        .iter()
        .map(|variable| variable.as_str().chars().count())
        .collect::<Vec<_>>();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let line_width = widths.iter().map(|width| width + 3).sum::<usize>() + 1;

    writeln!(writer, "{}", "-".repeat(line_width))?;
    write_row(&mut writer, variables.iter().map(Variable::as_str), &widths)?;
    writeln!(writer, "{}", "=".repeat(line_width))?;
    for row in &rows {
        write_row(&mut writer, row.iter().map(String::as_str), &widths)?;
    }
    writeln!(writer, "{}", "-".repeat(line_width))?;
    Ok(writer)
}

fn write_row<'a>(
    writer: &mut impl Write,
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
) -> io::Result<()> {
    for (cell, width) in cells.zip(widths) {
        write!(writer, "| {cell:<width$} ")?;
    }
    writeln!(writer, "|")
}
