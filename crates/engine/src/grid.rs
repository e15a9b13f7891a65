//! Grid orchestrator: owns the cell arena, resolves formula references,
//! and drives synchronous reactive recomputation.
//!
//! Every mutation runs to completion on the caller's stack, including the
//! full dependent cascade. There is no queuing, batching or background
//! work; a host that allows concurrent edits must serialize them outside
//! the engine.

use std::collections::VecDeque;

use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::cell::{Cell, CellError};
use crate::cell_id::{self, CellId};
use crate::dep_graph::DepGraph;
use crate::events::{CellEvent, EventCallback, SubscriberId, Subscribers};
use crate::formula::eval::FormulaTree;

/// A fixed-size rectangular grid of cells with reactive recomputation.
pub struct Grid {
    cells: Vec<Cell>,
    rows: usize,
    cols: usize,
    deps: DepGraph,
    subscribers: Subscribers,
}

impl Grid {
    /// Create a grid with every cell unset.
    ///
    /// Cells are created once here and never destroyed individually.
    /// Width is capped at 26 so every column has a single-letter name.
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(cols <= 26, "grid width is limited to 26 columns (A-Z)");
        Self {
            cells: vec![Cell::default(); rows * cols],
            rows,
            cols,
            deps: DepGraph::new(),
            subscribers: Subscribers::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True if the id lies within the grid.
    pub fn contains(&self, id: CellId) -> bool {
        id.row < self.rows && id.col < self.cols
    }

    fn index(&self, id: CellId) -> usize {
        assert!(self.contains(id), "cell {} out of grid bounds", id);
        id.row * self.cols + id.col
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[self.index(id)]
    }

    /// Resolve an "A1"-style name to a cell id, if it names a cell inside
    /// this grid. Case-insensitive. This is the lookup a persistence
    /// collaborator uses.
    pub fn cell_id_by_name(&self, name: &str) -> Option<CellId> {
        cell_id::parse_name(name).filter(|id| self.contains(*id))
    }

    /// Iterate all cells with their ids, row-major.
    ///
    /// A serializer may skip every cell where `Cell::is_unset` holds.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> + '_ {
        self.cells.iter().enumerate().map(move |(i, cell)| {
            (CellId::new(i / self.cols, i % self.cols), cell)
        })
    }

    pub fn text(&self, id: CellId) -> &str {
        &self.cell(id).text
    }

    pub fn value(&self, id: CellId) -> &str {
        &self.cell(id).value
    }

    pub fn background_color(&self, id: CellId) -> u32 {
        self.cell(id).background_color
    }

    /// Set a cell's raw text and recompute it and every dependent.
    ///
    /// The edit itself always succeeds; evaluation failures end up as
    /// sentinel values in the affected cells. Bypasses command history;
    /// callers wanting undo wrap this in a `Command`.
    pub fn set_text(&mut self, id: CellId, text: &str) {
        let i = self.index(id);
        if self.cells[i].text == text {
            return;
        }
        debug!("set_text {} = {:?}", id, text);
        self.cells[i].text = text.to_string();
        self.recompute(id);
    }

    /// Set a cell's background color. Notifies observers; never triggers
    /// formula evaluation.
    pub fn set_background_color(&mut self, id: CellId, color: u32) {
        let i = self.index(id);
        if self.cells[i].background_color == color {
            return;
        }
        self.cells[i].background_color = color;
        self.subscribers.emit(CellEvent::ColorChanged(id));
    }

    /// Subscribe an observer to value/color change events.
    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriberId {
        self.subscribers.subscribe(callback)
    }

    /// Remove an observer. Returns false if the id was already gone.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Cells this cell's formula currently reads.
    pub fn depends_on(&self, id: CellId) -> Vec<CellId> {
        self.deps.precedents(id).collect()
    }

    /// Cells recomputed when this cell's value changes.
    pub fn dependents(&self, id: CellId) -> Vec<CellId> {
        self.deps.dependents(id).collect()
    }

    // =========================================================================
    // Recomputation
    // =========================================================================

    /// Re-derive a cell's value from its current text, then cascade.
    fn recompute(&mut self, id: CellId) {
        let text = self.cell(id).text.clone();
        let new_value = match text.strip_prefix('=') {
            Some(formula) => self.evaluate_formula(id, formula),
            None => {
                // Literal cell: value is the text verbatim, no references.
                self.deps.replace_edges(id, FxHashSet::default());
                text
            }
        };
        self.write_value(id, new_value);
    }

    /// Write a freshly computed value. If it differs from the previous
    /// value, notify observers and recompute every dependent on this same
    /// call stack. Unchanged values do not re-fire, which is what bounds
    /// the cascade.
    fn write_value(&mut self, id: CellId, new_value: String) {
        let i = self.index(id);
        if self.cells[i].value == new_value {
            return;
        }
        trace!("value {} = {:?}", id, new_value);
        self.cells[i].value = new_value;
        self.subscribers.emit(CellEvent::ValueChanged(id));

        let dependents: Vec<CellId> = self.deps.dependents(id).collect();
        for dependent in dependents {
            self.recompute(dependent);
        }
    }

    /// Parse, resolve and evaluate a formula (leading '=' stripped).
    /// Returns the string to store as the cell's value.
    fn evaluate_formula(&mut self, id: CellId, source: &str) -> String {
        let mut tree = match FormulaTree::parse(source) {
            Ok(tree) => tree,
            Err(err) => {
                debug!("parse failed at {}: {}", id, err);
                self.deps.replace_edges(id, FxHashSet::default());
                return CellError::Evaluation.as_str().to_string();
            }
        };

        // The subscriptions gathered while resolving, installed as the
        // cell's complete new outgoing edge set whether or not resolution
        // succeeds. A poisoned reference still lands here so a future
        // correction upstream un-poisons this cell.
        let mut subscriptions = FxHashSet::default();
        let outcome = self.resolve_references(id, &mut tree, &mut subscriptions);
        self.deps.replace_edges(id, subscriptions);

        match outcome {
            Err(sentinel) => sentinel.as_str().to_string(),
            Ok(()) => match tree.evaluate() {
                Ok(result) => format_value(result),
                Err(err) => {
                    debug!("evaluation failed at {}: {}", id, err);
                    CellError::Evaluation.as_str().to_string()
                }
            },
        }
    }

    /// Validate every referenced name and bind its value.
    ///
    /// Checks run per reference, in order: resolvable, not self, not
    /// already poisoned, not closing a cycle. The first failure aborts
    /// with the sentinel to store; no partial result survives.
    fn resolve_references(
        &self,
        id: CellId,
        tree: &mut FormulaTree,
        subscriptions: &mut FxHashSet<CellId>,
    ) -> Result<(), CellError> {
        for name in tree.variable_names() {
            let Some(referenced) = self.cell_id_by_name(&name) else {
                return Err(CellError::BadReference);
            };

            if referenced == id {
                return Err(CellError::SelfReference);
            }

            match self.cell(referenced).error() {
                Some(CellError::CircularReference) => {
                    // Inherit the circular state, but keep listening so the
                    // cycle being broken upstream re-triggers this cell.
                    subscriptions.insert(referenced);
                    return Err(CellError::CircularReference);
                }
                Some(CellError::BadReference) | Some(CellError::SelfReference) => {
                    subscriptions.insert(referenced);
                    return Err(CellError::ReferenceToInvalid);
                }
                // "reference to invalid" and evaluation-error values are
                // not inherited; they read as numeric zero below.
                _ => {}
            }

            if self.reaches_through_formulas(referenced, id) {
                return Err(CellError::CircularReference);
            }

            tree.set_variable(&name, self.cell(referenced).as_number());
            subscriptions.insert(referenced);
        }
        Ok(())
    }

    /// Breadth-first cycle search.
    ///
    /// Starts from the direct references of `from` and expands level by
    /// level through every cell whose text is a formula, re-parsing each
    /// formula as it goes. Duplicate enqueues are tolerated; the answer is
    /// boolean and the reachable population is finite as long as existing
    /// cells are cycle-free, which resolution guarantees edit by edit.
    fn reaches_through_formulas(&self, from: CellId, target: CellId) -> bool {
        let mut queue: VecDeque<CellId> = self.formula_references(from).into();

        while !queue.is_empty() {
            // Walk the current level in full before descending.
            let level = queue.len();
            for _ in 0..level {
                let Some(next) = queue.pop_front() else { break };
                if next == target {
                    return true;
                }
                queue.extend(self.formula_references(next));
            }
        }
        false
    }

    /// The resolvable cells referenced by `id`'s text, if it is a
    /// well-formed formula; empty otherwise.
    fn formula_references(&self, id: CellId) -> Vec<CellId> {
        let cell = self.cell(id);
        let Some(source) = cell.text.strip_prefix('=') else {
            return Vec::new();
        };
        let Ok(tree) = FormulaTree::parse(source) else {
            return Vec::new();
        };
        tree.variable_names()
            .into_iter()
            .filter_map(|name| self.cell_id_by_name(&name))
            .collect()
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

/// Stringify an evaluation result the way values are displayed:
/// integral floats without a trailing ".0".
fn format_value(n: f64) -> String {
    format!("{}", n)
}
