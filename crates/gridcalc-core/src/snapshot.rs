//! Snapshot and restore of modified cells
//!
//! [`Grid::modified_cells`] lists what a serializer needs to store. [`Grid::restore`] writes
//! records back, ordered so that no formula is written before the cells it reads.

use crate::cell::{CellAddress, Color};
use crate::error::{Error, Result};
use crate::grid::Grid;
use lazy_regex::regex;
use std::collections::BTreeMap;

/// One stored cell: its A1-style name, color and entered text
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRecord {
    pub name: String,
    pub color: Color,
    pub text: String,
}

impl CellRecord {
    /// Create a record
    pub fn new<N: Into<String>, T: Into<String>>(name: N, color: Color, text: T) -> Self {
        Self {
            name: name.into(),
            color,
            text: text.into(),
        }
    }

    /// Cells the record's formula reads; empty for plain text
    pub fn references(&self) -> Vec<CellAddress> {
        match self.text.strip_prefix('=') {
            Some(formula) => regex!(r"\b[A-Za-z][0-9]+\b")
                .find_iter(formula)
                .filter_map(|m| CellAddress::parse(m.as_str()).ok())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Order in which `records` can be written back
///
/// A record is ready once none of the cells its formula reads are still waiting to be
/// written; ready records are taken in list order, pass after pass. Self-references do not
/// hold a record back.
pub fn replay_order(records: &[CellRecord]) -> Result<Vec<usize>> {
    let addresses = records
        .iter()
        .map(|r| CellAddress::parse(&r.name))
        .collect::<Result<Vec<_>>>()?;
    let references: Vec<Vec<CellAddress>> = records.iter().map(CellRecord::references).collect();

    let mut waiting: BTreeMap<CellAddress, usize> = BTreeMap::new();
    for addr in &addresses {
        *waiting.entry(*addr).or_default() += 1;
    }

    let mut done = vec![false; records.len()];
    let mut order = Vec::with_capacity(records.len());
    while order.len() < records.len() {
        let before = order.len();

        for i in 0..records.len() {
            if done[i] {
                continue;
            }
            let pending = references[i]
                .iter()
                .filter(|r| **r != addresses[i] && waiting.contains_key(*r))
                .count();
            if pending > 0 {
                continue;
            }

            done[i] = true;
            order.push(i);
            if let Some(count) = waiting.get_mut(&addresses[i]) {
                *count -= 1;
                if *count == 0 {
                    waiting.remove(&addresses[i]);
                }
            }
        }

        if order.len() == before {
            let stuck = (0..records.len())
                .filter(|&i| !done[i])
                .map(|i| records[i].name.clone())
                .collect();
            return Err(Error::UnresolvableRestoreOrder(stuck));
        }
    }

    Ok(order)
}

impl Grid {
    /// Cells holding a value or a color, in row-major order
    pub fn modified_cells(&self) -> Vec<CellRecord> {
        self.cells()
            .filter(|cell| {
                (!cell.text().is_empty() && !cell.value().is_empty()) || cell.color().is_set()
            })
            .map(|cell| CellRecord::new(cell.name(), cell.color(), cell.text()))
            .collect()
    }

    /// Write records back, referenced cells first
    ///
    /// Fails without writing anything if the records cannot be ordered; otherwise the
    /// first failing write stops the restore.
    pub fn restore(&mut self, records: &[CellRecord]) -> Result<()> {
        let order = replay_order(records)?;
        log::debug!("restoring {} cell(s)", order.len());

        for i in order {
            let record = &records[i];
            let addr = CellAddress::parse(&record.name)?;
            self.set_text_at(addr.row, addr.col, record.text.clone())?;
            self.set_color_at(addr.row, addr.col, record.color)?;
        }
        Ok(())
    }
}
