//! Varbind row assembler (C3): turns the flat varbind list from one
//! GetResponse into per-column cells, tracking which columns are still
//! live so the engine knows what to walk next.
//!
//! Grounded directly in `original_source/fastsnmp/snmp_poller.py`'s main
//! loop, which cycles a `main_oids_positions` iterator over the varbind
//! list and checks `oid.startswith(main_oid + '.')` — the same prefix
//! check as [`crate::oid::Oid::is_strict_descendant_of`], just spelled as a
//! Rust-native method instead of a string operation.

use crate::message::Varbind;
use crate::oid::Oid;
use crate::value::Value;

/// One emitted table cell: the column it belongs to and the row index
/// carved out of its OID.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub main_oid: Oid,
    pub index_part: Oid,
    pub value: Value,
}

/// Per-column continuation state after one response has been assembled.
/// `Live` carries the last OID seen under that column, ready to be extended
/// with the walk's next varbind; `Finished` means the column hit a
/// terminator or walked outside its subtree and should not be polled again.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnState {
    Live(Oid),
    Finished,
}

/// The result of assembling one response: the cells to emit, and the next
/// `oids_to_poll` state per column (same length and order as `main_oids`).
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub cells: Vec<Cell>,
    pub next_columns: Vec<ColumnState>,
}

impl Assembled {
    /// True once every column has terminated — the walk is complete and no
    /// continuation request should be issued.
    pub fn walk_complete(&self) -> bool {
        self.next_columns
            .iter()
            .all(|c| matches!(c, ColumnState::Finished))
    }
}

/// Assemble one response's varbinds against `main_oids`, the table's fixed
/// column prefixes.
///
/// Implements §4.3's algorithm: cycle a column pointer over `main_oids`,
/// checking each varbind's OID against the *current* column by prefix (not
/// numeric comparison — a column that walked off the end of its subtree may
/// come back pointing at an OID that is lexicographically later but not a
/// descendant at all). The pointer only cycles through columns that are
/// still live; once every column is finished, scanning stops even if
/// varbinds remain (step 4). A response that runs out of varbinds mid-row
/// (step 5) just leaves the remaining columns untouched in `next_columns`,
/// carrying forward whatever was already live.
pub fn assemble(main_oids: &[Oid], varbinds: &[Varbind]) -> Assembled {
    let mut next_columns: Vec<ColumnState> = main_oids
        .iter()
        .map(|oid| ColumnState::Live(oid.clone()))
        .collect();
    let mut cells = Vec::new();

    if main_oids.is_empty() {
        return Assembled { cells, next_columns };
    }

    let mut column = 0usize;
    for varbind in varbinds {
        // Skip columns already finished earlier in this same response.
        while matches!(next_columns[column], ColumnState::Finished) {
            if next_columns.iter().all(|c| matches!(c, ColumnState::Finished)) {
                return Assembled { cells, next_columns };
            }
            column = (column + 1) % main_oids.len();
        }

        let main_oid = &main_oids[column];
        let is_descendant = varbind.oid.is_strict_descendant_of(main_oid);
        let finished = !is_descendant || varbind.value.ends_a_column();

        if finished {
            next_columns[column] = ColumnState::Finished;
        } else {
            let index_part = varbind.oid.suffix_after(main_oid);
            cells.push(Cell {
                main_oid: main_oid.clone(),
                index_part,
                value: varbind.value.clone(),
            });
            next_columns[column] = ColumnState::Live(varbind.oid.clone());
        }

        if next_columns.iter().all(|c| matches!(c, ColumnState::Finished)) {
            break;
        }
        column = (column + 1) % main_oids.len();
    }

    Assembled { cells, next_columns }
}

/// Build the next round's `oids-to-poll` and surviving `main_oids` from an
/// assembler result, per §4.3's continuation policy: `main_oids[p] + "." +
/// last_seen_index[p]` for each still-live column p, dropping finished
/// columns and their corresponding `main_oids` entry so indexes keep
/// re-aligning on retry.
pub fn next_request_oids(main_oids: &[Oid], next_columns: &[ColumnState]) -> (Vec<Oid>, Vec<Oid>) {
    let mut surviving_main_oids = Vec::new();
    let mut oids_to_poll = Vec::new();
    for (main_oid, state) in main_oids.iter().zip(next_columns) {
        if let ColumnState::Live(last_seen) = state {
            surviving_main_oids.push(main_oid.clone());
            oids_to_poll.push(last_seen.clone());
        }
    }
    (surviving_main_oids, oids_to_poll)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> Oid {
        s.parse().unwrap()
    }

    fn vb(oid_str: &str, counter: u32) -> Varbind {
        Varbind {
            oid: oid(oid_str),
            value: Value::Counter32(counter),
        }
    }

    #[test]
    fn scenario_3_all_columns_live_for_two_rows() {
        let main_oids = vec![oid("1.2.1"), oid("1.2.2"), oid("1.2.3")];
        let varbinds = vec![
            vb("1.2.1.1", 1),
            vb("1.2.2.1", 1),
            vb("1.2.3.1", 1),
            vb("1.2.1.2", 1),
            vb("1.2.2.2", 1),
            vb("1.2.3.2", 1),
        ];
        let assembled = assemble(&main_oids, &varbinds);
        assert_eq!(assembled.cells.len(), 6);
        let index_parts: Vec<String> = assembled
            .cells
            .iter()
            .map(|c| c.index_part.to_string())
            .collect();
        assert_eq!(index_parts, vec!["1", "1", "1", "2", "2", "2"]);

        let (surviving_main_oids, oids_to_poll) =
            next_request_oids(&main_oids, &assembled.next_columns);
        assert_eq!(surviving_main_oids, main_oids);
        let oids_to_poll: Vec<String> = oids_to_poll.iter().map(|o| o.to_string()).collect();
        assert_eq!(oids_to_poll, vec!["1.2.1.2", "1.2.2.2", "1.2.3.2"]);
        assert!(!assembled.walk_complete());
    }

    #[test]
    fn scenario_4_mixed_termination() {
        let main_oids = vec![oid("1.2.1"), oid("1.2.2"), oid("1.2.3")];
        let varbinds = vec![
            vb("1.2.1.1", 1),
            vb("1.2.2.1", 1),
            vb("1.2.3.1", 1),
            vb("1.2.999.1", 1), // column 0 walked into a different subtree
            vb("1.2.2.2", 1),
            vb("1.2.3.2", 1),
        ];
        let assembled = assemble(&main_oids, &varbinds);
        // Three full cells from row 1, plus two more from row 2 (column 0
        // is dead by then).
        assert_eq!(assembled.cells.len(), 5);

        assert_eq!(assembled.next_columns[0], ColumnState::Finished);
        assert_eq!(assembled.next_columns[1], ColumnState::Live(oid("1.2.2.2")));
        assert_eq!(assembled.next_columns[2], ColumnState::Live(oid("1.2.3.2")));

        let (surviving_main_oids, oids_to_poll) =
            next_request_oids(&main_oids, &assembled.next_columns);
        assert_eq!(surviving_main_oids, vec![oid("1.2.2"), oid("1.2.3")]);
        let oids_to_poll: Vec<String> = oids_to_poll.iter().map(|o| o.to_string()).collect();
        assert_eq!(oids_to_poll, vec!["1.2.2.2", "1.2.3.2"]);
    }

    #[test]
    fn end_of_mib_view_finishes_a_column() {
        let main_oids = vec![oid("1.2.1")];
        let varbinds = vec![Varbind {
            oid: oid("1.2.1.1"),
            value: Value::EndOfMibView,
        }];
        let assembled = assemble(&main_oids, &varbinds);
        assert!(assembled.cells.is_empty());
        assert!(assembled.walk_complete());
    }

    #[test]
    fn response_running_short_leaves_untouched_columns_live() {
        let main_oids = vec![oid("1.2.1"), oid("1.2.2"), oid("1.2.3")];
        // Only one varbind arrives for a three-column group.
        let varbinds = vec![vb("1.2.1.1", 1)];
        let assembled = assemble(&main_oids, &varbinds);
        assert_eq!(assembled.cells.len(), 1);
        assert_eq!(assembled.next_columns[0], ColumnState::Live(oid("1.2.1.1")));
        assert_eq!(assembled.next_columns[1], ColumnState::Live(oid("1.2.2")));
        assert_eq!(assembled.next_columns[2], ColumnState::Live(oid("1.2.3")));
    }

    #[test]
    fn single_column_walk_stays_live_after_an_ordinary_cell() {
        let main_oids = vec![oid("1.3.6.1.2.1.1.1")];
        let varbinds = vec![Varbind {
            oid: oid("1.3.6.1.2.1.1.1.0"),
            value: Value::OctetString(b"a router".to_vec()),
        }];
        let assembled = assemble(&main_oids, &varbinds);
        assert_eq!(assembled.cells.len(), 1);
        assert_eq!(assembled.cells[0].index_part.to_string(), "0");
        assert!(!assembled.walk_complete());
    }
}
