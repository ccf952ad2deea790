use crate::model::Table;

use super::Renderer;

/// Guard against absurd span attributes blowing up the grid.
const MAX_GRID_COLUMNS: usize = 512;

impl Renderer<'_> {
    /// Lay cells out on a rectangular grid. A spanning cell's content is
    /// repeated into every slot it covers, since pipe tables have no spans.
    fn grid(&mut self, table: &Table) -> Vec<Vec<String>> {
        let n_rows = table.rows.len();
        let mut grid: Vec<Vec<Option<String>>> = vec![Vec::new(); n_rows];

        for (r, row) in table.rows.iter().enumerate() {
            let mut col = 0usize;
            for cell in &row.cells {
                let text = self.flat_text(&cell.blocks);

                if let Some((_, addr_col)) = cell.address
                    && addr_col < MAX_GRID_COLUMNS
                    && grid[r].get(addr_col).is_none_or(|slot| slot.is_none())
                {
                    col = addr_col;
                }
                while grid[r].get(col).is_some_and(|slot| slot.is_some()) {
                    col += 1;
                }
                if col >= MAX_GRID_COLUMNS {
                    break;
                }

                let row_end = r + cell.row_span.clamp(1, n_rows - r);
                let col_end = col + cell.col_span.clamp(1, MAX_GRID_COLUMNS - col);
                for covered in &mut grid[r..row_end] {
                    if covered.len() < col_end {
                        covered.resize(col_end, None);
                    }
                    for slot in &mut covered[col..col_end] {
                        if slot.is_none() {
                            *slot = Some(text.clone());
                        }
                    }
                }
                col = col_end;
            }
        }

        let n_cols = grid.iter().map(|row| row.len()).max().unwrap_or(0);
        grid.into_iter()
            .map(|row| {
                let mut row: Vec<String> = row.into_iter().map(Option::unwrap_or_default).collect();
                row.resize(n_cols, String::new());
                row
            })
            .collect()
    }

    /// Pipe table; the first row doubles as the header row.
    pub(super) fn table(&mut self, table: &Table) -> String {
        let grid = self.grid(table);
        let n_cols = grid.first().map(|row| row.len()).unwrap_or(0);
        if n_cols == 0 {
            return String::new();
        }

        let mut lines = Vec::with_capacity(grid.len() + 1);
        lines.push(row_line(&grid[0]));
        lines.push(format!("|{}", " --- |".repeat(n_cols)));
        for row in &grid[1..] {
            lines.push(row_line(row));
        }
        lines.join("\n")
    }

    /// A table nested in a cell, flattened to one line of text.
    pub(super) fn table_as_text(&mut self, table: &Table) -> String {
        self.grid(table)
            .into_iter()
            .map(|row| {
                let mut cells: Vec<String> = row.into_iter().filter(|c| !c.is_empty()).collect();
                cells.dedup();
                cells.join(" ")
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn row_line(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}
