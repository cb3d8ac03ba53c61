use std::fmt::{self, Display, Write};

const PADDING: usize = 3;

pub struct Column<T> {
    header: &'static str,
    value: fn(&T) -> String,
}

/// Renders rows as left-aligned columns sized to their widest cell.
pub struct Table<'a, T> {
    cols: Vec<Column<T>>,
    rows: &'a [T],
}

impl<T> Column<T> {
    pub fn new(header: &'static str, value: fn(&T) -> String) -> Column<T> {
        Column { header, value }
    }

    fn width(&self, rows: &[T]) -> usize {
        rows.iter()
            .map(|row| (self.value)(row).chars().count())
            .fold(self.header.len(), usize::max)
            + PADDING
    }
}

impl<'a, T> Table<'a, T> {
    pub fn new(cols: Vec<Column<T>>, rows: &'a [T]) -> Self {
        Self { cols, rows }
    }

    fn write_line<'c>(
        &self,
        f: &mut fmt::Formatter<'_>,
        widths: &[usize],
        cells: impl Iterator<Item = std::borrow::Cow<'c, str>>,
    ) -> fmt::Result {
        let last = widths.len().saturating_sub(1);
        for (i, (cell, width)) in cells.zip(widths).enumerate() {
            // The last column isn't padded so lines carry no trailing whitespace.
            if i == last {
                f.write_str(&cell)?;
            } else {
                write!(f, "{:width$}", cell, width = *width)?;
            }
        }
        f.write_char('\n')
    }
}

impl<T> Display for Table<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self
            .cols
            .iter()
            .map(|col| col.width(self.rows))
            .collect::<Vec<_>>();

        self.write_line(f, &widths, self.cols.iter().map(|c| c.header.into()))?;
        for row in self.rows {
            self.write_line(
                f,
                &widths,
                self.cols.iter().map(|c| (c.value)(row).into()),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_fit_widest_cell() {
        let rows = vec![
            ("default".to_string(), "web".to_string()),
            ("kube-system".to_string(), "dns".to_string()),
        ];
        let table = Table::new(
            vec![
                Column::new("NAMESPACE", |r: &(String, String)| r.0.clone()),
                Column::new("NAME", |r: &(String, String)| r.1.clone()),
            ],
            &rows,
        );

        assert_eq!(
            table.to_string(),
            "NAMESPACE     NAME\n\
             default       web\n\
             kube-system   dns\n"
        );
    }

    #[test]
    fn empty_table_prints_headers() {
        let rows: Vec<u16> = vec![];
        let table = Table::new(
            vec![
                Column::new("PORT", |p: &u16| p.to_string()),
                Column::new("URL", |_: &u16| String::new()),
            ],
            &rows,
        );
        assert_eq!(table.to_string(), "PORT   URL\n");
    }
}
