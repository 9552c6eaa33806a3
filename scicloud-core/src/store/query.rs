//! Query values and their evaluation over in-memory rows.

use std::cmp::Ordering;

use super::EventRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    OwnerId,
    Title,
    Description,
    EventDate,
    StartTime,
    EndTime,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Row predicates. Range filters compare the persisted text form, which
/// orders correctly for `YYYY-MM-DD` dates and `HH:MM` times.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(Column, String),
    Gte(Column, String),
    Lte(Column, String),
    /// Case-insensitive substring match on any of the columns
    ILike(Vec<Column>, String),
}

impl Filter {
    fn matches(&self, record: &EventRecord) -> bool {
        match self {
            Filter::Eq(col, value) => record.column(*col).as_deref() == Some(value.as_str()),
            Filter::Gte(col, value) => record.column(*col).is_some_and(|v| v.as_str() >= value.as_str()),
            Filter::Lte(col, value) => record.column(*col).is_some_and(|v| v.as_str() <= value.as_str()),
            Filter::ILike(cols, pattern) => {
                let needle = pattern.to_lowercase();
                cols.iter().any(|col| {
                    record
                        .column(*col)
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<(Column, Direction)>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: Column, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq(column, value.into()));
        self
    }

    pub fn gte(mut self, column: Column, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Gte(column, value.into()));
        self
    }

    pub fn lte(mut self, column: Column, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Lte(column, value.into()));
        self
    }

    pub fn ilike(mut self, columns: &[Column], pattern: impl Into<String>) -> Self {
        self.filters.push(Filter::ILike(columns.to_vec(), pattern.into()));
        self
    }

    pub fn order_by(mut self, column: Column, direction: Direction) -> Self {
        self.order.push((column, direction));
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Evaluate against rows given in insertion order.
    ///
    /// Sorting is stable, so exact ties keep insertion order. Missing values
    /// sort first in ascending order.
    pub fn run<'a>(&self, rows: impl IntoIterator<Item = &'a EventRecord>) -> Vec<EventRecord> {
        let mut matched: Vec<&EventRecord> = rows
            .into_iter()
            .filter(|r| self.filters.iter().all(|f| f.matches(r)))
            .collect();

        if !self.order.is_empty() {
            matched.sort_by(|a, b| self.compare(a, b));
        }

        matched
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    fn compare(&self, a: &EventRecord, b: &EventRecord) -> Ordering {
        for (col, direction) in &self.order {
            let ord = a.column(*col).cmp(&b.column(*col));
            let ord = match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::row;

    fn records() -> Vec<EventRecord> {
        vec![
            EventRecord::new("1".into(), row("ada", "Calibrate HPLC", "2024-07-10", Some("13:00"), Some("14:00"))),
            EventRecord::new("2".into(), row("ada", "Lab meeting", "2024-07-09", Some("09:00"), Some("10:00"))),
            EventRecord::new("3".into(), row("ada", "Safety training", "2024-07-10", Some("09:00"), Some("09:30"))),
            EventRecord::new("4".into(), row("bob", "Centrifuge service", "2024-07-10", None, None)),
            EventRecord::new("5".into(), row("ada", "Second standup", "2024-07-10", Some("09:00"), Some("09:15"))),
        ]
    }

    fn ids(records: &[EventRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_eq_and_range_filters() {
        let rows = records();
        let query = Query::new()
            .eq(Column::OwnerId, "ada")
            .gte(Column::EventDate, "2024-07-10")
            .lte(Column::EventDate, "2024-07-10");
        assert_eq!(ids(&query.run(&rows)), vec!["1", "3", "5"]);
    }

    #[test]
    fn test_order_is_stable_for_ties() {
        let rows = records();
        let query = Query::new()
            .eq(Column::OwnerId, "ada")
            .order_by(Column::EventDate, Direction::Asc)
            .order_by(Column::StartTime, Direction::Asc);
        assert_eq!(ids(&query.run(&rows)), vec!["2", "3", "5", "1"]);
    }

    #[test]
    fn test_missing_values_sort_first() {
        let rows = records();
        let query = Query::new()
            .eq(Column::EventDate, "2024-07-10")
            .order_by(Column::StartTime, Direction::Asc);
        assert_eq!(ids(&query.run(&rows))[0], "4");
    }

    #[test]
    fn test_ilike_is_case_insensitive() {
        let rows = records();
        let query = Query::new().ilike(&[Column::Title, Column::Description], "MEET");
        assert_eq!(ids(&query.run(&rows)), vec!["2"]);
    }

    #[test]
    fn test_limit_and_offset() {
        let rows = records();
        let query = Query::new()
            .order_by(Column::Id, Direction::Desc)
            .offset(1)
            .limit(Some(2));
        assert_eq!(ids(&query.run(&rows)), vec!["4", "3"]);
    }
}
