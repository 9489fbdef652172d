use {
    crate::fetch_core::ActivityRecord,
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

/// Awarded total and report count for one program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRow {
    pub program: String,
    #[serde(rename = "total_bounty_usd")]
    pub total_amount: Decimal,
    pub report_count: usize,
}

/// Per-program payout aggregator
///
/// Groups by exact program name. Rows keep first-seen order until sorted, so
/// programs tied on total and count come out in encounter order.
#[derive(Debug, Default)]
pub struct PayoutAggregator {
    rows: Vec<AggregationRow>,
    index_by_program: HashMap<String, usize>,
}

impl PayoutAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in; non-positive amounts are ignored
    pub fn add_record(&mut self, record: &ActivityRecord) {
        if record.amount <= Decimal::ZERO {
            return;
        }

        match self.index_by_program.get(&record.program) {
            Some(&idx) => {
                let row = &mut self.rows[idx];
                row.total_amount = match row.total_amount.checked_add(record.amount) {
                    Some(total) => total,
                    None => {
                        log::warn!(
                            "Total for '{}' exceeds the decimal range at record {}, capping",
                            record.program,
                            record.id
                        );
                        Decimal::MAX
                    }
                };
                row.report_count += 1;
            }
            None => {
                self.index_by_program
                    .insert(record.program.clone(), self.rows.len());
                self.rows.push(AggregationRow {
                    program: record.program.clone(),
                    total_amount: record.amount,
                    report_count: 1,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows by descending total, then descending count
    pub fn into_rows(self) -> Vec<AggregationRow> {
        let mut rows = self.rows;
        // sort_by is stable: remaining ties keep encounter order
        rows.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then_with(|| b.report_count.cmp(&a.report_count))
        });
        rows
    }
}

/// Group, sum, count, and order a batch of records
pub fn aggregate<'a, I>(records: I) -> Vec<AggregationRow>
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let mut aggregator = PayoutAggregator::new();
    for record in records {
        aggregator.add_record(record);
    }
    aggregator.into_rows()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create_test_record(id: &str, program: &str, amount: i64) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            program: program.to_string(),
            amount: Decimal::from(amount),
            activity_at: Utc.with_ymd_and_hms(2025, 8, 5, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_group_sum_count() {
        let records = vec![
            create_test_record("a", "X", 100),
            create_test_record("b", "Y", 30),
            create_test_record("c", "X", 50),
        ];

        let rows = aggregate(&records);

        assert_eq!(
            rows,
            vec![
                AggregationRow { program: "X".to_string(), total_amount: Decimal::from(150), report_count: 2 },
                AggregationRow { program: "Y".to_string(), total_amount: Decimal::from(30), report_count: 1 },
            ]
        );
    }

    #[test]
    fn test_zero_amount_excluded() {
        let records = vec![
            create_test_record("a", "Zero", 0),
            create_test_record("b", "Negative", -10),
            create_test_record("c", "X", 10),
        ];

        let rows = aggregate(&records);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].program, "X");
    }

    #[test]
    fn test_count_breaks_total_tie() {
        let records = vec![
            create_test_record("a", "Single", 100),
            create_test_record("b", "Double", 60),
            create_test_record("c", "Double", 40),
        ];

        let rows = aggregate(&records);

        assert_eq!(rows[0].program, "Double");
        assert_eq!(rows[1].program, "Single");
    }

    #[test]
    fn test_full_tie_keeps_encounter_order() {
        let records = vec![
            create_test_record("a", "First", 100),
            create_test_record("b", "Second", 100),
            create_test_record("c", "Third", 100),
        ];

        let programs: Vec<_> = aggregate(&records).into_iter().map(|r| r.program).collect();
        assert_eq!(programs, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_permutation_yields_same_rows() {
        let records = vec![
            create_test_record("a", "X", 100),
            create_test_record("b", "Y", 70),
            create_test_record("c", "X", 5),
            create_test_record("d", "Z", 300),
            create_test_record("e", "Y", 70),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(2);

        let expected = aggregate(&records);
        assert_eq!(aggregate(&reversed), expected);
        assert_eq!(aggregate(&rotated), expected);
    }

    #[test]
    fn test_overflowing_total_saturates() {
        let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let records = vec![
            ActivityRecord { amount: huge, ..create_test_record("a", "X", 0) },
            ActivityRecord { amount: huge, ..create_test_record("b", "X", 0) },
            create_test_record("c", "Y", 10),
        ];

        let rows = aggregate(&records);

        assert_eq!(rows[0].program, "X");
        assert_eq!(rows[0].total_amount, Decimal::MAX);
        assert_eq!(rows[0].report_count, 2);
        assert_eq!(rows[1].total_amount, Decimal::from(10));
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&Vec::<ActivityRecord>::new()).is_empty());
        assert!(PayoutAggregator::new().is_empty());
    }
}
